//! ヘッダーブロックの終端 (CRLF CRLF) 探索

const TERMINATOR: &[u8] = b"\r\n\r\n";

/// スキャン結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// 終端がまだ見つからない
    Incomplete,
    /// 終端が見つかった
    Complete {
        /// ヘッダーブロックの長さ (終端を含まない)
        head_end: usize,
        /// 終端直後のオフセット (ボディの先頭)
        body_start: usize,
    },
}

/// バッファ全体を先頭からスキャン
///
/// 呼び出し側は未消費のバイトをすべて保持したまま毎回渡すので、
/// 呼び出しをまたいだ部分一致の状態は不要。
pub fn scan(buf: &[u8]) -> Scan {
    scan_from(buf, 0)
}

fn scan_from(buf: &[u8], start: usize) -> Scan {
    if start >= buf.len() {
        return Scan::Incomplete;
    }
    match buf[start..]
        .windows(TERMINATOR.len())
        .position(|w| w == TERMINATOR)
    {
        Some(pos) => Scan::Complete {
            head_end: start + pos,
            body_start: start + pos + TERMINATOR.len(),
        },
        None => Scan::Incomplete,
    }
}

/// 走査済みオフセットを覚えるスキャナー
///
/// 伸び続けるバッファに対して毎回全体を走査し直さない。
/// 終端が前回の境界をまたぐ可能性があるので 3 バイト手前から再開する。
#[derive(Debug, Default, Clone)]
pub struct HeaderBlockScanner {
    scanned: usize,
}

impl HeaderBlockScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 走査を進める
    ///
    /// `buf` は前回の呼び出し時のバッファの先頭を保ったまま伸びていること。
    pub fn scan(&mut self, buf: &[u8]) -> Scan {
        let start = self.scanned.saturating_sub(TERMINATOR.len() - 1);
        let result = scan_from(buf, start);
        if let Scan::Incomplete = result {
            self.scanned = buf.len();
        }
        result
    }

    /// 走査済みバイト数
    pub fn scanned(&self) -> usize {
        self.scanned
    }

    pub fn reset(&mut self) {
        self.scanned = 0;
    }
}
