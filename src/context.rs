//! 1 リクエスト分のパース状態

use crate::connection;
use crate::error::Error;
use crate::framing::{self, BodyFraming};
use crate::header::{CanonicalizeName, HeaderTable, TitleCase, parse_header_block};
use crate::limits::ParserLimits;
use crate::request::Request;
use crate::request_line::{RequestLine, Version, parse_request_line};
use crate::scanner::{HeaderBlockScanner, Scan};

/// パースの進行状態
///
/// 単調に進み、後戻りしない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParseState {
    /// ヘッダー待ち
    AwaitingHeaders,
    /// ボディ読み取り中
    AwaitingBody,
    /// 完了
    Complete,
}

/// [`ParserContext::filter_headers`] の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// データ不足
    Incomplete,
    /// ヘッダー確定済み
    Complete,
}

/// [`ParserContext::read_body`] の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyRead {
    /// ボディデータ
    Data(Vec<u8>),
    /// データ不足
    NeedMore,
    /// ボディ終端に到達
    Complete,
}

/// 1 リクエスト分のパーサー (Sans I/O)
///
/// 受信したバイト列を [`feed`](Self::feed) で追加し、
/// [`filter_headers`](Self::filter_headers) でヘッダーを確定させてから
/// [`read_body`](Self::read_body) でボディを取り出す。
///
/// # 型パラメータ
///
/// - `C`: ヘッダー名の正規化方式。デフォルトは [`TitleCase`]。
///
/// ```rust
/// use shiguredo_http11_parser::{BodyRead, ParserContext, Status};
///
/// let mut ctx = ParserContext::new();
/// ctx.feed(b"POST /upload HTTP/1.1\r\nContent-Le").unwrap();
/// assert_eq!(ctx.filter_headers().unwrap(), Status::Incomplete);
///
/// ctx.feed(b"ngth: 5\r\n\r\nhe").unwrap();
/// assert_eq!(ctx.filter_headers().unwrap(), Status::Complete);
/// assert_eq!(ctx.read_body().unwrap(), BodyRead::Data(b"he".to_vec()));
/// assert_eq!(ctx.read_body().unwrap(), BodyRead::NeedMore);
///
/// ctx.feed(b"llo").unwrap();
/// assert_eq!(ctx.read_body().unwrap(), BodyRead::Data(b"llo".to_vec()));
/// assert!(ctx.is_body_complete());
/// ```
#[derive(Debug)]
pub struct ParserContext<C: CanonicalizeName = TitleCase> {
    buf: Vec<u8>,
    /// buf のうち消費済みのバイト数
    cursor: usize,
    state: ParseState,
    scanner: HeaderBlockScanner,
    request_line: Option<RequestLine>,
    headers: HeaderTable,
    framing: BodyFraming,
    force_close: bool,
    poisoned: bool,
    /// decode() 用: デコード済みボディ
    decoded_body: Vec<u8>,
    /// decode() 用: 引き渡し済みか
    delivered: bool,
    limits: ParserLimits,
    canonicalizer: C,
}

impl Default for ParserContext<TitleCase> {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserContext<TitleCase> {
    /// 新しいパーサーを作成
    pub fn new() -> Self {
        Self::with_canonicalizer_and_limits(TitleCase, ParserLimits::default())
    }

    /// 制限付きでパーサーを作成
    pub fn with_limits(limits: ParserLimits) -> Self {
        Self::with_canonicalizer_and_limits(TitleCase, limits)
    }
}

impl<C: CanonicalizeName> ParserContext<C> {
    /// ヘッダー名の正規化方式を指定してパーサーを作成
    pub fn with_canonicalizer(canonicalizer: C) -> Self {
        Self::with_canonicalizer_and_limits(canonicalizer, ParserLimits::default())
    }

    /// ヘッダー名の正規化方式と制限を指定してパーサーを作成
    pub fn with_canonicalizer_and_limits(canonicalizer: C, limits: ParserLimits) -> Self {
        Self {
            buf: Vec::new(),
            cursor: 0,
            state: ParseState::AwaitingHeaders,
            scanner: HeaderBlockScanner::new(),
            request_line: None,
            headers: HeaderTable::default(),
            framing: BodyFraming::None,
            force_close: false,
            poisoned: false,
            decoded_body: Vec::new(),
            delivered: false,
            limits,
            canonicalizer,
        }
    }

    /// 制限設定を取得
    pub fn limits(&self) -> &ParserLimits {
        &self.limits
    }

    /// バッファにデータを追加
    pub fn feed(&mut self, data: &[u8]) -> Result<(), Error> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        // ヘッダー待ちの間は cursor は常に 0 なので scanner のオフセットは崩れない
        if self.cursor > 0 {
            self.buf.drain(..self.cursor);
            self.cursor = 0;
        }
        let new_size = self.buf.len() + data.len();
        if new_size > self.limits.max_buffer_size {
            self.poisoned = true;
            return Err(Error::BufferOverflow {
                size: new_size,
                limit: self.limits.max_buffer_size,
            });
        }
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// 未消費のバイト列
    ///
    /// リクエスト完了後は、パイプライン化された次のリクエストの先頭になる。
    pub fn remaining(&self) -> &[u8] {
        &self.buf[self.cursor..]
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// 致命的なエラーでこれ以上バイト列を解釈できないか
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// ヘッダーをパース
    ///
    /// ヘッダーブロックの終端が見つかるまでは [`Status::Incomplete`] を返す。
    /// 確定後に呼んでも再パースはせず [`Status::Complete`] を返す。
    pub fn filter_headers(&mut self) -> Result<Status, Error> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        if self.state != ParseState::AwaitingHeaders {
            return Ok(Status::Complete);
        }

        // RFC 9112 Section 2.2: リクエスト行の前の空行は無視する
        let leading = self
            .buf
            .chunks_exact(2)
            .take_while(|pair| *pair == b"\r\n")
            .count();
        if leading > 0 {
            self.buf.drain(..leading * 2);
            self.scanner.reset();
        }

        let (head_end, body_start) = match self.scanner.scan(&self.buf) {
            Scan::Incomplete => {
                // 終端は末尾 3 バイトより前には存在しない
                if self.buf.len().saturating_sub(3) > self.limits.max_header_block_size {
                    return Err(self.poison(Error::HeaderBlockTooLarge {
                        size: self.buf.len(),
                        limit: self.limits.max_header_block_size,
                    }));
                }
                return Ok(Status::Incomplete);
            }
            Scan::Complete {
                head_end,
                body_start,
            } => (head_end, body_start),
        };
        if head_end > self.limits.max_header_block_size {
            return Err(self.poison(Error::HeaderBlockTooLarge {
                size: head_end,
                limit: self.limits.max_header_block_size,
            }));
        }

        let head = String::from_utf8_lossy(&self.buf[..head_end]).into_owned();
        let mut lines = head.split("\r\n");
        let request_line = match parse_request_line(lines.next().unwrap_or_default()) {
            Ok(line) => line,
            Err(e) => return Err(self.poison(e)),
        };
        let headers = parse_header_block(lines, &self.canonicalizer);
        let framing = BodyFraming::from_headers(&headers, &self.limits);

        tracing::debug!(
            method = %request_line.method,
            target = %request_line.target,
            version = %request_line.version,
            header_count = headers.len(),
            chunked = matches!(framing, BodyFraming::Chunked(_)),
            "request headers complete"
        );

        self.cursor = body_start;
        self.state = if framing.is_complete() {
            ParseState::Complete
        } else {
            ParseState::AwaitingBody
        };
        self.request_line = Some(request_line);
        self.headers = headers;
        self.framing = framing;
        Ok(Status::Complete)
    }

    /// ボディを読み取る
    ///
    /// ボディデータがあれば [`BodyRead::Data`] を返す。フレーミングだけを
    /// 進める段階 (チャンクサイズ行など) は内部で繰り返し処理する。
    pub fn read_body(&mut self) -> Result<BodyRead, Error> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        match self.state {
            ParseState::AwaitingHeaders => Err(Error::InvalidState(
                "read_body called before headers are complete",
            )),
            ParseState::Complete => Ok(BodyRead::Complete),
            ParseState::AwaitingBody => loop {
                let result = self
                    .framing
                    .filter_body(&self.buf[self.cursor..])
                    .map(|filtered| (filtered.chunk.to_vec(), filtered.consumed));
                let (chunk, consumed) = match result {
                    Ok(v) => v,
                    Err(e) => return Err(self.poison(e)),
                };
                self.cursor += consumed;
                if self.framing.is_complete() {
                    self.state = ParseState::Complete;
                }

                if !chunk.is_empty() {
                    return Ok(BodyRead::Data(chunk));
                }
                if self.state == ParseState::Complete {
                    return Ok(BodyRead::Complete);
                }
                if consumed == 0 {
                    return Ok(BodyRead::NeedMore);
                }
            },
        }
    }

    /// リクエスト行 (ヘッダー確定前は `None`)
    pub fn request_line(&self) -> Option<&RequestLine> {
        self.request_line.as_ref()
    }

    /// ヘッダー (確定前は空)
    pub fn headers(&self) -> &HeaderTable {
        &self.headers
    }

    pub fn framing(&self) -> &BodyFraming {
        &self.framing
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.framing, BodyFraming::Chunked(_))
    }

    /// ボディ長 (ヘッダー確定前と chunked の場合は `None`)
    pub fn content_length(&self) -> Option<u64> {
        self.request_line.as_ref()?;
        framing::content_length(&self.headers)
    }

    /// ボディを読み終えたか (ヘッダー確定前は false)
    pub fn is_body_complete(&self) -> bool {
        self.state != ParseState::AwaitingHeaders && self.framing.is_complete()
    }

    /// 接続を必ず閉じるよう指定
    pub fn force_close(&mut self) {
        self.force_close = true;
    }

    /// レスポンス後に接続を閉じるべきか
    ///
    /// ヘッダー確定前は HTTP/1.0 として判定するので true になる。
    pub fn should_close(&self) -> bool {
        let version = self
            .request_line
            .as_ref()
            .map(|line| line.version)
            .unwrap_or(Version::HTTP_10);
        connection::should_close(version, &self.headers, self.force_close)
    }

    /// 同じ接続の次のリクエスト用のパーサーを作成
    ///
    /// 未消費のバイト列と設定を引き継ぐ。完了前に呼ぶとエラー。
    pub fn next_request(self) -> Result<Self, Error> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        if self.state != ParseState::Complete {
            return Err(Error::InvalidState(
                "next_request called before the request is complete",
            ));
        }
        let mut leftover = self.buf;
        leftover.drain(..self.cursor);
        let mut next = Self::with_canonicalizer_and_limits(self.canonicalizer, self.limits);
        next.buf = leftover;
        Ok(next)
    }

    /// リクエスト全体を一括でデコード
    ///
    /// ストリーミング API を内部で使用してボディまで読み取る。
    /// データ不足の場合は `None` を返す。
    pub fn decode(&mut self) -> Result<Option<Request>, Error> {
        if self.delivered {
            return Err(Error::InvalidState("request already decoded"));
        }
        if self.filter_headers()? == Status::Incomplete {
            return Ok(None);
        }
        loop {
            match self.read_body()? {
                BodyRead::Data(data) => self.decoded_body.extend_from_slice(&data),
                BodyRead::NeedMore => return Ok(None),
                BodyRead::Complete => break,
            }
        }

        let line = self
            .request_line
            .clone()
            .ok_or(Error::InvalidState("missing request line"))?;
        self.delivered = true;
        Ok(Some(Request {
            line,
            headers: self.headers.clone(),
            body: std::mem::take(&mut self.decoded_body),
        }))
    }

    fn poison(&mut self, e: Error) -> Error {
        tracing::debug!(error = %e, "parser poisoned");
        self.poisoned = true;
        e
    }
}
