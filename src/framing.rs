//! ボディのフレーミング (RFC 9112 Section 6)

use crate::chunked::{ChunkDecoder, ChunkState};
use crate::error::Error;
use crate::header::HeaderTable;
use crate::limits::ParserLimits;

/// [`BodyFraming::filter_body`] / [`ChunkDecoder::step`] の結果
///
/// `remainder` は常に入力の末尾部分で、呼び出し側が保持して次の呼び出しに渡す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filtered<'a> {
    /// ボディデータ (空の場合もある)
    pub chunk: &'a [u8],
    /// 未消費のバイト列
    pub remainder: &'a [u8],
    /// 消費したバイト数。0 ならデータ不足
    pub consumed: usize,
}

impl<'a> Filtered<'a> {
    pub(crate) fn new(input: &'a [u8], chunk: &'a [u8], remainder: &'a [u8]) -> Self {
        Self {
            chunk,
            remainder,
            consumed: input.len() - remainder.len(),
        }
    }
}

/// Transfer-Encoding が chunked か判定
///
/// 複数の Transfer-Encoding ヘッダーは連結した 1 つのリストとして扱い、
/// 最後のコーディングが chunked かを大文字小文字を区別せずに確認する。
pub fn is_chunked(headers: &HeaderTable) -> bool {
    headers
        .get_all("Transfer-Encoding")
        .into_iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .last()
        .is_some_and(|t| t.eq_ignore_ascii_case("chunked"))
}

/// ボディ長を取得
///
/// chunked の場合は長さが動的に決まるので `None`。
/// それ以外は Content-Length の値 (ないか読めなければ 0)。
pub fn content_length(headers: &HeaderTable) -> Option<u64> {
    if is_chunked(headers) {
        None
    } else {
        Some(headers.content_length())
    }
}

/// ボディのフレーミング方式
///
/// ヘッダー確定時に一度だけ決まり、以後は種類が変わらない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyFraming {
    /// ボディなし
    None,
    /// Content-Length による固定長
    ContentLength { remaining: u64 },
    /// Transfer-Encoding: chunked
    Chunked(ChunkDecoder),
}

impl BodyFraming {
    /// ヘッダーからフレーミング方式を決定
    ///
    /// Transfer-Encoding: chunked は Content-Length より優先する (RFC 9112 Section 6.3)。
    pub fn from_headers(headers: &HeaderTable, limits: &ParserLimits) -> Self {
        if is_chunked(headers) {
            if headers.contains("Content-Length") {
                tracing::debug!("both Transfer-Encoding and Content-Length present, using chunked");
            }
            return BodyFraming::Chunked(ChunkDecoder::with_limits(limits));
        }
        if headers.contains("Content-Length") {
            return BodyFraming::ContentLength {
                remaining: headers.content_length(),
            };
        }
        BodyFraming::None
    }

    /// ボディをすべて読み終えたか
    pub fn is_complete(&self) -> bool {
        match self {
            BodyFraming::None => true,
            BodyFraming::ContentLength { remaining } => *remaining == 0,
            BodyFraming::Chunked(decoder) => decoder.is_done(),
        }
    }

    /// chunked の場合の状態
    pub fn chunk_state(&self) -> Option<ChunkState> {
        match self {
            BodyFraming::Chunked(decoder) => Some(decoder.state()),
            BodyFraming::None | BodyFraming::ContentLength { .. } => None,
        }
    }

    /// 受信データからボディを取り出す
    ///
    /// 宣言された長さを超えるバイトは捨てずに `remainder` として返す
    /// (パイプライン化された次のリクエストの先頭)。
    pub fn filter_body<'a>(&mut self, data: &'a [u8]) -> Result<Filtered<'a>, Error> {
        match self {
            BodyFraming::None => Ok(Filtered::new(data, &[], data)),
            BodyFraming::ContentLength { remaining } => {
                // min の結果は data.len() 以下なので usize に収まる
                let n = (data.len() as u64).min(*remaining) as usize;
                *remaining -= n as u64;
                Ok(Filtered::new(data, &data[..n], &data[n..]))
            }
            BodyFraming::Chunked(decoder) => decoder.step(data),
        }
    }
}
