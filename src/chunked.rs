//! chunked 転送エンコーディングのデコード (RFC 9112 Section 7.1)
//!
//! ```text
//! chunked-body = *chunk last-chunk trailer-section CRLF
//! chunk        = chunk-size [ chunk-ext ] CRLF chunk-data CRLF
//! last-chunk   = 1*("0") [ chunk-ext ] CRLF
//! ```
//!
//! 1 回の [`ChunkDecoder::step`] で状態を 1 つ進める。
//! データが足りない場合は入力をそのまま剰余として返す。

use crate::error::Error;
use crate::framing::Filtered;
use crate::limits::ParserLimits;

/// チャンクデコードの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    /// チャンクサイズ行待ち
    AwaitingSizeLine,
    /// チャンクデータ待ち (データと後続の CRLF が揃うまで待つ)
    ReadingChunkData { remaining: u64 },
    /// トレーラー終端 (空行) 待ち
    AwaitingTrailers,
    /// 完了。以降はバイトを消費しない
    Done,
}

/// chunked ボディのデコーダー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDecoder {
    state: ChunkState,
    poisoned: bool,
    max_chunk_line_size: usize,
    max_chunk_size: u64,
}

impl Default for ChunkDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkDecoder {
    /// デフォルトの制限でデコーダーを作成
    pub fn new() -> Self {
        Self::with_limits(&ParserLimits::default())
    }

    /// 制限付きでデコーダーを作成
    pub fn with_limits(limits: &ParserLimits) -> Self {
        Self {
            state: ChunkState::AwaitingSizeLine,
            poisoned: false,
            max_chunk_line_size: limits.max_chunk_line_size,
            max_chunk_size: limits.max_chunk_size,
        }
    }

    pub fn state(&self) -> ChunkState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ChunkState::Done
    }

    /// 過去にエラーを返したか
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// 状態機械を 1 段進める
    ///
    /// 一度エラーを返すとフレーミングが信用できなくなるため、
    /// 以降の呼び出しはすべて [`Error::Poisoned`] になる。
    pub fn step<'a>(&mut self, data: &'a [u8]) -> Result<Filtered<'a>, Error> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        let result = self.step_inner(data);
        if let Err(e) = &result {
            tracing::debug!(error = %e, "chunked decoding failed");
            self.poisoned = true;
        }
        result
    }

    fn step_inner<'a>(&mut self, data: &'a [u8]) -> Result<Filtered<'a>, Error> {
        match self.state {
            ChunkState::AwaitingSizeLine => {
                let Some(pos) = find_crlf(data) else {
                    // CRLF を含めて上限 + 2 バイトあっても行が終わらない
                    if data.len() > self.max_chunk_line_size.saturating_add(1) {
                        return Err(Error::ChunkLineTooLong {
                            size: data.len(),
                            limit: self.max_chunk_line_size,
                        });
                    }
                    return Ok(Filtered::new(data, &[], data));
                };
                if pos > self.max_chunk_line_size {
                    return Err(Error::ChunkLineTooLong {
                        size: pos,
                        limit: self.max_chunk_line_size,
                    });
                }

                let size = parse_chunk_size(&data[..pos])?;
                if size == 0 {
                    tracing::trace!("last chunk");
                    self.state = ChunkState::AwaitingTrailers;
                } else {
                    if size > self.max_chunk_size {
                        return Err(Error::ChunkTooLarge {
                            size,
                            limit: self.max_chunk_size,
                        });
                    }
                    tracing::trace!(size, "chunk size line");
                    self.state = ChunkState::ReadingChunkData { remaining: size };
                }
                Ok(Filtered::new(data, &[], &data[pos + 2..]))
            }
            ChunkState::ReadingChunkData { remaining } => {
                if (data.len() as u64) < remaining.saturating_add(2) {
                    return Ok(Filtered::new(data, &[], data));
                }
                // remaining <= data.len() なので usize に収まる
                let end = remaining as usize;
                if &data[end..end + 2] != b"\r\n" {
                    return Err(Error::MalformedChunk(
                        "expected CRLF after chunk data".to_string(),
                    ));
                }
                self.state = ChunkState::AwaitingSizeLine;
                Ok(Filtered::new(data, &data[..end], &data[end + 2..]))
            }
            ChunkState::AwaitingTrailers => {
                let mut offset = 0;
                while let Some(pos) = find_crlf(&data[offset..]) {
                    if pos == 0 {
                        tracing::trace!("trailer section complete");
                        self.state = ChunkState::Done;
                        return Ok(Filtered::new(data, &[], &data[offset + 2..]));
                    }
                    // トレーラーの中身は解釈しない
                    offset += pos + 2;
                }
                Ok(Filtered::new(data, &[], &data[offset..]))
            }
            ChunkState::Done => Ok(Filtered::new(data, &[], data)),
        }
    }
}

/// CRLF の位置を探す
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// チャンクサイズ行をパース (拡張は無視)
fn parse_chunk_size(line: &[u8]) -> Result<u64, Error> {
    let malformed = || Error::MalformedChunkSize(String::from_utf8_lossy(line).into_owned());

    let line = std::str::from_utf8(line).map_err(|_| malformed())?;
    let size = line.split(';').next().unwrap_or(line).trim_matches([' ', '\t']);
    if size.is_empty() || !size.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed());
    }
    u64::from_str_radix(size, 16).map_err(|_| malformed())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 入力を使い切るまで step を繰り返してボディを集める
    fn drive(decoder: &mut ChunkDecoder, mut data: &[u8]) -> Result<(Vec<u8>, usize), Error> {
        let mut body = Vec::new();
        loop {
            let filtered = decoder.step(data)?;
            body.extend_from_slice(filtered.chunk);
            if filtered.consumed == 0 {
                return Ok((body, data.len()));
            }
            data = filtered.remainder;
        }
    }

    #[test]
    fn single_chunk() {
        let mut decoder = ChunkDecoder::new();
        let (body, left) = drive(&mut decoder, b"4\r\nWiki\r\n0\r\n\r\n").unwrap();
        assert_eq!(body, b"Wiki");
        assert_eq!(left, 0);
        assert!(decoder.is_done());
    }

    #[test]
    fn step_by_step_transitions() {
        let mut decoder = ChunkDecoder::new();
        let data = b"4\r\nWiki\r\n0\r\n\r\nNEXT";

        let f = decoder.step(data).unwrap();
        assert!(f.chunk.is_empty());
        assert_eq!(decoder.state(), ChunkState::ReadingChunkData { remaining: 4 });

        let f = decoder.step(f.remainder).unwrap();
        assert_eq!(f.chunk, b"Wiki");
        assert_eq!(decoder.state(), ChunkState::AwaitingSizeLine);

        let f = decoder.step(f.remainder).unwrap();
        assert_eq!(decoder.state(), ChunkState::AwaitingTrailers);
        assert_eq!(f.remainder, b"\r\nNEXT");

        let f = decoder.step(f.remainder).unwrap();
        assert_eq!(decoder.state(), ChunkState::Done);
        assert_eq!(f.remainder, b"NEXT");

        // Done 以降は何も消費しない
        let f = decoder.step(f.remainder).unwrap();
        assert_eq!(f.consumed, 0);
        assert_eq!(f.remainder, b"NEXT");
    }

    #[test]
    fn size_line_without_crlf_waits() {
        let mut decoder = ChunkDecoder::new();
        let f = decoder.step(b"1a").unwrap();
        assert_eq!(f.consumed, 0);
        assert_eq!(f.remainder, b"1a");
        assert_eq!(decoder.state(), ChunkState::AwaitingSizeLine);
    }

    #[test]
    fn chunk_data_waits_for_trailing_crlf() {
        let mut decoder = ChunkDecoder::new();
        let f = decoder.step(b"5\r\nhello").unwrap();
        let f = decoder.step(f.remainder).unwrap();
        assert_eq!(f.consumed, 0);
        assert_eq!(f.remainder, b"hello");
        let f = decoder.step(b"hello\r").unwrap();
        assert_eq!(f.consumed, 0);
        let f = decoder.step(b"hello\r\n").unwrap();
        assert_eq!(f.chunk, b"hello");
        assert!(f.remainder.is_empty());
    }

    #[test]
    fn extensions_and_hex_sizes() {
        let mut decoder = ChunkDecoder::new();
        let data = b"A;name=value\r\n0123456789\r\nf \r\n0123456789abcde\r\n0;last\r\n\r\n";
        let (body, _) = drive(&mut decoder, data).unwrap();
        assert_eq!(body, b"01234567890123456789abcde");
        assert!(decoder.is_done());
    }

    #[test]
    fn trailers_are_skipped() {
        let mut decoder = ChunkDecoder::new();
        let data = b"3\r\nabc\r\n0\r\nExpires: never\r\nX-Sum: 1\r\n\r\nrest";
        let mut input: &[u8] = data;
        let mut body = Vec::new();
        while !decoder.is_done() {
            let f = decoder.step(input).unwrap();
            body.extend_from_slice(f.chunk);
            input = f.remainder;
        }
        assert_eq!(body, b"abc");
        assert_eq!(input, b"rest");
    }

    #[test]
    fn partial_trailers_consume_complete_lines() {
        let mut decoder = ChunkDecoder::new();
        let f = decoder.step(b"0\r\nA: b\r\nC: d").unwrap();
        let f = decoder.step(f.remainder).unwrap();
        assert_eq!(decoder.state(), ChunkState::AwaitingTrailers);
        assert_eq!(f.remainder, b"C: d");
    }

    #[test]
    fn malformed_size_poisons() {
        let mut decoder = ChunkDecoder::new();
        assert!(matches!(
            decoder.step(b"zz\r\nabc\r\n"),
            Err(Error::MalformedChunkSize(_))
        ));
        assert!(decoder.is_poisoned());
        assert_eq!(decoder.step(b"0\r\n\r\n"), Err(Error::Poisoned));
    }

    #[test]
    fn malformed_sizes() {
        for line in [&b"\r\n"[..], b"+5\r\n", b"-1\r\n", b"0x5\r\n", b";ext\r\n", b"\xff\r\n"] {
            let mut decoder = ChunkDecoder::new();
            assert!(
                matches!(decoder.step(line), Err(Error::MalformedChunkSize(_))),
                "{:?}",
                line
            );
        }
        let mut decoder = ChunkDecoder::with_limits(&ParserLimits::unlimited());
        assert!(matches!(
            decoder.step(b"fffffffffffffffff\r\n"),
            Err(Error::MalformedChunkSize(_))
        ));
    }

    #[test]
    fn missing_crlf_after_data() {
        let mut decoder = ChunkDecoder::new();
        let f = decoder.step(b"3\r\nabcXY").unwrap();
        assert!(matches!(
            decoder.step(f.remainder),
            Err(Error::MalformedChunk(_))
        ));
        assert!(decoder.is_poisoned());
    }

    #[test]
    fn size_line_too_long() {
        let limits = ParserLimits {
            max_chunk_line_size: 4,
            ..ParserLimits::default()
        };
        let mut decoder = ChunkDecoder::with_limits(&limits);
        // 4 バイト + CR まではまだ待てる
        assert_eq!(decoder.step(b"0000\r").unwrap().consumed, 0);
        assert!(matches!(
            decoder.step(b"000000"),
            Err(Error::ChunkLineTooLong { .. })
        ));

        let mut decoder = ChunkDecoder::with_limits(&limits);
        assert!(matches!(
            decoder.step(b"00001\r\n"),
            Err(Error::ChunkLineTooLong { size: 5, limit: 4 })
        ));
    }

    #[test]
    fn chunk_too_large() {
        let limits = ParserLimits {
            max_chunk_size: 16,
            ..ParserLimits::default()
        };
        let mut decoder = ChunkDecoder::with_limits(&limits);
        assert_eq!(
            decoder.step(b"11\r\n"),
            Err(Error::ChunkTooLarge { size: 17, limit: 16 })
        );
    }
}
