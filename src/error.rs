use std::fmt;

/// HTTP リクエストのパースエラー
///
/// 「データ不足」はエラーではなく [`Status::Incomplete`](crate::Status) や
/// [`BodyRead::NeedMore`](crate::BodyRead) で表現する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// リクエスト行が不正 (リクエスト単位で致命的)
    MalformedRequestLine(String),
    /// ヘッダー行が不正 (行単位、ヘッダーブロックのパースでは読み飛ばされる)
    MalformedHeaderLine(String),
    /// チャンクサイズ行が不正 (接続単位で致命的)
    MalformedChunkSize(String),
    /// チャンクデータの後に CRLF がない (接続単位で致命的)
    MalformedChunk(String),
    /// バッファサイズ超過
    BufferOverflow { size: usize, limit: usize },
    /// 終端が見つからないままヘッダーブロックが上限を超えた
    HeaderBlockTooLarge { size: usize, limit: usize },
    /// チャンクサイズ行が長すぎる
    ChunkLineTooLong { size: usize, limit: usize },
    /// チャンクサイズが上限を超えた
    ChunkTooLarge { size: u64, limit: u64 },
    /// API の呼び出し順序が不正
    InvalidState(&'static str),
    /// 致命的エラーの後はバイト列をプロトコルデータとして解釈しない
    Poisoned,
}

impl Error {
    /// 接続を閉じる必要があるエラーか
    ///
    /// フレーミングが信用できなくなったエラーは接続単位で致命的になる。
    /// `MalformedRequestLine` はリクエスト単位だが、次のリクエストの境界も
    /// 分からないため呼び出し側は通常接続を閉じる。
    pub fn is_fatal_to_connection(&self) -> bool {
        match self {
            Error::MalformedChunkSize(_)
            | Error::MalformedChunk(_)
            | Error::BufferOverflow { .. }
            | Error::HeaderBlockTooLarge { .. }
            | Error::ChunkLineTooLong { .. }
            | Error::ChunkTooLarge { .. }
            | Error::Poisoned => true,
            Error::MalformedRequestLine(_)
            | Error::MalformedHeaderLine(_)
            | Error::InvalidState(_) => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedRequestLine(line) => write!(f, "malformed request line: {:?}", line),
            Error::MalformedHeaderLine(line) => write!(f, "malformed header line: {:?}", line),
            Error::MalformedChunkSize(size) => write!(f, "malformed chunk size: {:?}", size),
            Error::MalformedChunk(msg) => write!(f, "malformed chunk: {}", msg),
            Error::BufferOverflow { size, limit } => {
                write!(f, "buffer overflow: {} > {}", size, limit)
            }
            Error::HeaderBlockTooLarge { size, limit } => {
                write!(f, "header block too large: {} > {}", size, limit)
            }
            Error::ChunkLineTooLong { size, limit } => {
                write!(f, "chunk line too long: {} > {}", size, limit)
            }
            Error::ChunkTooLarge { size, limit } => {
                write!(f, "chunk too large: {} > {}", size, limit)
            }
            Error::InvalidState(msg) => write!(f, "invalid state: {}", msg),
            Error::Poisoned => write!(f, "parser poisoned by a previous framing error"),
        }
    }
}

impl std::error::Error for Error {}
