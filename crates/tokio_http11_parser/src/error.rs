//! tokio_http11_parser エラー型

use std::fmt;

/// tokio_http11_parser エラー
#[derive(Debug)]
pub enum Error {
    /// I/O エラー
    Io(std::io::Error),
    /// HTTP パースエラー
    Http(shiguredo_http11_parser::Error),
    /// 接続タイムアウト
    Timeout,
    /// 接続が閉じられた
    ConnectionClosed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Http(e) => write!(f, "HTTP error: {}", e),
            Error::Timeout => write!(f, "connection timeout"),
            Error::ConnectionClosed => write!(f, "connection closed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Http(e) => Some(e),
            Error::Timeout | Error::ConnectionClosed => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<shiguredo_http11_parser::Error> for Error {
    fn from(e: shiguredo_http11_parser::Error) -> Self {
        Error::Http(e)
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::Timeout
    }
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_source() {
        let e = Error::from(shiguredo_http11_parser::Error::Poisoned);
        assert_eq!(e.to_string(), "HTTP error: parser poisoned by a previous framing error");
        assert!(std::error::Error::source(&e).is_some());
        assert!(std::error::Error::source(&Error::Timeout).is_none());
    }
}
