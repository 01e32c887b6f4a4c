//! リクエスト行のパース

use std::fmt;

use crate::error::Error;
use crate::uri::{self, UriParts};

/// HTTP バージョン
///
/// (major, minor) の辞書順で比較する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub const HTTP_10: Version = Version { major: 1, minor: 0 };
    pub const HTTP_11: Version = Version { major: 1, minor: 1 };

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::HTTP_10
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

/// パース済みリクエスト行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// HTTP メソッド (大文字化済み)
    pub method: String,
    /// 生の request-target
    pub target: String,
    /// request-target を分解したもの
    pub uri: UriParts,
    /// 生のバージョントークン
    pub raw_version: String,
    /// HTTP バージョン
    pub version: Version,
}

impl RequestLine {
    pub fn path(&self) -> &str {
        &self.uri.path
    }

    pub fn query(&self) -> &str {
        &self.uri.query
    }

    pub fn fragment(&self) -> &str {
        &self.uri.fragment
    }
}

/// リクエスト行をパース
///
/// 空白区切りでちょうど 3 トークン (method, target, version) でなければエラー。
/// バージョンが読めない場合はエラーにせず HTTP/1.0 とみなす ([`parse_version`])。
pub fn parse_request_line(line: &str) -> Result<RequestLine, Error> {
    let mut tokens = line.split_ascii_whitespace();
    let (Some(method), Some(target), Some(raw_version), None) =
        (tokens.next(), tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(Error::MalformedRequestLine(line.to_string()));
    };

    Ok(RequestLine {
        method: method.to_ascii_uppercase(),
        target: target.to_string(),
        uri: uri::split(target),
        raw_version: raw_version.to_string(),
        version: parse_version(raw_version),
    })
}

/// バージョントークンをパース
///
/// `HTTP/<major>.<minor>` 以外はすべて HTTP/1.0 として扱う。
/// 互換性のための寛容な挙動で、厳格にする場合はこの関数だけを変更する。
pub fn parse_version(token: &str) -> Version {
    let parsed = token.strip_prefix("HTTP/").and_then(|rest| {
        let (major, minor) = rest.split_once('.')?;
        if !is_decimal(major) || !is_decimal(minor) {
            return None;
        }
        Some(Version::new(major.parse().ok()?, minor.parse().ok()?))
    });

    match parsed {
        Some(version) => version,
        None => {
            tracing::debug!(token, "unparsable HTTP version, falling back to HTTP/1.0");
            Version::HTTP_10
        }
    }
}

fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
