//! request-target の分解 (RFC 3986 Section 3)
//!
//! ```text
//!   foo://example.com:8042/over/there?name=ferret#nose
//!   \_/   \______________/\_________/ \_________/ \__/
//!    |           |            |            |        |
//! scheme     authority       path        query   fragment
//! ```
//!
//! request-target は検証せずに分解だけ行う。分解は失敗しない。
//!
//! ```rust
//! use shiguredo_http11_parser::uri;
//!
//! let parts = uri::split("/a/b?x=1#frag");
//! assert_eq!(parts.path, "/a/b");
//! assert_eq!(parts.query, "x=1");
//! assert_eq!(parts.fragment, "frag");
//! ```

/// 分解済み request-target
///
/// 存在しない要素は空文字列になる。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriParts {
    pub scheme: String,
    pub authority: String,
    pub path: String,
    pub query: String,
    pub fragment: String,
}

/// request-target を scheme / authority / path / query / fragment に分解
pub fn split(target: &str) -> UriParts {
    let bytes = target.as_bytes();
    let len = bytes.len();
    let mut pos = 0;

    let scheme = match find_scheme_end(bytes) {
        Some(colon_pos) => {
            pos = colon_pos + 1;
            target[..colon_pos].to_ascii_lowercase()
        }
        None => String::new(),
    };

    let authority = if pos + 1 < len && bytes[pos] == b'/' && bytes[pos + 1] == b'/' {
        pos += 2;
        let start = pos;
        let end = bytes[pos..]
            .iter()
            .position(|&b| b == b'/' || b == b'?' || b == b'#')
            .map(|p| pos + p)
            .unwrap_or(len);
        pos = end;
        target[start..end].to_string()
    } else {
        String::new()
    };

    let path_end = bytes[pos..]
        .iter()
        .position(|&b| b == b'?' || b == b'#')
        .map(|p| pos + p)
        .unwrap_or(len);
    let path = target[pos..path_end].to_string();
    pos = path_end;

    let query = if pos < len && bytes[pos] == b'?' {
        pos += 1;
        let end = bytes[pos..]
            .iter()
            .position(|&b| b == b'#')
            .map(|p| pos + p)
            .unwrap_or(len);
        let query = target[pos..end].to_string();
        pos = end;
        query
    } else {
        String::new()
    };

    let fragment = if pos < len && bytes[pos] == b'#' {
        target[pos + 1..].to_string()
    } else {
        String::new()
    };

    UriParts {
        scheme,
        authority,
        path,
        query,
        fragment,
    }
}

/// スキームの終端位置を探す
///
/// scheme = ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
fn find_scheme_end(bytes: &[u8]) -> Option<usize> {
    if !bytes.first().is_some_and(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    for (i, &b) in bytes.iter().enumerate() {
        if b == b':' {
            return Some(i);
        }
        if !b.is_ascii_alphanumeric() && b != b'+' && b != b'-' && b != b'.' {
            return None;
        }
    }
    None
}
