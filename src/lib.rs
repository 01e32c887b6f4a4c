//! # shiguredo_http11_parser
//!
//! インクリメンタルな HTTP/1.x リクエストパーサー (Sans I/O)
//!
//! ## 特徴
//!
//! - **Sans I/O**: ソケットは扱わず、受信したバイト列を渡すだけ
//! - **インクリメンタル**: バイト列の区切りがプロトコルの区切りと一致しなくてよい
//! - **寛容**: 壊れたヘッダー行は読み飛ばし、obs-fold の継続行は連結する
//! - **パイプライン**: ボディを超えたバイト列は捨てずに次のリクエストへ引き継ぐ
//!
//! ## 使い方
//!
//! ### ストリーミング
//!
//! ```rust
//! use shiguredo_http11_parser::{BodyRead, ParserContext, Status};
//!
//! let mut ctx = ParserContext::new();
//! ctx.feed(b"POST /echo HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n")
//!     .unwrap();
//! assert_eq!(ctx.filter_headers().unwrap(), Status::Complete);
//!
//! ctx.feed(b"4\r\nWiki\r\n0\r\n\r\n").unwrap();
//! let mut body = Vec::new();
//! loop {
//!     match ctx.read_body().unwrap() {
//!         BodyRead::Data(data) => body.extend_from_slice(&data),
//!         BodyRead::NeedMore => break, // 受信データを feed して再開
//!         BodyRead::Complete => break,
//!     }
//! }
//! assert_eq!(body, b"Wiki");
//! assert!(!ctx.should_close());
//! ```
//!
//! ### 一括デコード
//!
//! ```rust
//! use shiguredo_http11_parser::ParserContext;
//!
//! let mut ctx = ParserContext::new();
//! ctx.feed(b"GET /a?b=c HTTP/1.0\r\nHost: example.com\r\n\r\n").unwrap();
//! let request = ctx.decode().unwrap().unwrap();
//! assert_eq!(request.path(), "/a");
//! assert_eq!(request.query(), "b=c");
//! assert!(request.should_close(false));
//! ```

mod chunked;
mod connection;
mod context;
mod error;
mod framing;
mod header;
mod limits;
mod request;
mod request_line;
mod scanner;
pub mod uri;

pub use chunked::{ChunkDecoder, ChunkState};
pub use connection::should_close;
pub use context::{BodyRead, ParseState, ParserContext, Status};
pub use error::Error;
pub use framing::{BodyFraming, Filtered, content_length, is_chunked};
pub use header::{
    CanonicalizeName, HeaderTable, Preserve, TitleCase, parse_header_block, parse_header_line,
};
pub use limits::ParserLimits;
pub use request::Request;
pub use request_line::{RequestLine, Version, parse_request_line, parse_version};
pub use scanner::{HeaderBlockScanner, Scan, scan};
