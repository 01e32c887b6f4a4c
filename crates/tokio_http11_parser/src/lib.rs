//! tokio_http11_parser - Tokio connection driver for shiguredo_http11_parser
//!
//! Sans I/O パーサーにソケットを結び付ける非同期 HTTP/1.x サーバー。
//!
//! ## 特徴
//!
//! - **shiguredo_http11_parser ベース**: バイト列の解釈はすべてパーサーに任せる
//! - **非同期 I/O**: tokio による完全非同期対応
//! - **Keep-Alive**: パイプライン化されたリクエストも順に処理する
//!
//! ## サーバー
//!
//! ```ignore
//! use tokio_http11_parser::{Request, Response, Server};
//!
//! async fn handler(request: Request) -> Response {
//!     Response::new(200, "OK")
//!         .header("Content-Type", "text/plain")
//!         .body(b"Hello, World!".to_vec())
//! }
//!
//! let server = Server::bind("0.0.0.0:8080").await?;
//! server.serve(handler).await?;
//! ```

pub mod error;
mod response;
pub mod server;

pub use error::{Error, Result};
pub use response::Response;
pub use server::{Handler, Server};

// shiguredo_http11_parser の型を re-export
pub use shiguredo_http11_parser::{ParserLimits, Request};
