//! HTTP サーバー
//!
//! tokio を使用した非同期 HTTP/1.x サーバー。
//! バイト列の解釈はすべて [`ParserContext`] に任せ、ここでは読み書きだけを行う。
//!
//! ## 使い方
//!
//! ```ignore
//! use tokio_http11_parser::{Request, Response, Server};
//!
//! async fn handler(request: Request) -> Response {
//!     Response::new(200, "OK").body(request.body)
//! }
//!
//! let server = Server::bind("0.0.0.0:8080").await?;
//! server.serve(handler).await?;
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use shiguredo_http11_parser::{ParseState, ParserContext, ParserLimits, Request};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpListener;
use tracing::Instrument;

use crate::error::{Error, Result};
use crate::response::Response;

/// HTTP リクエストハンドラー
pub trait Handler: Send + Sync + 'static {
    /// リクエストを処理してレスポンスを返す
    fn handle(&self, request: Request) -> impl Future<Output = Response> + Send;
}

/// 関数からハンドラーを作成
impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send,
{
    fn handle(&self, request: Request) -> impl Future<Output = Response> + Send {
        (self)(request)
    }
}

/// HTTP サーバー
pub struct Server {
    listener: TcpListener,
    keep_alive_timeout: Duration,
    max_requests_per_connection: u32,
    read_buffer_size: usize,
    write_buffer_size: usize,
    limits: ParserLimits,
}

impl Server {
    /// 指定アドレスにバインド
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            keep_alive_timeout: Duration::from_secs(60),
            max_requests_per_connection: 1000,
            read_buffer_size: 8192,
            write_buffer_size: 65536,
            limits: ParserLimits::default(),
        })
    }

    /// Keep-Alive タイムアウトを設定
    ///
    /// この時間内に次のバイト列が届かなければ接続を閉じる。
    pub fn keep_alive_timeout(mut self, timeout: Duration) -> Self {
        self.keep_alive_timeout = timeout;
        self
    }

    /// 1 接続あたりの最大リクエスト数を設定
    pub fn max_requests_per_connection(mut self, max: u32) -> Self {
        self.max_requests_per_connection = max;
        self
    }

    /// 読み取りバッファサイズを設定
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// 書き込みバッファサイズを設定
    pub fn write_buffer_size(mut self, size: usize) -> Self {
        self.write_buffer_size = size;
        self
    }

    /// パーサーの制限を設定
    pub fn limits(mut self, limits: ParserLimits) -> Self {
        self.limits = limits;
        self
    }

    /// ローカルアドレスを取得
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// サーバーを起動
    pub async fn serve<H: Handler>(self, handler: H) -> Result<()> {
        let config = Arc::new(self.connection_config());
        let handler = Arc::new(handler);
        tracing::info!(addr = ?self.listener.local_addr().ok(), "server started");

        loop {
            let (stream, peer_addr) = self.listener.accept().await?;
            let config = config.clone();
            let handler = handler.clone();

            let span = tracing::debug_span!("connection", %peer_addr);
            tokio::spawn(
                async move {
                    if let Err(e) = handle_connection(stream, config, handler).await {
                        tracing::warn!(error = %e, "connection error");
                    }
                }
                .instrument(span),
            );
        }
    }

    /// 単一の接続を処理 (テスト用)
    pub async fn handle_one<H: Handler>(self, handler: H) -> Result<()> {
        let (stream, peer_addr) = self.listener.accept().await?;
        let config = Arc::new(self.connection_config());
        let handler = Arc::new(handler);

        let span = tracing::debug_span!("connection", %peer_addr);
        handle_connection(stream, config, handler)
            .instrument(span)
            .await
    }

    fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            keep_alive_timeout: self.keep_alive_timeout,
            max_requests_per_connection: self.max_requests_per_connection,
            read_buffer_size: self.read_buffer_size,
            write_buffer_size: self.write_buffer_size,
            limits: self.limits.clone(),
        }
    }
}

struct ConnectionConfig {
    keep_alive_timeout: Duration,
    max_requests_per_connection: u32,
    read_buffer_size: usize,
    write_buffer_size: usize,
    limits: ParserLimits,
}

/// 接続を処理
///
/// パイプライン化されたリクエストはバッファに残ったバイト列から続けて処理する。
async fn handle_connection<S, H>(
    stream: S,
    config: Arc<ConnectionConfig>,
    handler: Arc<H>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite,
    H: Handler,
{
    let (reader, writer) = tokio::io::split(stream);
    let mut reader = BufReader::with_capacity(config.read_buffer_size, reader);
    let mut writer = BufWriter::with_capacity(config.write_buffer_size, writer);

    let mut ctx = ParserContext::with_limits(config.limits.clone());
    let mut buf = vec![0u8; config.read_buffer_size];
    let mut request_count = 0u32;

    loop {
        match ctx.decode() {
            Ok(Some(request)) => {
                request_count += 1;
                let keep_alive = !request.should_close(false)
                    && request_count < config.max_requests_per_connection;
                tracing::debug!(
                    method = request.method(),
                    target = request.target(),
                    body_len = request.body.len(),
                    keep_alive,
                    "request received"
                );

                let mut response = handler.handle(request).await;
                if !keep_alive && !response.has_header("Connection") {
                    response.add_header("Connection", "close");
                }
                writer.write_all(&response.encode()).await?;
                writer.flush().await?;

                if !keep_alive {
                    return Ok(());
                }
                ctx = ctx.next_request()?;
                continue;
            }
            Ok(None) => {}
            Err(e) => return reject(&mut writer, e).await,
        }

        let idle = is_idle(&ctx);
        let n = match tokio::time::timeout(config.keep_alive_timeout, reader.read(&mut buf)).await
        {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(Error::Io(e)),
            Err(_) if idle => {
                tracing::debug!("keep-alive timeout");
                return Ok(());
            }
            Err(elapsed) => return Err(elapsed.into()),
        };

        if n == 0 {
            if idle {
                return Ok(());
            }
            return Err(Error::ConnectionClosed);
        }

        if let Err(e) = ctx.feed(&buf[..n]) {
            return reject(&mut writer, e).await;
        }
    }
}

/// 次のリクエストの先頭バイトすら届いていないか
fn is_idle(ctx: &ParserContext) -> bool {
    ctx.state() == ParseState::AwaitingHeaders && ctx.remaining().is_empty()
}

/// パースエラーに対応するエラーレスポンスを返して接続を閉じる
async fn reject<W>(writer: &mut W, e: shiguredo_http11_parser::Error) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    tracing::debug!(error = %e, fatal = e.is_fatal_to_connection(), "rejecting request");
    let response = error_response(&e).header("Connection", "close");
    writer.write_all(&response.encode()).await?;
    writer.flush().await?;
    Err(Error::Http(e))
}

fn error_response(e: &shiguredo_http11_parser::Error) -> Response {
    use shiguredo_http11_parser::Error as ParseError;

    match e {
        ParseError::HeaderBlockTooLarge { .. } => {
            Response::new(431, "Request Header Fields Too Large")
        }
        ParseError::BufferOverflow { .. } | ParseError::ChunkTooLarge { .. } => {
            Response::new(413, "Content Too Large")
        }
        _ => Response::new(400, "Bad Request"),
    }
}
