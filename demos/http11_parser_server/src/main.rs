//! HTTP サーバーの例 (tokio_http11_parser)
//!
//! 使い方:
//!   cargo run -p http11_parser_server
//!   cargo run -p http11_parser_server -- --port 8081 --keep-alive-timeout 5 --log-level debug
//!
//! 動作確認:
//!   curl -v http://localhost:8080/echo -H 'Transfer-Encoding: chunked' -d 'hello'

use std::time::Duration;

use tokio_http11_parser::{ParserLimits, Request, Response, Server};

struct ServerOptions {
    port: u16,
    keep_alive_timeout: u64,
    max_requests: u32,
    log_level: tracing::Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = parse_args()?;

    tracing_subscriber::fmt()
        .with_max_level(options.log_level)
        .init();

    let addr = format!("0.0.0.0:{}", options.port);
    let server = Server::bind(&addr)
        .await?
        .keep_alive_timeout(Duration::from_secs(options.keep_alive_timeout))
        .max_requests_per_connection(options.max_requests)
        .limits(ParserLimits::default());

    tracing::info!("HTTP server listening on http://{}", addr);
    server.serve(handle).await?;
    Ok(())
}

fn parse_args() -> Result<ServerOptions, Box<dyn std::error::Error>> {
    let mut args = noargs::raw_args();
    args.metadata_mut().app_name = "http11_parser_server";

    // --help フラグ
    noargs::HELP_FLAG.take_help(&mut args);

    // --version フラグ
    let version_flag: bool = noargs::flag("version")
        .short('V')
        .doc("Show version")
        .take(&mut args)
        .is_present();
    if version_flag {
        println!("{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    // --port オプション
    let port: u16 = noargs::opt("port")
        .short('p')
        .doc("Port to listen on")
        .default("8080")
        .take(&mut args)
        .then(|o| o.value().parse())
        .map_err(|e| format!("{:?}", e))?;

    // --keep-alive-timeout オプション (秒)
    let keep_alive_timeout: u64 = noargs::opt("keep-alive-timeout")
        .doc("Seconds to wait for the next request on an idle connection")
        .default("60")
        .take(&mut args)
        .then(|o| o.value().parse())
        .map_err(|e| format!("{:?}", e))?;

    // --max-requests オプション
    let max_requests: u32 = noargs::opt("max-requests")
        .doc("Maximum number of requests per connection")
        .default("1000")
        .take(&mut args)
        .then(|o| o.value().parse())
        .map_err(|e| format!("{:?}", e))?;

    // --log-level オプション
    let log_level: tracing::Level = noargs::opt("log-level")
        .doc("Log level (error, warn, info, debug, trace)")
        .default("info")
        .take(&mut args)
        .then(|o| o.value().parse())
        .map_err(|e| format!("{:?}", e))?;

    // 未知の引数があればエラー、ヘルプが返されたら表示
    if let Some(help) = args.finish().map_err(|e| format!("{:?}", e))? {
        print!("{}", help);
        std::process::exit(0);
    }

    Ok(ServerOptions {
        port,
        keep_alive_timeout,
        max_requests,
        log_level,
    })
}

async fn handle(request: Request) -> Response {
    match request.path() {
        "/" => Response::new(200, "OK")
            .header("Content-Type", "text/plain; charset=utf-8")
            .header("Server", "http11_parser_server")
            .body(b"Hello from shiguredo_http11_parser\n".to_vec()),
        "/echo" => {
            let mut body = format!(
                "Method: {}\nTarget: {}\nVersion: {}\n\nHeaders:\n",
                request.method(),
                request.target(),
                request.version()
            );
            for (name, value) in request.headers.iter() {
                body.push_str(&format!("  {}: {}\n", name, value));
            }

            if !request.body.is_empty() {
                body.push_str(&format!("\nBody ({} bytes):\n", request.body.len()));
                match std::str::from_utf8(&request.body) {
                    Ok(text) => body.push_str(text),
                    Err(_) => body.push_str("[binary data]"),
                }
            }

            Response::new(200, "OK")
                .header("Content-Type", "text/plain; charset=utf-8")
                .header("Server", "http11_parser_server")
                .body(body.into_bytes())
        }
        _ => Response::new(404, "Not Found")
            .header("Content-Type", "text/plain")
            .header("Server", "http11_parser_server")
            .body(b"404 Not Found\n".to_vec()),
    }
}
