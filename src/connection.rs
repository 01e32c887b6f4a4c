//! 接続を閉じるかどうかの判定

use crate::header::HeaderTable;
use crate::request_line::Version;

/// Connection ヘッダーの指示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionDirective {
    Close,
    KeepAlive,
    Unspecified,
}

/// Connection ヘッダーをトークンリストとして解釈
///
/// close と keep-alive が両方あれば close を優先する。
fn connection_directive(headers: &HeaderTable) -> ConnectionDirective {
    let mut keep_alive = false;
    for value in headers.get_all("Connection") {
        for token in value.split(',').map(str::trim) {
            if token.eq_ignore_ascii_case("close") {
                return ConnectionDirective::Close;
            }
            if token.eq_ignore_ascii_case("keep-alive") {
                keep_alive = true;
            }
        }
    }
    if keep_alive {
        ConnectionDirective::KeepAlive
    } else {
        ConnectionDirective::Unspecified
    }
}

/// レスポンス後に接続を閉じるべきか判定
///
/// 優先順位:
/// 1. `explicit_override` が true なら閉じる
/// 2. `Connection: close` なら閉じる
/// 3. `Connection: Keep-Alive` なら維持する
/// 4. それ以外は HTTP/1.1 未満なら閉じ、HTTP/1.1 以上なら維持する
pub fn should_close(version: Version, headers: &HeaderTable, explicit_override: bool) -> bool {
    if explicit_override {
        return true;
    }
    match connection_directive(headers) {
        ConnectionDirective::Close => true,
        ConnectionDirective::KeepAlive => false,
        ConnectionDirective::Unspecified => version < Version::HTTP_11,
    }
}
