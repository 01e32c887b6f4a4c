//! PBT テスト共通ユーティリティ

use proptest::prelude::*;

// ========================================
// 分割
// ========================================

/// 分割位置 (入力長で剰余を取って使う)
pub fn split_points() -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::vec(any::<usize>(), 0..8)
}

/// `points` の位置でバイト列を分割する
///
/// 空の断片も含めて、連結すると元のバイト列に戻る。
pub fn split_at_points<'a>(data: &'a [u8], points: &[usize]) -> Vec<&'a [u8]> {
    let mut cuts: Vec<usize> = points.iter().map(|p| p % (data.len() + 1)).collect();
    cuts.sort_unstable();

    let mut pieces = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        pieces.push(&data[start..cut]);
        start = cut;
    }
    pieces.push(&data[start..]);
    pieces
}

// ========================================
// リクエスト生成
// ========================================

pub fn http_method() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("GET".to_string()),
        Just("POST".to_string()),
        Just("PUT".to_string()),
        Just("DELETE".to_string()),
        Just("PATCH".to_string()),
        "[a-z]{1,8}".prop_map(|s| s),
    ]
}

pub fn request_target() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("/".to_string()),
        Just("*".to_string()),
        "/[a-zA-Z0-9/_.-]{1,32}".prop_map(|s| s),
        "/[a-z]{1,8}\\?[a-z]{1,8}=[a-z0-9]{0,8}".prop_map(|s| s),
        "http://[a-z]{1,8}\\.example/[a-z]{0,8}".prop_map(|s| s),
    ]
}

pub fn http_version() -> impl Strategy<Value = (u32, u32)> {
    prop_oneof![Just((1, 0)), Just((1, 1)), (0u32..10, 0u32..10)]
}

/// 拡張ヘッダー名 (フレーミングや接続に関わるヘッダーと衝突しない)
pub fn extension_header_name() -> impl Strategy<Value = String> {
    "X-[A-Za-z0-9]{1,16}".prop_map(|s| s)
}

/// 前後に空白を含まないヘッダー値
pub fn header_value() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[!-~]([ -~]{0,30}[!-~])?".prop_map(|s| s),
    ]
}

pub fn extension_headers() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::vec((extension_header_name(), header_value()), 0..6)
}

pub fn body() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..256)
}

/// チャンク列 (空チャンクは終端と紛らわしいので含めない)
pub fn chunks() -> impl Strategy<Value = Vec<Vec<u8>>> {
    proptest::collection::vec(proptest::collection::vec(any::<u8>(), 1..64), 0..5)
}

/// チャンク列を chunked 形式にエンコードする
///
/// `extension` があれば各サイズ行に付ける。
pub fn encode_chunked(chunks: &[Vec<u8>], extension: Option<&str>) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in chunks {
        out.extend_from_slice(format!("{:x}", chunk.len()).as_bytes());
        if let Some(ext) = extension {
            out.push(b';');
            out.extend_from_slice(ext.as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(chunk);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n\r\n");
    out
}

/// ヘッダーブロック (空行まで) を組み立てる
pub fn encode_head(
    method: &str,
    target: &str,
    version: (u32, u32),
    headers: &[(String, String)],
) -> Vec<u8> {
    let mut out = format!("{} {} HTTP/{}.{}\r\n", method, target, version.0, version.1);
    for (name, value) in headers {
        out.push_str(&format!("{}: {}\r\n", name, value));
    }
    out.push_str("\r\n");
    out.into_bytes()
}
