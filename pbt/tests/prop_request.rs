//! リクエスト全体のプロパティテスト (context.rs / request_line.rs / header.rs)

use pbt::{
    body, chunks, encode_chunked, encode_head, extension_headers, http_method, http_version,
    request_target, split_at_points, split_points,
};
use proptest::prelude::*;
use shiguredo_http11_parser::{
    ParserContext, Request, TitleCase, Version, parse_header_block, parse_request_line,
    parse_version,
};

/// 分割して順に渡し、リクエストと残りのバイト列を返す
fn decode_in_pieces(data: &[u8], points: &[usize]) -> (Request, Vec<u8>) {
    let mut ctx = ParserContext::new();
    for piece in split_at_points(data, points) {
        ctx.feed(piece).unwrap();
        if let Some(request) = ctx.decode().unwrap() {
            return (request, ctx.remaining().to_vec());
        }
    }
    panic!("request not complete");
}

fn decode_at_once(data: &[u8]) -> (Request, Vec<u8>) {
    decode_in_pieces(data, &[])
}

proptest! {
    #[test]
    fn content_length_request_split_invariant(
        method in http_method(),
        target in request_target(),
        version in http_version(),
        mut headers in extension_headers(),
        payload in body(),
        points in split_points()
    ) {
        headers.push(("Content-Length".to_string(), payload.len().to_string()));
        let mut data = encode_head(&method, &target, version, &headers);
        data.extend_from_slice(&payload);

        let expected = decode_at_once(&data);
        prop_assert_eq!(&expected.0.body, &payload);
        prop_assert!(expected.1.is_empty());
        prop_assert_eq!(decode_in_pieces(&data, &points), expected);
    }

    #[test]
    fn chunked_request_split_invariant(
        headers in extension_headers(),
        parts in chunks(),
        points in split_points()
    ) {
        let mut all = headers;
        all.push(("Transfer-Encoding".to_string(), "chunked".to_string()));
        let mut data = encode_head("POST", "/upload", (1, 1), &all);
        data.extend_from_slice(&encode_chunked(&parts, None));

        let (request, rest) = decode_in_pieces(&data, &points);
        prop_assert_eq!(request.body, parts.concat());
        prop_assert!(rest.is_empty());
    }

    #[test]
    fn surplus_bytes_survive_for_next_request(
        payload in body(),
        next in "[A-Z]{3,7} /[a-z]{0,8} HTTP/1\\.1\r\n\r\n",
        points in split_points()
    ) {
        let mut data = encode_head(
            "POST",
            "/",
            (1, 1),
            &[("Content-Length".to_string(), payload.len().to_string())],
        );
        data.extend_from_slice(&payload);
        data.extend_from_slice(next.as_bytes());

        let (request, rest) = decode_in_pieces(&data, &points);
        prop_assert_eq!(request.body, payload);
        // 分割次第では次のリクエストの一部しか届いていない
        prop_assert!(next.as_bytes().starts_with(&rest));
    }

    #[test]
    fn request_line_fields(
        method in http_method(),
        target in request_target(),
        version in http_version()
    ) {
        let line = format!("{} {} HTTP/{}.{}", method, target, version.0, version.1);
        let parsed = parse_request_line(&line).unwrap();
        prop_assert_eq!(parsed.method, method.to_ascii_uppercase());
        prop_assert_eq!(parsed.target, target);
        prop_assert_eq!(parsed.version, Version::new(version.0, version.1));
    }

    #[test]
    fn request_line_needs_three_tokens(
        tokens in proptest::collection::vec("[!-~]{1,8}", 0..6)
    ) {
        prop_assume!(tokens.len() != 3);
        prop_assert!(parse_request_line(&tokens.join(" ")).is_err());
    }

    #[test]
    fn parse_version_never_fails(
        token in prop_oneof![
            "HTTP/[0-9]{1,3}\\.[0-9]{1,3}",
            "HTTP/[0-9a-z.]{0,6}",
            "\\PC{0,16}",
        ]
    ) {
        let version = parse_version(&token);
        let strict = token
            .strip_prefix("HTTP/")
            .and_then(|v| v.split_once('.'))
            .filter(|(major, minor)| {
                !major.is_empty()
                    && !minor.is_empty()
                    && major.bytes().all(|b| b.is_ascii_digit())
                    && minor.bytes().all(|b| b.is_ascii_digit())
            })
            .and_then(|(major, minor)| Some(Version::new(major.parse().ok()?, minor.parse().ok()?)));
        prop_assert_eq!(version, strict.unwrap_or(Version::HTTP_10));
    }

    #[test]
    fn folded_value_joined_with_single_space(
        first in "[!-~]{1,16}",
        continuation in "[!-~]{1,16}",
        indent in "[ \t]{1,4}"
    ) {
        let lines = [
            format!("X-Folded: {}", first),
            format!("{}{}", indent, continuation),
        ];
        let table = parse_header_block(lines.iter().map(String::as_str), &TitleCase);
        let expected = format!("{} {}", first, continuation);
        prop_assert_eq!(table.get("x-folded"), Some(expected.as_str()));
        prop_assert_eq!(table.len(), 1);
    }

    #[test]
    fn lookup_returns_last_value(values in proptest::collection::vec("[!-~]{1,8}", 1..5)) {
        let lines: Vec<String> = values.iter().map(|v| format!("X-Dup: {}", v)).collect();
        let table = parse_header_block(lines.iter().map(String::as_str), &TitleCase);
        prop_assert_eq!(table.get("X-DUP"), values.last().map(String::as_str));
        prop_assert_eq!(table.get_all("x-dup").len(), values.len());
    }
}
