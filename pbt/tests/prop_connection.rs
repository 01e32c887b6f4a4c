//! 接続維持判定のプロパティテスト (connection.rs)

use proptest::prelude::*;
use shiguredo_http11_parser::{TitleCase, Version, parse_header_block, should_close};

fn connection_value() -> impl Strategy<Value = Option<String>> {
    proptest::option::of(prop_oneof![
        Just("close".to_string()),
        Just("Close".to_string()),
        Just("keep-alive".to_string()),
        Just("Keep-Alive".to_string()),
        Just("Upgrade".to_string()),
        Just("keep-alive, Upgrade".to_string()),
        Just("keep-alive, close".to_string()),
    ])
}

fn version() -> impl Strategy<Value = Version> {
    (0u32..3, 0u32..3).prop_map(|(major, minor)| Version::new(major, minor))
}

proptest! {
    #[test]
    fn close_decision_table(
        version in version(),
        connection in connection_value(),
        explicit_override in any::<bool>()
    ) {
        let lines: Vec<String> = connection
            .iter()
            .map(|v| format!("Connection: {}", v))
            .collect();
        let headers = parse_header_block(lines.iter().map(String::as_str), &TitleCase);

        let tokens: Vec<String> = connection
            .iter()
            .flat_map(|v| v.split(','))
            .map(|t| t.trim().to_ascii_lowercase())
            .collect();
        let expected = if explicit_override {
            true
        } else if tokens.iter().any(|t| t == "close") {
            true
        } else if tokens.iter().any(|t| t == "keep-alive") {
            false
        } else {
            version < Version::HTTP_11
        };

        prop_assert_eq!(should_close(version, &headers, explicit_override), expected);
    }

    #[test]
    fn override_always_closes(version in version(), connection in connection_value()) {
        let lines: Vec<String> = connection
            .iter()
            .map(|v| format!("Connection: {}", v))
            .collect();
        let headers = parse_header_block(lines.iter().map(String::as_str), &TitleCase);
        prop_assert!(should_close(version, &headers, true));
    }
}
