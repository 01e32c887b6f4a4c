//! ヘッダーフィールドのパース

use crate::error::Error;

/// ヘッダー名を表示用の正規形に変換する
pub trait CanonicalizeName {
    fn canonicalize(&self, name: &str) -> String;
}

/// `-` 区切りの各語の先頭だけを大文字にする (`content-length` → `Content-Length`)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TitleCase;

impl CanonicalizeName for TitleCase {
    fn canonicalize(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len());
        let mut word_start = true;
        for c in name.chars() {
            if word_start {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c.to_ascii_lowercase());
            }
            word_start = c == '-';
        }
        out
    }
}

/// 受信したままの名前を使う
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Preserve;

impl CanonicalizeName for Preserve {
    fn canonicalize(&self, name: &str) -> String {
        name.to_string()
    }
}

/// ヘッダーテーブル
///
/// 受信順の (名前, 値) リストを重複込みで保持する。
/// 名前による参照は大文字小文字を区別せず、最後に現れた値を返す。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderTable {
    fields: Vec<(String, String)>,
    content_length: u64,
}

impl HeaderTable {
    /// 名前に対応する最後の値を取得 (大文字小文字を区別しない)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 指定した名前の値をすべて受信順で取得
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Content-Length の値
    ///
    /// ヘッダーがない、または数値として読めない場合は 0。
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn into_fields(self) -> Vec<(String, String)> {
        self.fields
    }
}

/// ヘッダー行をパース
///
/// `:` がない、または名前が空の場合は `MalformedHeaderLine`。
/// 値の前後の空白と末尾の改行は取り除く。
pub fn parse_header_line<C: CanonicalizeName + ?Sized>(
    line: &str,
    canonicalizer: &C,
) -> Result<(String, String), Error> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| Error::MalformedHeaderLine(line.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::MalformedHeaderLine(line.to_string()));
    }
    let value = value.trim_end_matches(['\r', '\n']).trim();
    Ok((canonicalizer.canonicalize(name), value.to_string()))
}

/// 継続行 (obs-fold) か確認
fn is_continuation(line: &str) -> bool {
    line.starts_with([' ', '\t'])
}

/// ヘッダーブロック (リクエスト行を除く) をパース
///
/// 不正な行は読み飛ばして残りの行のパースを続ける。
/// 継続行は直前のヘッダーの値に空白 1 つで連結する。直前の行が
/// なかった場合や読み飛ばされた場合は継続行も捨てる。
pub fn parse_header_block<'a, I, C>(lines: I, canonicalizer: &C) -> HeaderTable
where
    I: IntoIterator<Item = &'a str>,
    C: CanonicalizeName + ?Sized,
{
    let mut fields: Vec<(String, String)> = Vec::new();
    let mut last: Option<usize> = None;

    for line in lines {
        if line.is_empty() {
            continue;
        }
        if is_continuation(line) {
            let folded = line.trim();
            match last {
                Some(index) => {
                    if !folded.is_empty() {
                        let value = &mut fields[index].1;
                        if !value.is_empty() {
                            value.push(' ');
                        }
                        value.push_str(folded);
                    }
                }
                None => {
                    tracing::debug!(line, "dropping continuation line without a preceding header");
                }
            }
            continue;
        }
        match parse_header_line(line, canonicalizer) {
            Ok(field) => {
                fields.push(field);
                last = Some(fields.len() - 1);
            }
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed header line");
                last = None;
            }
        }
    }

    let content_length = fields
        .iter()
        .rev()
        .find(|(n, _)| n.eq_ignore_ascii_case("Content-Length"))
        .and_then(|(_, v)| v.parse::<u64>().ok())
        .unwrap_or(0);

    HeaderTable {
        fields,
        content_length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(text: &str) -> HeaderTable {
        parse_header_block(text.split("\r\n"), &TitleCase)
    }

    #[test]
    fn title_case() {
        assert_eq!(TitleCase.canonicalize("content-length"), "Content-Length");
        assert_eq!(TitleCase.canonicalize("X-FORWARDED-FOR"), "X-Forwarded-For");
        assert_eq!(TitleCase.canonicalize("host"), "Host");
        assert_eq!(TitleCase.canonicalize("te"), "Te");
        assert_eq!(TitleCase.canonicalize("a--b"), "A--B");
    }

    #[test]
    fn header_line() {
        assert_eq!(
            parse_header_line("content-type :  text/plain \r\n", &TitleCase).unwrap(),
            ("Content-Type".to_string(), "text/plain".to_string())
        );
        assert_eq!(
            parse_header_line("X-Empty:", &TitleCase).unwrap(),
            ("X-Empty".to_string(), String::new())
        );
        assert_eq!(
            parse_header_line("Host: a:8080", &Preserve).unwrap(),
            ("Host".to_string(), "a:8080".to_string())
        );
    }

    #[test]
    fn header_line_errors() {
        assert!(matches!(
            parse_header_line("no separator", &TitleCase),
            Err(Error::MalformedHeaderLine(_))
        ));
        assert!(matches!(
            parse_header_line("  : value", &TitleCase),
            Err(Error::MalformedHeaderLine(_))
        ));
    }

    #[test]
    fn folding() {
        let table = block("X-Foo: bar\r\n\tbaz");
        assert_eq!(table.get("X-Foo"), Some("bar baz"));
        assert_eq!(table.len(), 1);

        let table = block("X-Foo: a\r\n  b\r\n\tc\r\nY: d");
        assert_eq!(table.get("x-foo"), Some("a b c"));
        assert_eq!(table.get("Y"), Some("d"));
    }

    #[test]
    fn folding_without_preceding_header_is_dropped() {
        let table = block("\torphan\r\nA: b");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("A"), Some("b"));
    }

    #[test]
    fn folding_after_malformed_line_is_dropped() {
        let table = block("A: b\r\nbroken\r\n\tcontinued");
        assert_eq!(table.get("A"), Some("b"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let table = block("A: 1\r\nnot a header\r\nB: 2");
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("A"), Some("1"));
        assert_eq!(table.get("B"), Some("2"));
    }

    #[test]
    fn duplicates_preserved_lookup_returns_last() {
        let table = block("Accept: a\r\naccept: b\r\nOther: x");
        assert_eq!(table.get("ACCEPT"), Some("b"));
        assert_eq!(table.get_all("accept"), vec!["a", "b"]);
        let names: Vec<&str> = table.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Accept", "Accept", "Other"]);
        assert!(table.contains("other"));
        assert!(!table.contains("missing"));
    }

    #[test]
    fn content_length_cached() {
        assert_eq!(block("Content-Length: 42").content_length(), 42);
        assert_eq!(block("content-length: 7").content_length(), 7);
        assert_eq!(block("Host: a").content_length(), 0);
        assert_eq!(block("Content-Length: abc").content_length(), 0);
        assert_eq!(block("Content-Length: -1").content_length(), 0);
        assert_eq!(block("").content_length(), 0);
    }

    #[test]
    fn preserve_canonicalizer() {
        let table = parse_header_block(["x-lower: v"], &Preserve);
        assert_eq!(table.fields()[0].0, "x-lower");
        assert_eq!(table.get("X-Lower"), Some("v"));
    }
}
