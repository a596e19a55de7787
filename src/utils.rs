//! Small text and time helpers shared by the scrapers and the pipeline.

use chrono::Local;
use once_cell::sync::Lazy;
use quick_xml::escape::unescape;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Truncate a string for logging purposes.
///
/// Counts characters rather than bytes so Hangul text never splits inside a
/// code point. Long strings get an ellipsis and the number of bytes dropped.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Keep at most `max` characters, without any marker.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// A completion cut off by the token limit fails to parse with an EOF error;
/// the caller re-asks once in that case.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WS_RE.replace_all(s, " ").trim().to_string()
}

/// Remove markup tags and decode entities, e.g. search API titles that come
/// back as `<b>국회</b> &quot;발언&quot;`.
pub fn strip_tags(s: &str) -> String {
    let without_tags = TAG_RE.replace_all(s, "");
    let decoded = match unescape(&without_tags) {
        Ok(text) => text.into_owned(),
        Err(_) => without_tags
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&#39;", "'")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&nbsp;", " ")
            .replace("&amp;", "&"),
    };
    collapse_whitespace(&decoded)
}

/// Date stamp printed on cards, e.g. `2025.05.06`.
pub fn card_date() -> String {
    Local::now().format("%Y.%m.%d").to_string()
}

/// First visible character of a name, used as the avatar letter.
pub fn first_char_or(s: &str, fallback: char) -> char {
    s.trim().chars().next().unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_hangul() {
        let s = "가나다라마바사";
        let result = truncate_for_log(s, 3);
        assert!(result.starts_with("가나다…"));
        assert!(result.ends_with("(+12 bytes)"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("국회의원", 2), "국회");
        assert_eq!(truncate_chars("ab", 10), "ab");
    }

    #[test]
    fn test_looks_truncated() {
        let json_eof = r#"{"field": "value"#;
        let err = serde_json::from_str::<serde_json::Value>(json_eof).unwrap_err();
        assert!(looks_truncated(&err));

        let json_bad = r#"{"field": value}"#;
        let err = serde_json::from_str::<serde_json::Value>(json_bad).unwrap_err();
        assert!(!looks_truncated(&err));
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("<b>국회</b>   &quot;발언&quot; &amp; 논란"),
            "국회 \"발언\" & 논란"
        );
        assert_eq!(strip_tags("plain"), "plain");
    }

    #[test]
    fn test_strip_tags_unknown_entity_falls_back() {
        assert_eq!(strip_tags("a&nbsp;b &amp; c"), "a b & c");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
    }

    #[test]
    fn test_card_date_format() {
        let d = card_date();
        assert_eq!(d.len(), 10);
        assert_eq!(&d[4..5], ".");
        assert_eq!(&d[7..8], ".");
    }

    #[test]
    fn test_first_char_or() {
        assert_eq!(first_char_or(" 이재명", '?'), '이');
        assert_eq!(first_char_or("", '?'), '?');
    }
}
