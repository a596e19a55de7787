//! In-place update of the published fact-check page.
//!
//! The page carries a `<!-- FACT_CHECK_CARDS -->` comment; new cards are
//! written directly after the first occurrence so the newest checks sit at
//! the top of the list. The card stylesheet is added to the page's first
//! `<style>` block the first time cards are published.

use scraper::{Html, Selector};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Insertion point for new cards.
pub const CARD_MARKER: &str = "<!-- FACT_CHECK_CARDS -->";

/// Opening comment of [`CARD_CSS`]; pages containing it already carry the
/// full card stylesheet. Hand-written `.falsehood-card` rules do not count.
const CSS_SENTINEL: &str = "/* fact-check cards */";

/// Styles for the card markup, inserted before the first `</style>`.
pub const CARD_CSS: &str = r#"
        /* fact-check cards */
        .falsehood-card {
            background: #fff;
            border-radius: 12px;
            padding: 20px;
            margin-bottom: 16px;
            box-shadow: 0 2px 8px rgba(0, 0, 0, 0.08);
            border-left: 4px solid #e74c3c;
        }
        .falsehood-header {
            display: flex;
            align-items: center;
            gap: 12px;
            margin-bottom: 12px;
        }
        .politician-avatar {
            width: 44px;
            height: 44px;
            border-radius: 50%;
            display: flex;
            align-items: center;
            justify-content: center;
            font-weight: 700;
            color: #fff;
            background: #7f8c8d;
        }
        .politician-info { flex: 1; }
        .politician-name { font-weight: 700; display: flex; align-items: center; gap: 6px; }
        .party-indicator { width: 10px; height: 10px; border-radius: 50%; background: #95a5a6; }
        .party-name-small { font-size: 0.8em; color: #7f8c8d; }
        .falsehood-date { font-size: 0.85em; color: #95a5a6; }
        .falsehood-source { font-size: 0.9em; color: #555; margin-bottom: 8px; }
        .falsehood-content {
            font-size: 1.05em;
            padding: 12px;
            background: #fdf2f2;
            border-radius: 8px;
            margin-bottom: 10px;
        }
        .falsehood-verdict {
            display: inline-block;
            padding: 4px 10px;
            border-radius: 12px;
            font-size: 0.85em;
            font-weight: 700;
            color: #fff;
            margin-bottom: 10px;
        }
        .verdict-true { background: #27ae60; }
        .verdict-mostly-true { background: #2ecc71; }
        .verdict-half-true { background: #f39c12; }
        .verdict-mostly-false { background: #e67e22; }
        .verdict-false { background: #e74c3c; }
        .verdict-unverifiable { background: #95a5a6; }
        .falsehood-correction { font-size: 0.95em; line-height: 1.6; }
        .correction-label { font-weight: 700; color: #27ae60; margin-right: 4px; }
        .falsehood-sources { margin-top: 10px; display: flex; gap: 10px; font-size: 0.85em; }
        .falsehood-sources a { color: #3498db; text-decoration: none; }
        .democrat-avatar, .democrat-indicator { background: #004ea2; }
        .ppp-avatar, .ppp-indicator { background: #e61e2b; }
        .reform-avatar, .reform-indicator { background: #ff7210; }
        .choi-avatar, .choi-indicator { background: #0a3d91; }
"#;

/// Insert `cards_html` right after the first marker.
///
/// Returns `None` if the page has no marker.
pub fn splice_cards(content: &str, cards_html: &str) -> Option<String> {
    let pos = content.find(CARD_MARKER)? + CARD_MARKER.len();
    let mut out = String::with_capacity(content.len() + cards_html.len());
    out.push_str(&content[..pos]);
    out.push_str(cards_html);
    out.push_str(&content[pos..]);
    Some(out)
}

/// Add [`CARD_CSS`] before the first `</style>` unless already present.
///
/// Returns the (possibly unchanged) page and whether styles were added. A
/// page without any `</style>` is left as is.
pub fn ensure_card_styles(content: &str) -> (String, bool) {
    if content.contains(CSS_SENTINEL) {
        return (content.to_string(), false);
    }
    let Some(pos) = content.find("</style>") else {
        warn!("Page has no </style>; card styles not injected");
        return (content.to_string(), false);
    };
    let mut out = String::with_capacity(content.len() + CARD_CSS.len());
    out.push_str(&content[..pos]);
    out.push_str(CARD_CSS);
    out.push_str(&content[pos..]);
    (out, true)
}

/// Statements already published on the page.
pub fn published_claims(content: &str) -> Vec<String> {
    let document = Html::parse_document(content);
    let Ok(selector) = Selector::parse(".falsehood-content") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Read the page, failing early when it cannot be updated.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_page(path: &Path) -> Result<String, Box<dyn Error>> {
    let content = fs::read_to_string(path).await?;
    if !content.contains(CARD_MARKER) {
        return Err(format!("{} has no {} marker", path.display(), CARD_MARKER).into());
    }
    info!(bytes = content.len(), "Read page");
    Ok(content)
}

/// Splice `cards_html` into the page at `path` and write it back.
///
/// With `dry_run` the updated page is built but not written. A page without
/// the marker is an error and is never touched.
#[instrument(level = "info", skip_all, fields(path = %path.display(), dry_run = dry_run))]
pub async fn update_page(path: &Path, cards_html: &str, dry_run: bool) -> Result<(), Box<dyn Error>> {
    let content = read_page(path).await?;
    let spliced = splice_cards(&content, cards_html)
        .ok_or_else(|| format!("{} has no {} marker", path.display(), CARD_MARKER))?;
    let (updated, styled) = ensure_card_styles(&spliced);
    if styled {
        info!("Injected card styles");
    }

    if dry_run {
        info!(bytes = updated.len(), "Dry run; page not written");
        return Ok(());
    }

    fs::write(path, updated).await?;
    info!("Wrote updated page");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PAGE: &str = "<html><head><style>\nbody { margin: 0; }\n</style></head>\n<body>\n<h1>팩트체크</h1>\n<!-- FACT_CHECK_CARDS -->\n<div class=\"falsehood-card\"><div class=\"falsehood-content\">기존 발언</div></div>\n</body></html>";

    #[test]
    fn test_splice_after_first_marker() {
        let page = format!("a{CARD_MARKER}b{CARD_MARKER}c");
        let out = splice_cards(&page, "NEW").unwrap();
        assert_eq!(out, format!("a{CARD_MARKER}NEWb{CARD_MARKER}c"));
        assert!(splice_cards("no marker here", "NEW").is_none());
    }

    #[test]
    fn test_styles_injected_once() {
        let page = "<style>\nbody {}\n</style><style>p {}</style>";
        let (out, added) = ensure_card_styles(page);
        assert!(added);
        let css_pos = out.find(".falsehood-card {").unwrap();
        assert!(css_pos < out.find("</style>").unwrap());
        assert_eq!(out.matches("/* fact-check cards */").count(), 1);

        let (again, added) = ensure_card_styles(&out);
        assert!(!added);
        assert_eq!(again, out);
    }

    #[test]
    fn test_styles_injected_alongside_existing_card_rules() {
        let page = "<style>.falsehood-card { padding: 1px; }</style><!-- FACT_CHECK_CARDS -->";
        let (out, added) = ensure_card_styles(page);
        assert!(added);
        assert!(out.contains(".falsehood-verdict {"));
        assert!(out.contains(".verdict-false {"));
        assert!(out.contains(".falsehood-sources {"));
        assert!(out.starts_with("<style>.falsehood-card { padding: 1px; }\n"));
    }

    #[test]
    fn test_styles_skipped_without_style_tag() {
        let (out, added) = ensure_card_styles("<html></html>");
        assert!(!added);
        assert_eq!(out, "<html></html>");
    }

    #[test]
    fn test_published_claims() {
        assert_eq!(published_claims(PAGE), vec!["기존 발언".to_string()]);
        assert!(published_claims("<html></html>").is_empty());
    }

    #[tokio::test]
    async fn test_update_page_writes_cards() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(&path, "<style></style>\n<!-- FACT_CHECK_CARDS -->\n").unwrap();

        update_page(&path, "<div>카드</div>", false).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("<!-- FACT_CHECK_CARDS --><div>카드</div>"));
        assert!(written.contains("/* fact-check cards */"));
    }

    #[tokio::test]
    async fn test_update_page_dry_run_leaves_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(&path, PAGE).unwrap();

        update_page(&path, "<div>카드</div>", true).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), PAGE);
    }

    #[tokio::test]
    async fn test_missing_marker_is_error_and_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(&path, "<html><style></style></html>").unwrap();

        assert!(update_page(&path, "<div>카드</div>", false).await.is_err());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "<html><style></style></html>"
        );
    }
}
