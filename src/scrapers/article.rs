//! Article body extraction.
//!
//! Feed descriptions are often a single line, too little to find a quoted
//! claim in. For those stories the article page is fetched and the body is
//! pulled from the first known body container, falling back to `<p>` text.

use crate::models::RawArticle;
use crate::scrapers::{get_text_with_retry, pause};
use crate::utils::{collapse_whitespace, truncate_chars};
use reqwest::Client;
use scraper::{Html, Selector};
use std::error::Error;
use tracing::{debug, info, instrument, warn};

/// Body text beyond this many characters is not sent anywhere.
pub const MAX_BODY_CHARS: usize = 3000;

/// Descriptions shorter than this trigger a page fetch.
pub const THIN_CONTENT_CHARS: usize = 120;

/// Body containers used by the outlets we index (Naver, Yonhap, Hani,
/// Kyunghyang, Donga), most specific first.
const BODY_SELECTORS: &[&str] = &[
    "#dic_area",
    "#newsct_article",
    "#articleBodyContents",
    ".story-news.article",
    ".article-text",
    "#article-view-content-div",
    ".news_cnt_detail_wrap",
    "#article_txt",
    "article",
];

/// Extract readable body text from an article page.
pub fn extract_body(html: &str) -> String {
    let document = Html::parse_document(html);

    for raw in BODY_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
            if !text.is_empty() {
                return truncate_chars(&text, MAX_BODY_CHARS);
            }
        }
    }

    let paragraphs = Selector::parse("p")
        .map(|p| {
            document
                .select(&p)
                .map(|el| collapse_whitespace(&el.text().collect::<String>()))
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();
    truncate_chars(&paragraphs, MAX_BODY_CHARS)
}

/// Fetch one article page and return its body text.
#[instrument(level = "info", skip(client))]
pub async fn fetch_body(client: &Client, url: &str) -> Result<String, Box<dyn Error>> {
    let html = get_text_with_retry(client, url).await?;
    let body = extract_body(&html);
    debug!(chars = body.chars().count(), "Extracted article body");
    Ok(body)
}

/// Fill in bodies for articles whose feed description is too thin.
///
/// At most `limit` pages are fetched, one at a time with `delay_ms` between
/// requests. Failures keep the original description.
#[instrument(level = "info", skip_all, fields(total = articles.len(), limit = limit))]
pub async fn enrich_bodies(client: &Client, articles: &mut [RawArticle], limit: usize, delay_ms: u64) {
    let mut fetched = 0usize;
    for article in articles.iter_mut() {
        if fetched >= limit {
            break;
        }
        if article.content.chars().count() >= THIN_CONTENT_CHARS {
            continue;
        }
        fetched += 1;
        match fetch_body(client, &article.url).await {
            Ok(body) if body.chars().count() > article.content.chars().count() => {
                article.content = body;
            }
            Ok(_) => debug!(url = %article.url, "Fetched body was not longer than description"),
            Err(e) => warn!(url = %article.url, error = %e, "Article fetch failed; keeping description"),
        }
        pause(delay_ms).await;
    }
    info!(fetched, "Enriched article bodies");
}
