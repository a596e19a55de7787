//! News source scrapers.
//!
//! Every scraper follows the same two-phase pattern: index a source into
//! [`RawArticle`](crate::models::RawArticle)s, then (for stories whose
//! description is too thin) fetch the article page for its body text.
//!
//! # Sources
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | Politics RSS feeds | [`rss`] | RSS 2.0 / Atom via `quick-xml` |
//! | Section index pages | [`sections`] | HTML scraping with configured selectors |
//! | Naver news search | [`search`] | JSON API, cached by [`cache`] |
//! | Article pages | [`article`] | HTML body extraction |
//!
//! Requests are made one at a time with a fixed delay between them; failed
//! sources are logged and skipped.

pub mod article;
pub mod cache;
pub mod rss;
pub mod search;
pub mod sections;

use reqwest::Client;
use std::error::Error;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{instrument, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Attempts made for a single page before giving up.
const FETCH_ATTEMPTS: u32 = 3;

/// Build the HTTP client shared by every scraper.
pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(15))
        .connect_timeout(Duration::from_secs(10))
        .build()
}

/// GET a page as text, retrying timeouts and connection failures.
///
/// Waits 1s then 2s between attempts. HTTP error statuses are not retried.
#[instrument(level = "debug", skip(client))]
pub async fn get_text_with_retry(client: &Client, url: &str) -> Result<String, Box<dyn Error>> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let result = client.get(url).send().await.and_then(|r| r.error_for_status());
        match result {
            Ok(resp) => return Ok(resp.text().await?),
            Err(e) if (e.is_timeout() || e.is_connect()) && attempt < FETCH_ATTEMPTS => {
                let delay = Duration::from_secs(1 << (attempt - 1));
                warn!(%url, attempt, ?delay, error = %e, "Fetch failed; retrying");
                sleep(delay).await;
            }
            Err(e) => return Err(Box::new(e)),
        }
    }
}

/// Sleep between requests to the same family of hosts.
pub async fn pause(delay_ms: u64) {
    if delay_ms > 0 {
        sleep(Duration::from_millis(delay_ms)).await;
    }
}
