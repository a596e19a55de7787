//! Naver news search API client.
//!
//! Uses the Open API endpoint `v1/search/news.json`, authenticated with the
//! `NAVER_CLIENT_ID` / `NAVER_CLIENT_SECRET` headers. Titles and descriptions
//! come back with `<b>` highlighting and HTML entities, which are stripped.
//! Results go through the [`SearchCache`] so repeated runs within the TTL do
//! not spend quota.

use crate::models::RawArticle;
use crate::scrapers::cache::SearchCache;
use crate::utils::strip_tags;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use tracing::{debug, info, instrument};

const SEARCH_ENDPOINT: &str = "https://openapi.naver.com/v1/search/news.json";

/// Credentials for the search API.
#[derive(Clone)]
pub struct SearchCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for SearchCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl SearchCredentials {
    /// Read credentials from the environment; `None` if either is unset.
    pub fn from_env() -> Option<Self> {
        let client_id = std::env::var("NAVER_CLIENT_ID").ok()?;
        let client_secret = std::env::var("NAVER_CLIENT_SECRET").ok()?;
        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            return None;
        }
        Some(Self {
            client_id,
            client_secret,
        })
    }
}

/// One result as returned by the API.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SearchItem {
    pub title: String,
    /// Publisher's own URL; empty for some outlets.
    #[serde(default)]
    pub originallink: String,
    /// Naver-hosted URL.
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "pubDate")]
    pub pub_date: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

impl SearchItem {
    /// Convert into a [`RawArticle`], preferring the publisher's URL.
    pub fn into_article(self, query: &str) -> Option<RawArticle> {
        let url = if self.originallink.trim().is_empty() {
            self.link.trim().to_string()
        } else {
            self.originallink.trim().to_string()
        };
        let title = strip_tags(&self.title);
        if url.is_empty() || title.is_empty() {
            return None;
        }
        Some(RawArticle {
            title,
            url,
            source: format!("검색: {query}"),
            content: strip_tags(&self.description),
            published: DateTime::<FixedOffset>::parse_from_rfc2822(self.pub_date.trim()).ok(),
        })
    }
}

/// Parse a raw API response body.
pub fn parse_response(body: &str) -> Result<Vec<SearchItem>, serde_json::Error> {
    Ok(serde_json::from_str::<SearchResponse>(body)?.items)
}

/// Search for `query`, newest first.
#[instrument(level = "info", skip(client, credentials, display))]
pub async fn search_news(
    client: &Client,
    credentials: &SearchCredentials,
    query: &str,
    display: usize,
) -> Result<Vec<SearchItem>, Box<dyn Error>> {
    let url = format!(
        "{}?query={}&display={}&start=1&sort=date",
        SEARCH_ENDPOINT,
        urlencoding::encode(query),
        display.clamp(1, 100)
    );
    let body = client
        .get(&url)
        .header("X-Naver-Client-Id", &credentials.client_id)
        .header("X-Naver-Client-Secret", &credentials.client_secret)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let items = parse_response(&body)?;
    info!(count = items.len(), "Search returned results");
    Ok(items)
}

/// Search through the cache; a fresh entry avoids the network entirely.
#[instrument(level = "info", skip(client, credentials, cache, display))]
pub async fn search_cached(
    client: &Client,
    credentials: &SearchCredentials,
    cache: &mut SearchCache,
    query: &str,
    display: usize,
    ttl: Duration,
) -> Result<Vec<RawArticle>, Box<dyn Error>> {
    let now = Utc::now();
    let items = match cache.get(query, ttl, now) {
        Some(items) => {
            debug!(count = items.len(), "Search cache hit");
            items.to_vec()
        }
        None => {
            let items = search_news(client, credentials, query, display).await?;
            cache.put(query, items.clone(), now);
            items
        }
    };
    Ok(items
        .into_iter()
        .filter_map(|item| item.into_article(query))
        .collect())
}
