//! On-disk JSON cache of news search results.
//!
//! The search API has a small daily quota, so results are kept per query with
//! the time they were fetched. Entries older than the TTL are ignored. A
//! missing or corrupt cache file is treated as empty.

use crate::scrapers::search::SearchItem;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheEntry {
    pub fetched_at: DateTime<Utc>,
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SearchCache {
    #[serde(skip)]
    path: Option<PathBuf>,
    #[serde(skip)]
    dirty: bool,
    entries: BTreeMap<String, CacheEntry>,
}

impl SearchCache {
    /// A cache that never reads or writes the filesystem.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Load the cache at `path`, starting empty if it is absent or unreadable.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Self {
        let mut cache = match fs::read_to_string(path).await {
            Ok(raw) => match serde_json::from_str::<SearchCache>(&raw) {
                Ok(cache) => {
                    info!(entries = cache.entries.len(), "Loaded search cache");
                    cache
                }
                Err(e) => {
                    warn!(error = %e, "Search cache is corrupt; starting empty");
                    SearchCache::default()
                }
            },
            Err(_) => SearchCache::default(),
        };
        cache.path = Some(path.to_path_buf());
        cache
    }

    /// Cached items for `query` if they are younger than `ttl`.
    pub fn get(&self, query: &str, ttl: Duration, now: DateTime<Utc>) -> Option<&[SearchItem]> {
        self.entries
            .get(query)
            .filter(|entry| now - entry.fetched_at < ttl)
            .map(|entry| entry.items.as_slice())
    }

    pub fn put(&mut self, query: &str, items: Vec<SearchItem>, now: DateTime<Utc>) {
        self.entries.insert(
            query.to_string(),
            CacheEntry {
                fetched_at: now,
                items,
            },
        );
        self.dirty = true;
    }

    /// Drop entries past `ttl` so the file does not grow without bound.
    pub fn evict_expired(&mut self, ttl: Duration, now: DateTime<Utc>) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| now - entry.fetched_at < ttl);
        if self.entries.len() != before {
            self.dirty = true;
        }
    }

    /// Write the cache back if anything changed.
    #[instrument(level = "info", skip_all)]
    pub async fn save(&mut self) -> Result<(), Box<dyn Error>> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&*self)?;
        fs::write(path, json).await?;
        self.dirty = false;
        info!(path = %path.display(), entries = self.entries.len(), "Saved search cache");
        Ok(())
    }
}
