//! Run-local duplicate suppression.
//!
//! The same quote usually reaches us through several outlets and through
//! both a feed and a search result, with slightly different headlines. A
//! statement is a duplicate when its URL, its normalized headline, or a
//! claim that is close enough to one already accepted has been seen.

use crate::models::Statement;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Leading or embedded desk tags such as `[속보]`, `(종합)`, `<인터뷰>`.
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]|\([^)]*\)|<[^>]*>|【[^】]*】").unwrap());

/// Claims at or above this bigram similarity are treated as the same claim.
pub const CLAIM_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Lowercased alphanumerics of a headline with desk tags removed.
pub fn normalize_title(title: &str) -> String {
    TAG_RE
        .replace_all(title, "")
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn bigrams(text: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = text
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Jaccard index of the character bigrams of `a` and `b`.
///
/// Identical strings score 1.0 even when too short to form a bigram.
pub fn similarity(a: &str, b: &str) -> f64 {
    let (ga, gb) = (bigrams(a), bigrams(b));
    if ga.is_empty() && gb.is_empty() {
        return if normalize_title(a) == normalize_title(b) { 1.0 } else { 0.0 };
    }
    let inter = ga.intersection(&gb).count() as f64;
    let union = ga.union(&gb).count() as f64;
    inter / union
}

/// Seen-sets for one run.
#[derive(Debug, Default)]
pub struct Deduplicator {
    urls: HashSet<String>,
    titles: HashSet<String>,
    claims: Vec<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat claims already on the page as seen.
    pub fn seed_claims<I>(&mut self, claims: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.claims.extend(claims.into_iter().filter(|c| !c.trim().is_empty()));
    }

    pub fn is_duplicate(&self, statement: &Statement) -> bool {
        if self.urls.contains(statement.url.trim()) {
            return true;
        }
        let title = normalize_title(&statement.title);
        if !title.is_empty() && self.titles.contains(&title) {
            return true;
        }
        self.claims
            .iter()
            .any(|seen| similarity(seen, &statement.claim) >= CLAIM_SIMILARITY_THRESHOLD)
    }

    /// Record `statement`; returns `false` if it was a duplicate.
    pub fn insert(&mut self, statement: &Statement) -> bool {
        if self.is_duplicate(statement) {
            debug!(url = %statement.url, claim = %statement.claim, "Duplicate statement");
            return false;
        }
        self.urls.insert(statement.url.trim().to_string());
        let title = normalize_title(&statement.title);
        if !title.is_empty() {
            self.titles.insert(title);
        }
        self.claims.push(statement.claim.clone());
        true
    }

    /// Keep the first occurrence of every distinct statement, in order.
    pub fn retain_unique(&mut self, statements: Vec<Statement>) -> Vec<Statement> {
        statements.into_iter().filter(|s| self.insert(s)).collect()
    }
}
