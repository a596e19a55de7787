//! Data models for scraped stories, candidate statements and fact checks.
//!
//! - [`RawArticle`]: an indexed story before any filtering
//! - [`Statement`]: a story attributed to a politician with a checkable claim
//! - [`FactCheck`]: the LLM's verdict on a statement, ready to render
//! - [`RunReport`]: what a single run produced, for the optional JSON output

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A story as discovered by one of the scrapers.
#[derive(Debug, Clone, PartialEq)]
pub struct RawArticle {
    /// Headline with tags and entities removed.
    pub title: String,
    /// Absolute article URL.
    pub url: String,
    /// Human-readable name of the feed, page or query it came from.
    pub source: String,
    /// Description from the feed, or the fetched article body.
    pub content: String,
    pub published: Option<DateTime<FixedOffset>>,
}

/// A candidate statement that passed claim filtering.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Statement {
    pub title: String,
    pub url: String,
    pub source: String,
    pub content: String,
    pub politician: String,
    pub party: String,
    /// The sentence or quotation that will be checked.
    pub claim: String,
}

/// Verification outcome, ordered from true to false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Verdict {
    True,
    MostlyTrue,
    HalfTrue,
    MostlyFalse,
    False,
    #[default]
    Unverifiable,
}

impl Verdict {
    /// Korean label shown on the card.
    pub fn label(self) -> &'static str {
        match self {
            Verdict::True => "사실",
            Verdict::MostlyTrue => "대체로 사실",
            Verdict::HalfTrue => "절반의 사실",
            Verdict::MostlyFalse => "대체로 거짓",
            Verdict::False => "거짓",
            Verdict::Unverifiable => "판단 유보",
        }
    }

    /// CSS modifier used for the verdict badge.
    pub fn css_class(self) -> &'static str {
        match self {
            Verdict::True => "true",
            Verdict::MostlyTrue => "mostly-true",
            Verdict::HalfTrue => "half-true",
            Verdict::MostlyFalse => "mostly-false",
            Verdict::False => "false",
            Verdict::Unverifiable => "unverifiable",
        }
    }

    /// Whether a card for this verdict belongs on the falsehood board.
    pub fn is_falsehood(self) -> bool {
        matches!(self, Verdict::HalfTrue | Verdict::MostlyFalse | Verdict::False)
    }

    /// Map the free-form label an LLM answers with onto a verdict.
    ///
    /// Korean and English spellings are accepted. Negations ("사실과 다름",
    /// "not true") are checked first, then qualifiers, so neither "대체로 거짓"
    /// nor "사실이 아님" falls through to the bare words.
    pub fn from_label(raw: &str) -> Verdict {
        let s: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect();

        if s.is_empty() {
            return Verdict::Unverifiable;
        }
        let negated = ["사실과다", "사실이아", "사실아", "사실무근", "nottrue", "notaccurate", "inaccurate"]
            .iter()
            .any(|n| s.contains(n));
        if negated {
            return if s.contains("대체로") || s.contains("mostly") {
                Verdict::MostlyFalse
            } else {
                Verdict::False
            };
        }
        if s.contains("대체로사실") || s.contains("mostlytrue") {
            Verdict::MostlyTrue
        } else if s.contains("대체로거짓") || s.contains("mostlyfalse") {
            Verdict::MostlyFalse
        } else if s.contains("절반") || s.contains("halftrue") || s.contains("부분") || s.contains("partly") || s.contains("misleading") || s.contains("오해") {
            Verdict::HalfTrue
        } else if s.contains("판단유보") || s.contains("확인불가") || s.contains("unverifiable") || s.contains("unknown") || s.contains("검증불가") {
            Verdict::Unverifiable
        } else if s.contains("거짓") || s.contains("허위") || s.contains("false") || s.contains("untrue") {
            Verdict::False
        } else if s.contains("사실") || s.contains("true") {
            Verdict::True
        } else {
            Verdict::Unverifiable
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Verdict {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Verdict::from_label).unwrap_or(Verdict::Unverifiable))
    }
}

/// A finished fact check, one card on the page.
///
/// Field names follow the JSON the model is asked to return; `speaker` is
/// accepted as an alias for `politician`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FactCheck {
    #[serde(default, alias = "speaker")]
    pub politician: String,
    #[serde(default)]
    pub party: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub statement: String,
    #[serde(default)]
    pub verification_result: Verdict,
    #[serde(default)]
    pub explanation: String,
    /// Publication date on the card, `YYYY.MM.DD`.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Summary of one run, written when a JSON output directory is configured.
#[derive(Debug, Deserialize, Serialize)]
pub struct RunReport {
    pub local_date: String,
    pub local_time: String,
    pub forced: bool,
    pub candidates: usize,
    pub statements: usize,
    pub fact_checks: Vec<FactCheck>,
}
