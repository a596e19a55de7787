//! Heuristic claim filtering.
//!
//! Decides which indexed stories carry a statement by a known politician
//! that is specific enough to verify, and pulls out the sentence or
//! quotation to check. Everything here is stateless keyword and regex work
//! driven by the vocabulary in [`Config`].
//!
//! # Scoring
//!
//! | Signal | Points |
//! |--------|--------|
//! | quoted speech | 2 |
//! | number with a unit (`10%`, `3조`, `5만 명`) | 2 |
//! | factual keyword (`역대`, `최저`, `증가` …) | 1 |
//! | speech marker (`말했다`, `주장` …) | 1 |
//!
//! Strict mode needs 3 points including a numeric or factual signal;
//! lenient mode, used for forced runs, needs 2.

use crate::config::{Config, Politician};
use crate::models::{RawArticle, Statement};
use crate::utils::{collapse_whitespace, truncate_chars};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, instrument};

/// Paired quotations: `“…”`, `"…"` or `‘…’`.
///
/// Each alternative is matched whole, left to right, so a closing `"` can
/// never open the next quotation. Length limits are applied afterwards.
static QUOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"“([^“”]+)”|"([^"]+)"|‘([^‘’]+)’"#).unwrap());

const MIN_QUOTE_CHARS: usize = 8;
const MAX_QUOTE_CHARS: usize = 200;

/// A number followed by a unit reporters use for statistics and money.
static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d[\d,]*(?:\.\d+)?\s*(?:%p|%|％|퍼센트|포인트|배|조|억|만|천|명|개|건|위|달러|원|가구|곳)")
        .unwrap()
});

/// Sentence boundaries: terminal punctuation followed by whitespace.
static SENTENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?。]\s+").unwrap());

/// Longest claim handed to the model.
const MAX_CLAIM_CHARS: usize = 300;

/// How strict the filter is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Strict,
    Lenient,
}

/// Signals found in a piece of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    pub quote: bool,
    pub numeric: bool,
    pub factual: bool,
    pub speech: bool,
}

impl Signals {
    pub fn score(&self) -> u32 {
        2 * u32::from(self.quote)
            + 2 * u32::from(self.numeric)
            + u32::from(self.factual)
            + u32::from(self.speech)
    }

    /// Whether the text asserts something measurable.
    pub fn checkable(&self) -> bool {
        self.numeric || self.factual
    }

    pub fn passes(&self, mode: FilterMode) -> bool {
        match mode {
            FilterMode::Strict => self.score() >= 3 && self.checkable(),
            FilterMode::Lenient => self.score() >= 2,
        }
    }
}

/// Stateless claim filter over a [`Config`]'s vocabulary.
#[derive(Debug)]
pub struct ClaimFilter<'a> {
    config: &'a Config,
    party_names: Vec<&'a str>,
}

impl<'a> ClaimFilter<'a> {
    pub fn new(config: &'a Config) -> Self {
        let mut party_names = config.party_names();
        // Longest first so "조국혁신당" is blanked before any shorter overlap.
        party_names.sort_by_key(|p| std::cmp::Reverse(p.chars().count()));
        Self {
            config,
            party_names,
        }
    }

    /// The politician named earliest in `text`.
    ///
    /// Party names are blanked first so a name that is also part of a party
    /// name (조국 / 조국혁신당) only matches when used on its own.
    pub fn detect_politician(&self, text: &str) -> Option<&'a Politician> {
        let mut scrubbed = text.to_string();
        for party in &self.party_names {
            if !party.is_empty() {
                scrubbed = scrubbed.replace(*party, &" ".repeat(party.len()));
            }
        }
        self.config
            .politicians
            .iter()
            .filter(|p| !p.name.is_empty())
            .filter_map(|p| scrubbed.find(&p.name).map(|pos| (pos, p)))
            .min_by_key(|(pos, p)| (*pos, std::cmp::Reverse(p.name.len())))
            .map(|(_, p)| p)
    }

    pub fn is_excluded(&self, text: &str) -> bool {
        self.config
            .exclude_keywords
            .iter()
            .any(|k| !k.is_empty() && text.contains(k.as_str()))
    }

    pub fn signals(&self, text: &str) -> Signals {
        Signals {
            quote: !extract_quotes(text).is_empty(),
            numeric: has_numeric_claim(text),
            factual: contains_any(text, &self.config.claim_keywords),
            speech: contains_any(text, &self.config.speech_markers),
        }
    }

    /// Pick the text to verify from a story.
    ///
    /// Preference order: a quotation with a checkable signal, any quotation,
    /// the first sentence of the body with a checkable signal that mentions
    /// `politician`, then the headline.
    pub fn extract_claim(&self, title: &str, content: &str, politician: &str) -> String {
        let quotes: Vec<String> = extract_quotes(title)
            .into_iter()
            .chain(extract_quotes(content))
            .collect();

        let claim = quotes
            .iter()
            .find(|q| self.signals(q).checkable())
            .or_else(|| quotes.first())
            .cloned()
            .or_else(|| {
                split_sentences(content).into_iter().find(|s| {
                    (politician.is_empty() || s.contains(politician)) && self.signals(s).checkable()
                })
            })
            .unwrap_or_else(|| title.to_string());

        truncate_chars(&collapse_whitespace(&claim), MAX_CLAIM_CHARS)
    }

    /// Turn one story into a statement if it passes the filter.
    pub fn evaluate(&self, article: &RawArticle, mode: FilterMode) -> Option<Statement> {
        let text = format!("{} {}", article.title, article.content);
        if self.is_excluded(&article.title) {
            debug!(title = %article.title, "Excluded by keyword");
            return None;
        }
        let politician = self.detect_politician(&text)?;
        let signals = self.signals(&text);
        if !signals.passes(mode) {
            debug!(title = %article.title, score = signals.score(), ?mode, "Below claim threshold");
            return None;
        }

        Some(Statement {
            title: article.title.clone(),
            url: article.url.clone(),
            source: article.source.clone(),
            content: article.content.clone(),
            politician: politician.name.clone(),
            party: politician.party.clone(),
            claim: self.extract_claim(&article.title, &article.content, &politician.name),
        })
    }

    /// Filter stories into statements, preserving input order.
    #[instrument(level = "info", skip_all, fields(candidates = articles.len(), mode = ?mode))]
    pub fn filter_statements(&self, articles: &[RawArticle], mode: FilterMode) -> Vec<Statement> {
        let statements: Vec<Statement> = articles
            .iter()
            .filter_map(|a| self.evaluate(a, mode))
            .collect();
        info!(count = statements.len(), "Statements passed claim filter");
        statements
    }
}

fn contains_any(text: &str, words: &[String]) -> bool {
    words.iter().any(|w| !w.is_empty() && text.contains(w.as_str()))
}

/// Quoted spans of 8 to 200 characters, in order of appearance.
pub fn extract_quotes(text: &str) -> Vec<String> {
    QUOTE_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|q| (MIN_QUOTE_CHARS..=MAX_QUOTE_CHARS).contains(&q.chars().count()))
        .collect()
}

/// Whether the text contains a number with a statistical or monetary unit.
pub fn has_numeric_claim(text: &str) -> bool {
    NUMERIC_RE.is_match(text)
}

/// Split prose into trimmed, non-empty sentences.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_RE.find_iter(text) {
        let punct_len = text[m.start()..].chars().next().map_or(1, char::len_utf8);
        let sentence = text[start..m.start() + punct_len].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        start = m.end();
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, content: &str) -> RawArticle {
        RawArticle {
            title: title.to_string(),
            url: format!("https://news.example.kr/{}", title.len()),
            source: "테스트".to_string(),
            content: content.to_string(),
            published: None,
        }
    }

    #[test]
    fn test_extract_quotes_variants() {
        let text = r#"그는 “청년 실업률이 역대 최고다”라고 했고 ‘예산을 절반으로 줄였다’고도 했다. "짧음""#;
        let quotes = extract_quotes(text);
        assert_eq!(
            quotes,
            vec!["청년 실업률이 역대 최고다".to_string(), "예산을 절반으로 줄였다".to_string()]
        );
    }

    #[test]
    fn test_adjacent_short_quotes_do_not_pair_across() {
        let text = r#"한동훈 "안 된다" 발언에 민주당 반발, 이재명 "좋다""#;
        assert!(extract_quotes(text).is_empty());

        let text = r#"한동훈 "안 된다" 하자 이재명 "세수가 30조 부족하다""#;
        assert_eq!(extract_quotes(text), vec!["세수가 30조 부족하다".to_string()]);
    }

    #[test]
    fn test_overlong_quotes_are_ignored() {
        let text = format!("\"{}\"", "가".repeat(MAX_QUOTE_CHARS + 1));
        assert!(extract_quotes(&text).is_empty());
    }

    #[test]
    fn test_short_quotes_are_ignored() {
        assert!(extract_quotes("‘尹 탄핵’ 공방").is_empty());
    }

    #[test]
    fn test_numeric_claims() {
        assert!(has_numeric_claim("국가부채 50% 돌파"));
        assert!(has_numeric_claim("세수 30조 부족"));
        assert!(has_numeric_claim("1,200명이 참석"));
        assert!(has_numeric_claim("지지율 3.5%p 하락"));
        assert!(!has_numeric_claim("오늘 회의가 열렸다"));
        assert!(!has_numeric_claim("22대 국회"));
        assert!(!has_numeric_claim("2025년 신년 기자회견"));
    }

    #[test]
    fn test_detect_politician_earliest_wins() {
        let config = Config::default();
        let filter = ClaimFilter::new(&config);
        let p = filter.detect_politician("한동훈 대표가 이재명 대통령을 비판").unwrap();
        assert_eq!(p.name, "한동훈");
        assert_eq!(p.party, "국민의힘");
    }

    #[test]
    fn test_detect_politician_ignores_party_names() {
        let config = Config::default();
        let filter = ClaimFilter::new(&config);
        assert!(filter.detect_politician("조국혁신당 원내 회의").is_none());
        let p = filter.detect_politician("조국혁신당 조국 대표는").unwrap();
        assert_eq!(p.name, "조국");
        assert_eq!(p.party, "조국혁신당");
    }

    #[test]
    fn test_signals_and_modes() {
        let config = Config::default();
        let filter = ClaimFilter::new(&config);

        let strong = filter.signals(r#"이재명 "실업률 10% 넘었다"고 말했다"#);
        assert!(strong.quote && strong.numeric && strong.speech);
        assert_eq!(strong.score(), 5);
        assert!(strong.passes(FilterMode::Strict));

        let speech_only = filter.signals(r#"한동훈 "우리가 반드시 이긴다"고 말했다"#);
        assert_eq!(speech_only.score(), 3);
        assert!(!speech_only.passes(FilterMode::Strict));
        assert!(speech_only.passes(FilterMode::Lenient));

        let dated = filter.signals("이재명, 2025년 신년 기자회견서 말했다");
        assert!(!dated.numeric);
        assert!(!dated.passes(FilterMode::Strict));

        let bare = filter.signals("한동훈 대표 지역 방문");
        assert!(!bare.passes(FilterMode::Lenient));
    }

    #[test]
    fn test_extract_claim_prefers_checkable_quote() {
        let config = Config::default();
        let filter = ClaimFilter::new(&config);
        let claim = filter.extract_claim(
            r#"이준석 "정말 한심한 정부다""#,
            r#"그는 "최저임금 인상률이 역대 최저"라고 덧붙였다."#,
            "이준석",
        );
        assert_eq!(claim, "최저임금 인상률이 역대 최저");
    }

    #[test]
    fn test_extract_claim_falls_back_to_sentence_then_title() {
        let config = Config::default();
        let filter = ClaimFilter::new(&config);
        let claim = filter.extract_claim(
            "김문수, 일자리 정책 발표",
            "행사가 열렸다. 김문수 후보는 일자리가 30만 개 늘었다고 밝혔다. 다른 문장.",
            "김문수",
        );
        assert_eq!(claim, "김문수 후보는 일자리가 30만 개 늘었다고 밝혔다.");

        let claim = filter.extract_claim("김문수, 시장 방문", "행사가 열렸다.", "김문수");
        assert_eq!(claim, "김문수, 시장 방문");
    }

    #[test]
    fn test_filter_statements() {
        let config = Config::default();
        let filter = ClaimFilter::new(&config);
        let articles = vec![
            article(r#"이재명 "국가부채 50% 넘었다""#, "대표는 기자회견에서 말했다."),
            article("[포토] 한동훈 대표 30만 명 앞 연설", "사진 설명"),
            article("날씨가 맑다", "전국 30% 강수 확률"),
            article("권성동 원내대표 회동", "별다른 발언은 없었다."),
        ];

        let statements = filter.filter_statements(&articles, FilterMode::Strict);
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].politician, "이재명");
        assert_eq!(statements[0].party, "더불어민주당");
        assert_eq!(statements[0].claim, "국가부채 50% 넘었다");
    }

    #[test]
    fn test_split_sentences() {
        assert_eq!(
            split_sentences("첫 문장. 둘째 문장! 마지막"),
            vec!["첫 문장.", "둘째 문장!", "마지막"]
        );
        assert_eq!(split_sentences("첫째。 둘째"), vec!["첫째。", "둘째"]);
        assert!(split_sentences("   ").is_empty());
    }
}
