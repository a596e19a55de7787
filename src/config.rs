//! Run configuration: news sources, politician roster and filter vocabulary.
//!
//! Everything has a built-in default so the tool runs without a config file.
//! A YAML file only needs to name the fields it overrides:
//!
//! ```yaml
//! search_queries: ["국회 발언 사실", "대표 주장 통계"]
//! request_delay_ms: 1500
//! politicians:
//!   - { name: "홍길동", party: "무소속" }
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// An RSS or Atom feed to index.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

/// An HTML index page scraped with CSS selectors.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SectionSource {
    pub name: String,
    pub url: String,
    /// Selector for each story container.
    pub item_selector: String,
    /// Selector (inside the item) for the headline text.
    pub title_selector: String,
    /// Selector (inside the item) for the element carrying `href`.
    pub link_selector: String,
    /// Stories kept from the top of the page.
    #[serde(default = "default_section_limit")]
    pub limit: usize,
}

/// A known politician and the party they belong to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Politician {
    pub name: String,
    pub party: String,
}

/// CSS classes used for a party's indicator dot and avatar.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PartyStyle {
    pub party: String,
    pub indicator_class: String,
    pub avatar_class: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub rss_feeds: Vec<FeedSource>,
    pub section_pages: Vec<SectionSource>,
    pub search_queries: Vec<String>,
    /// Results requested per search query.
    pub search_display: usize,
    pub politicians: Vec<Politician>,
    pub party_styles: Vec<PartyStyle>,
    /// Words that mark a verifiable factual claim (superlatives, trends).
    pub claim_keywords: Vec<String>,
    /// Verbs reporters use to attribute a statement.
    pub speech_markers: Vec<String>,
    /// Stories containing any of these are never checked.
    pub exclude_keywords: Vec<String>,
    /// Upper bound on candidates whose article body is fetched.
    pub max_candidates: usize,
    pub request_delay_ms: u64,
    pub llm_delay_ms: u64,
    pub temperature: f32,
    pub cache_ttl_minutes: i64,
}

fn default_section_limit() -> usize {
    5
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        let politicians = [
            ("이재명", "더불어민주당"),
            ("정청래", "더불어민주당"),
            ("박찬대", "더불어민주당"),
            ("김민석", "더불어민주당"),
            ("한동훈", "국민의힘"),
            ("김문수", "국민의힘"),
            ("장동혁", "국민의힘"),
            ("권성동", "국민의힘"),
            ("송언석", "국민의힘"),
            ("나경원", "국민의힘"),
            ("이준석", "개혁신당"),
            ("천하람", "개혁신당"),
            ("조국", "조국혁신당"),
            ("김선민", "조국혁신당"),
        ]
        .into_iter()
        .map(|(name, party)| Politician {
            name: name.to_string(),
            party: party.to_string(),
        })
        .collect();

        let party_styles = [
            ("더불어민주당", "democrat"),
            ("국민의힘", "ppp"),
            ("개혁신당", "reform"),
            ("조국혁신당", "choi"),
        ]
        .into_iter()
        .map(|(party, prefix)| PartyStyle {
            party: party.to_string(),
            indicator_class: format!("{prefix}-indicator"),
            avatar_class: format!("{prefix}-avatar"),
        })
        .collect();

        Self {
            rss_feeds: vec![
                FeedSource {
                    name: "연합뉴스".to_string(),
                    url: "https://www.yna.co.kr/rss/politics.xml".to_string(),
                },
                FeedSource {
                    name: "한겨레".to_string(),
                    url: "https://www.hani.co.kr/rss/politics/".to_string(),
                },
                FeedSource {
                    name: "경향신문".to_string(),
                    url: "https://www.khan.co.kr/rss/rssdata/politic_news.xml".to_string(),
                },
                FeedSource {
                    name: "동아일보".to_string(),
                    url: "https://rss.donga.com/politics.xml".to_string(),
                },
            ],
            section_pages: vec![
                SectionSource {
                    name: "연합뉴스 정치".to_string(),
                    url: "https://www.yna.co.kr/politics".to_string(),
                    item_selector: ".item-box".to_string(),
                    title_selector: ".tit-news".to_string(),
                    link_selector: "a".to_string(),
                    limit: 5,
                },
                SectionSource {
                    name: "네이버 정치".to_string(),
                    url: "https://news.naver.com/main/main.naver?mode=LSD&mid=shm&sid1=100"
                        .to_string(),
                    item_selector: ".sh_item".to_string(),
                    title_selector: ".sh_text_headline".to_string(),
                    link_selector: ".sh_text_headline".to_string(),
                    limit: 5,
                },
            ],
            search_queries: strings(&[
                "정치인 발언 사실",
                "국회의원 주장 통계",
                "대표 발언 논란",
                "팩트체크 정치",
            ]),
            search_display: 20,
            politicians,
            party_styles,
            claim_keywords: strings(&[
                "역대", "최초", "최대", "최고", "최저", "최소", "유일", "증가", "감소", "늘었",
                "줄었", "급증", "급감", "통계", "수치", "사실", "허위", "거짓", "절반", "배로",
            ]),
            speech_markers: strings(&[
                "말했", "밝혔", "주장", "강조", "지적", "비판", "언급", "발언", "했다며",
                "라고", "이라며",
            ]),
            exclude_keywords: strings(&[
                "[포토]", "[사진]", "[영상]", "포토뉴스", "부고", "인사]", "날씨", "운세",
                "[게시판]", "[알림]",
            ]),
            max_candidates: 40,
            request_delay_ms: 1_000,
            llm_delay_ms: 2_000,
            temperature: 0.3,
            cache_ttl_minutes: 60,
        }
    }
}

impl Config {
    /// Look up the styling for a party; unknown parties get no classes.
    pub fn party_style(&self, party: &str) -> Option<&PartyStyle> {
        self.party_styles.iter().find(|s| s.party == party.trim())
    }

    /// Party names known to the config, from both the roster and the styles.
    pub fn party_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .party_styles
            .iter()
            .map(|s| s.party.as_str())
            .chain(self.politicians.iter().map(|p| p.party.as_str()))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Load the configuration from `path`, or the defaults when no path is given.
#[instrument(level = "info")]
pub async fn load_config(path: Option<&str>) -> Result<Config, Box<dyn Error>> {
    let Some(path) = path else {
        info!("No config file given; using built-in defaults");
        return Ok(Config::default());
    };

    if !Path::new(path).exists() {
        return Err(format!("config file {path} does not exist").into());
    }
    let raw = fs::read_to_string(path).await?;
    let config = parse_config(&raw)?;
    info!(
        feeds = config.rss_feeds.len(),
        sections = config.section_pages.len(),
        queries = config.search_queries.len(),
        politicians = config.politicians.len(),
        "Loaded configuration"
    );
    Ok(config)
}

/// Parse YAML text, filling absent fields from [`Config::default`].
pub fn parse_config(raw: &str) -> Result<Config, serde_yaml::Error> {
    if raw.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(raw)
}
