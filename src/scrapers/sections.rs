//! HTML section page scraper.
//!
//! Some outlets expose their politics desk only as an HTML index page
//! (Yonhap's `/politics`, Naver's politics section). Each page is described
//! in the config by a story selector plus title and link selectors scoped to
//! a story; relative links are resolved against the page URL.

use crate::config::SectionSource;
use crate::models::RawArticle;
use crate::scrapers::get_text_with_retry;
use crate::utils::collapse_whitespace;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use tracing::{debug, info, instrument};
use url::Url;

fn parse_selector(raw: &str) -> Result<Selector, Box<dyn Error>> {
    Selector::parse(raw).map_err(|e| format!("invalid selector {raw:?}: {e}").into())
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Extract up to `section.limit` stories from an index page.
pub fn parse_section(html: &str, section: &SectionSource) -> Result<Vec<RawArticle>, Box<dyn Error>> {
    let base = Url::parse(&section.url)?;
    let item_selector = parse_selector(&section.item_selector)?;
    let title_selector = parse_selector(&section.title_selector)?;
    let link_selector = parse_selector(&section.link_selector)?;

    let document = Html::parse_document(html);
    let mut articles = Vec::new();

    for item in document.select(&item_selector) {
        if articles.len() >= section.limit {
            break;
        }
        let title = item
            .select(&title_selector)
            .next()
            .map(element_text)
            .unwrap_or_default();
        let href = item
            .select(&link_selector)
            .find_map(|a| a.value().attr("href"));
        let Some(href) = href.filter(|_| !title.is_empty()) else {
            continue;
        };
        let Ok(resolved) = base.join(href.trim()) else {
            continue;
        };

        articles.push(RawArticle {
            title,
            url: resolved.to_string(),
            source: section.name.clone(),
            content: String::new(),
            published: None,
        });
    }

    Ok(articles)
}

/// Fetch and scrape one section page.
#[instrument(level = "info", skip(client, section), fields(section = %section.name))]
pub async fn index_section(
    client: &Client,
    section: &SectionSource,
) -> Result<Vec<RawArticle>, Box<dyn Error>> {
    let html = get_text_with_retry(client, &section.url).await?;
    let articles = parse_section(&html, section)?;
    info!(count = articles.len(), url = %section.url, "Indexed section page");
    debug!(urls = ?articles.iter().map(|a| &a.url).collect::<Vec<_>>(), "Section URLs");
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yonhap() -> SectionSource {
        SectionSource {
            name: "연합뉴스 정치".to_string(),
            url: "https://www.yna.co.kr/politics".to_string(),
            item_selector: ".item-box".to_string(),
            title_selector: ".tit-news".to_string(),
            link_selector: "a".to_string(),
            limit: 2,
        }
    }

    const PAGE: &str = r#"<html><body>
        <div class="item-box">
            <a href="/view/AKR1"><strong class="tit-news">  권성동 "세수 30조 부족"  </strong></a>
        </div>
        <div class="item-box">
            <a href="https://www.yna.co.kr/view/AKR2"><strong class="tit-news">이준석, 최저임금 발언</strong></a>
        </div>
        <div class="item-box">
            <a href="/view/AKR3"><strong class="tit-news">세 번째 기사</strong></a>
        </div>
    </body></html>"#;

    #[test]
    fn test_parse_section_resolves_and_limits() {
        let items = parse_section(PAGE, &yonhap()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "권성동 \"세수 30조 부족\"");
        assert_eq!(items[0].url, "https://www.yna.co.kr/view/AKR1");
        assert_eq!(items[1].url, "https://www.yna.co.kr/view/AKR2");
        assert_eq!(items[1].source, "연합뉴스 정치");
    }

    #[test]
    fn test_items_without_links_are_skipped() {
        let html = r#"<div class="item-box"><strong class="tit-news">링크 없음</strong></div>"#;
        let items = parse_section(html, &yonhap()).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let mut section = yonhap();
        section.item_selector = "div[".to_string();
        assert!(parse_section(PAGE, &section).is_err());
    }
}
