//! RSS 2.0 and Atom feed indexing.
//!
//! Feeds are parsed with a streaming `quick-xml` reader; only the handful of
//! fields the pipeline uses are collected. Text is not trimmed while reading
//! because entity references split a text node into several events.
//!
//! Korean outlets frequently wrap titles and descriptions in CDATA and embed
//! markup inside them, so every text field goes through [`strip_tags`] after
//! parsing.

use crate::config::FeedSource;
use crate::models::RawArticle;
use crate::scrapers::get_text_with_retry;
use crate::utils::strip_tags;
use chrono::{DateTime, FixedOffset};
use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use std::error::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Title,
    Link,
    Description,
    Date,
}

#[derive(Debug, Default)]
struct PendingItem {
    title: String,
    link: String,
    description: String,
    date: String,
}

impl PendingItem {
    fn push(&mut self, field: Field, text: &str) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Description => &mut self.description,
            Field::Date => &mut self.date,
        };
        slot.push_str(text);
    }

    fn finish(self, source: &str) -> Option<RawArticle> {
        let title = strip_tags(&self.title);
        let url = self.link.trim().to_string();
        if title.is_empty() || url.is_empty() {
            return None;
        }
        Some(RawArticle {
            title,
            url,
            source: source.to_string(),
            content: strip_tags(&self.description),
            published: parse_feed_date(&self.date),
        })
    }
}

fn field_for(name: &[u8]) -> Option<Field> {
    match name {
        b"title" => Some(Field::Title),
        b"link" => Some(Field::Link),
        b"description" | b"summary" | b"content" => Some(Field::Description),
        b"pubDate" | b"date" | b"updated" | b"published" => Some(Field::Date),
        _ => None,
    }
}

/// Parse RFC 2822 (`pubDate`) or RFC 3339 (Atom, Dublin Core) timestamps.
pub fn parse_feed_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}

/// Parse an RSS or Atom document into articles attributed to `source`.
///
/// Items without a title or link are dropped. For Atom, the `href` of the
/// first `<link>` (preferring `rel="alternate"`) is used.
pub fn parse_feed(xml: &str, source: &str) -> Result<Vec<RawArticle>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);

    let mut articles = Vec::new();
    let mut item: Option<PendingItem> = None;
    let mut field: Option<Field> = None;
    // Open elements inside the current item; fields are only read at depth 1.
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if item.is_none() {
                    if matches!(e.local_name().as_ref(), b"item" | b"entry") {
                        item = Some(PendingItem::default());
                        field = None;
                        depth = 0;
                    }
                    continue;
                }
                let Some(current) = item.as_mut() else {
                    continue;
                };
                depth += 1;
                if depth != 1 {
                    continue;
                }
                field = field_for(e.local_name().as_ref());
                if field == Some(Field::Link) {
                    if let Some(href) = link_href(&e)? {
                        if current.link.is_empty() {
                            current.link = href;
                        }
                        field = None;
                    }
                }
            }
            Event::Empty(e) => {
                if let Some(current) = item.as_mut() {
                    if depth == 0 && e.local_name().as_ref() == b"link" && current.link.is_empty() {
                        if let Some(href) = link_href(&e)? {
                            current.link = href;
                        }
                    }
                }
            }
            Event::Text(t) => {
                if let (Some(current), Some(f), 1) = (item.as_mut(), field, depth) {
                    let raw = String::from_utf8_lossy(&t).into_owned();
                    let text = unescape(&raw).map(|c| c.into_owned()).unwrap_or(raw);
                    current.push(f, &text);
                }
            }
            Event::GeneralRef(r) => {
                if let (Some(current), Some(f), 1) = (item.as_mut(), field, depth) {
                    let entity = format!("&{};", String::from_utf8_lossy(&r));
                    let text = unescape(&entity).map(|c| c.into_owned()).unwrap_or(entity);
                    current.push(f, &text);
                }
            }
            Event::CData(c) => {
                if let (Some(current), Some(f), 1) = (item.as_mut(), field, depth) {
                    current.push(f, &String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                if item.is_none() {
                    continue;
                }
                if depth == 0 {
                    if let Some(done) = item.take() {
                        articles.extend(done.finish(source));
                    }
                    field = None;
                } else {
                    if depth == 1 {
                        field = None;
                    }
                    depth -= 1;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(articles)
}

/// `href` of an Atom `<link>`, ignoring non-alternate relations.
fn link_href(e: &quick_xml::events::BytesStart<'_>) -> Result<Option<String>, quick_xml::Error> {
    let mut href = None;
    let mut alternate = true;
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        match attr.key.local_name().as_ref() {
            b"href" => {
                let raw = String::from_utf8_lossy(&attr.value).into_owned();
                href = Some(unescape(&raw).map(|c| c.into_owned()).unwrap_or(raw));
            }
            b"rel" => alternate = attr.value.as_ref() == b"alternate",
            _ => {}
        }
    }
    Ok(href.filter(|_| alternate))
}

/// Fetch and parse one feed.
#[instrument(level = "info", skip(client, feed), fields(feed = %feed.name))]
pub async fn index_feed(client: &Client, feed: &FeedSource) -> Result<Vec<RawArticle>, Box<dyn Error>> {
    let xml = get_text_with_retry(client, &feed.url).await?;
    let articles = parse_feed(&xml, &feed.name)?;
    info!(count = articles.len(), url = %feed.url, "Indexed feed");
    debug!(titles = ?articles.iter().map(|a| &a.title).collect::<Vec<_>>(), "Feed titles");
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>정치 - 뉴스</title>
    <link>https://news.example.kr</link>
    <item>
      <title><![CDATA[이재명 "청년 실업률 10% 넘었다"]]></title>
      <link>https://news.example.kr/a/1</link>
      <description><![CDATA[<p>대표는 <b>청년 실업률</b>이 역대 최고라고 말했다.</p>]]></description>
      <pubDate>Tue, 06 May 2025 09:30:00 +0900</pubDate>
    </item>
    <item>
      <title>국민의힘 &amp; 정부 협의</title>
      <link>https://news.example.kr/a/2</link>
      <dc:date>2025-05-06T10:00:00+09:00</dc:date>
    </item>
    <item>
      <title>링크 없는 기사</title>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Politics</title>
  <link href="https://atom.example.kr/"/>
  <entry>
    <title>한동훈 "예산 3조 삭감"</title>
    <link rel="self" href="https://atom.example.kr/self/9"/>
    <link rel="alternate" href="https://atom.example.kr/9"/>
    <summary>요약 본문</summary>
    <updated>2025-05-06T01:02:03Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_items() {
        let items = parse_feed(RSS, "테스트").unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].title, "이재명 \"청년 실업률 10% 넘었다\"");
        assert_eq!(items[0].url, "https://news.example.kr/a/1");
        assert_eq!(items[0].content, "대표는 청년 실업률이 역대 최고라고 말했다.");
        assert_eq!(items[0].source, "테스트");
        assert!(items[0].published.is_some());

        assert_eq!(items[1].title, "국민의힘 & 정부 협의");
        assert!(items[1].content.is_empty());
        assert!(items[1].published.is_some());
    }

    #[test]
    fn test_channel_title_is_not_an_item() {
        let items = parse_feed(RSS, "테스트").unwrap();
        assert!(items.iter().all(|a| a.title != "정치 - 뉴스"));
    }

    #[test]
    fn test_parse_atom_entries() {
        let items = parse_feed(ATOM, "atom").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "한동훈 \"예산 3조 삭감\"");
        assert_eq!(items[0].url, "https://atom.example.kr/9");
        assert_eq!(items[0].content, "요약 본문");
    }

    #[test]
    fn test_nested_titles_and_links_are_ignored() {
        let rss = r#"<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <item>
      <title>이준석 "세수 30조 부족"</title>
      <media:content url="https://img.example.kr/1.jpg">
        <media:title>사진 설명</media:title>
      </media:content>
      <link>https://news.example.kr/a/7</link>
    </item>
  </channel>
</rss>"#;
        let items = parse_feed(rss, "테스트").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "이준석 \"세수 30조 부족\"");
        assert!(!items[0].content.contains("사진 설명"));

        let atom = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <source>
      <title>Upstream Feed</title>
      <link href="https://upstream.example.kr/"/>
    </source>
    <title>나경원 "예산 절반 삭감"</title>
    <link href="https://atom.example.kr/3"/>
  </entry>
</feed>"#;
        let items = parse_feed(atom, "atom").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "나경원 \"예산 절반 삭감\"");
        assert_eq!(items[0].url, "https://atom.example.kr/3");
    }

    #[test]
    fn test_parse_feed_date_formats() {
        assert!(parse_feed_date("Tue, 06 May 2025 09:30:00 +0900").is_some());
        assert!(parse_feed_date("2025-05-06T01:02:03Z").is_some());
        assert!(parse_feed_date("yesterday").is_none());
        assert!(parse_feed_date("").is_none());
    }

    #[test]
    fn test_malformed_feed_is_an_error() {
        assert!(parse_feed("<rss><channel><item></channel></rss>", "bad").is_err());
    }
}
