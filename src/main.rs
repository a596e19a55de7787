//! # Fact Check Cards
//!
//! Finds checkable statements by Korean politicians in the day's news,
//! verifies them with an OpenAI-compatible LLM, and publishes the ones that
//! turn out to be false or misleading as cards on a static HTML page.
//!
//! ## Features
//!
//! - Collects stories from politics RSS feeds, section index pages and the
//!   Naver news search API (with an on-disk result cache)
//! - Fetches article bodies for stories whose feed description is too thin
//! - Scores stories for quotations, figures and factual assertions and
//!   drops duplicates, including claims already on the page
//! - Verifies statements one at a time with exponential backoff
//! - Splices the resulting cards into the page after a marker comment and
//!   optionally writes a JSON run report
//!
//! ## Usage
//!
//! ```sh
//! OPENAI_API_KEY=... fact_check_cards --html ./index.html -j ./reports
//! ```
//!
//! ## Architecture
//!
//! 1. **Collecting**: index feeds, section pages and search results
//! 2. **Filtering**: keep stories that quote a politician making a checkable claim
//! 3. **Verifying**: ask the model for a verdict, sequentially with a delay
//! 4. **Output**: splice cards into the page and write the run report

use chrono::Local;
use clap::Parser;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use rand::rng;
use rand::seq::SliceRandom;
use reqwest::Client;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod claims;
mod cli;
mod config;
mod dedupe;
mod models;
mod outputs;
mod scrapers;
mod utils;
mod verify;

use api::{AskAsync, OpenAiChat};
use claims::{ClaimFilter, FilterMode};
use cli::Cli;
use config::Config;
use dedupe::Deduplicator;
use models::{FactCheck, RawArticle, RunReport, Statement};
use outputs::{cards, json, page};
use scrapers::cache::SearchCache;
use scrapers::search::SearchCredentials;
use scrapers::{article, pause, rss, search, sections};
use utils::card_date;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("fact_check_cards starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.html, ?args.config, ?args.json_output_dir, force = args.force, "Parsed CLI arguments");

    let config = config::load_config(args.config.as_deref()).await?;
    let http = scrapers::http_client()?;
    let llm = OpenAiChat::from_env(http.clone(), &args.openai_base_url, &args.model)
        .inspect_err(|e| error!(error = %e, "LLM credentials missing"))?
        .with_temperature(config.temperature);

    // Fail on an unusable page before spending any requests.
    let html_path = Path::new(&args.html);
    let page_content = page::read_page(html_path)
        .await
        .inspect_err(|e| error!(path = %args.html, error = %e, "Page cannot be updated"))?;

    if args.force {
        warn!("Forced run: lenient filtering, page dedupe off, all verdicts kept");
    }

    // ---- Collect candidates ----
    let candidates = collect_candidates(&http, &config, &args).await;
    info!(count = candidates.len(), "Total candidate stories");
    let total_candidates = candidates.len();

    // ---- Enrich thin descriptions ----
    let mut candidates = candidates;
    article::enrich_bodies(&http, &mut candidates, config.max_candidates, config.request_delay_ms).await;

    // ---- Filter and dedupe ----
    let published = if args.force {
        Vec::new()
    } else {
        page::published_claims(&page_content)
    };
    info!(published = published.len(), "Claims already on the page");
    let mut statements = select_statements(&config, &candidates, &published, args.force);
    info!(count = statements.len(), "Statements to verify");

    statements.shuffle(&mut rng());

    // ---- Verify ----
    let date = card_date();
    let fact_checks = verify_statements(&llm, &statements, &date, &config, &args).await;
    info!(
        verified = fact_checks.len(),
        max_cards = args.max_cards,
        "Completed verification"
    );

    // ---- Page update ----
    if fact_checks.is_empty() {
        info!("No cards to publish; page left unchanged");
    } else {
        let cards_html = cards::render_cards(&fact_checks, &config);
        if args.dry_run {
            info!(cards = %cards_html, "Rendered cards");
        }
        page::update_page(html_path, &cards_html, args.dry_run)
            .await
            .inspect_err(|e| error!(path = %args.html, error = %e, "Failed to update page"))?;
    }

    // ---- Run report ----
    if let Some(dir) = args.json_output_dir.as_deref() {
        let now = Local::now();
        let report = RunReport {
            local_date: now.date_naive().to_string(),
            local_time: now.format("%H:%M:%S").to_string(),
            forced: args.force,
            candidates: total_candidates,
            statements: statements.len(),
            fact_checks,
        };
        if let Err(e) = json::write_run_report(&report, Path::new(dir)).await {
            error!(error = %e, "Failed to write run report");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        elapsed_secs = elapsed.as_secs_f64(),
        "fact_check_cards completed"
    );

    Ok(())
}

/// Index every configured source, one request at a time.
///
/// Failed sources are logged and skipped. The result is deduplicated by URL,
/// keeping the first occurrence.
#[instrument(level = "info", skip_all)]
async fn collect_candidates(http: &Client, config: &Config, args: &Cli) -> Vec<RawArticle> {
    let delay = config.request_delay_ms;

    let from_feeds: Vec<Vec<RawArticle>> = stream::iter(&config.rss_feeds)
        .then(|feed| async move {
            let articles = rss::index_feed(http, feed).await.unwrap_or_else(|e| {
                warn!(feed = %feed.name, error = %e, "Feed failed; skipping");
                Vec::new()
            });
            pause(delay).await;
            articles
        })
        .collect()
        .await;

    let from_sections: Vec<Vec<RawArticle>> = stream::iter(&config.section_pages)
        .then(|section| async move {
            let articles = sections::index_section(http, section).await.unwrap_or_else(|e| {
                warn!(section = %section.name, error = %e, "Section page failed; skipping");
                Vec::new()
            });
            pause(delay).await;
            articles
        })
        .collect()
        .await;

    let from_search = collect_search(http, config, args).await;

    let feed_count: usize = from_feeds.iter().map(Vec::len).sum();
    let section_count: usize = from_sections.iter().map(Vec::len).sum();
    info!(
        feeds = feed_count,
        sections = section_count,
        search = from_search.len(),
        "Indexed all sources"
    );

    from_feeds
        .into_iter()
        .flatten()
        .chain(from_sections.into_iter().flatten())
        .chain(from_search)
        .filter(|a| !a.url.trim().is_empty())
        .unique_by(|a| a.url.trim().to_string())
        .collect()
}

/// Run the configured search queries through the result cache.
#[instrument(level = "info", skip_all, fields(queries = config.search_queries.len()))]
async fn collect_search(http: &Client, config: &Config, args: &Cli) -> Vec<RawArticle> {
    if config.search_queries.is_empty() {
        return Vec::new();
    }
    let Some(credentials) = SearchCredentials::from_env() else {
        warn!("NAVER_CLIENT_ID/NAVER_CLIENT_SECRET not set; skipping news search");
        return Vec::new();
    };

    let ttl = chrono::Duration::minutes(config.cache_ttl_minutes);
    let mut cache = if args.no_cache {
        SearchCache::disabled()
    } else {
        SearchCache::load(Path::new(&args.cache_file)).await
    };
    cache.evict_expired(ttl, chrono::Utc::now());

    let mut articles = Vec::new();
    for query in &config.search_queries {
        match search::search_cached(http, &credentials, &mut cache, query, config.search_display, ttl).await {
            Ok(found) => articles.extend(found),
            Err(e) => warn!(%query, error = %e, "Search failed; skipping query"),
        }
        pause(config.request_delay_ms).await;
    }

    if let Err(e) = cache.save().await {
        warn!(error = %e, "Failed to save search cache");
    }
    articles
}

/// Filter candidates into statements and drop duplicates.
///
/// Strict filtering is used unless `forced`. When nothing new survives the
/// strict filter and dedupe, the lenient filter is tried. `published`
/// claims count as already seen.
fn select_statements(
    config: &Config,
    candidates: &[RawArticle],
    published: &[String],
    forced: bool,
) -> Vec<Statement> {
    let filter = ClaimFilter::new(config);
    let unique = |mode: FilterMode| {
        let mut dedupe = Deduplicator::new();
        dedupe.seed_claims(published.iter().cloned());
        dedupe.retain_unique(filter.filter_statements(candidates, mode))
    };

    if forced {
        return unique(FilterMode::Lenient);
    }
    let strict = unique(FilterMode::Strict);
    if !strict.is_empty() {
        return strict;
    }
    info!("No new statements passed the strict filter; retrying leniently");
    unique(FilterMode::Lenient)
}

/// Whether a verdict earns a card on the page.
fn should_publish(fact_check: &FactCheck, forced: bool) -> bool {
    forced || fact_check.verification_result.is_falsehood()
}

/// Verify statements in order until `max_cards` publishable results exist.
#[instrument(level = "info", skip_all, fields(statements = statements.len()))]
async fn verify_statements<A>(
    api: &A,
    statements: &[Statement],
    date: &str,
    config: &Config,
    args: &Cli,
) -> Vec<FactCheck>
where
    A: AskAsync<Response = String> + std::fmt::Debug,
{
    let mut fact_checks = Vec::new();
    for (i, statement) in statements.iter().enumerate() {
        if fact_checks.len() >= args.max_cards {
            break;
        }
        if i > 0 {
            pause(config.llm_delay_ms).await;
        }

        let Some(fact_check) = verify::fact_check_statement(api, statement, date, args.force).await
        else {
            continue;
        };
        if should_publish(&fact_check, args.force) {
            fact_checks.push(fact_check);
        } else {
            info!(
                index = i,
                verdict = %fact_check.verification_result,
                "Verdict not published"
            );
        }
    }
    fact_checks
}
