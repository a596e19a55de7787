//! Command-line interface definitions.
//!
//! Every option can be given as a flag or through the environment, which is
//! how the tool is usually driven from a scheduled CI job.

use clap::{ArgAction, Parser};

/// Command-line arguments for a single fact-check run.
///
/// # Examples
///
/// ```sh
/// # Update ./index.html with up to three new cards
/// fact_check_cards --html ./index.html
///
/// # Forced run with a custom config and a JSON run report
/// FORCE_UPDATE=true fact_check_cards -c feeds.yaml -j ./reports
///
/// # Render cards without touching the page
/// fact_check_cards --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Page to splice fact-check cards into
    #[arg(long, env = "FACT_CHECK_HTML", default_value = "index.html")]
    pub html: String,

    /// Optional path to a YAML configuration file
    #[arg(short, long, env = "FACT_CHECK_CONFIG")]
    pub config: Option<String>,

    /// Optional output directory for the JSON run report
    #[arg(short, long, env = "FACT_CHECK_JSON_DIR")]
    pub json_output_dir: Option<String>,

    /// Location of the search result cache
    #[arg(long, env = "FACT_CHECK_CACHE", default_value = ".cache/search_cache.json")]
    pub cache_file: String,

    /// Do not read or write the search result cache
    #[arg(long)]
    pub no_cache: bool,

    /// Maximum number of cards generated per run
    #[arg(long, default_value_t = 3)]
    pub max_cards: usize,

    /// Chat model used for verification
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o")]
    pub model: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    /// Relax claim filtering, skip page dedupe and keep every verdict
    #[arg(
        long,
        env = "FORCE_UPDATE",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = parse_flag,
    )]
    pub force: bool,

    /// Render cards and log them without writing the page
    #[arg(long)]
    pub dry_run: bool,
}

/// Accept the loose boolean spellings CI environments tend to use.
fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "y" => Ok(true),
        "" | "0" | "false" | "no" | "off" | "n" => Ok(false),
        other => Err(format!("expected a boolean, got {other:?}")),
    }
}
