//! Fact-check card rendering.
//!
//! Produces the `falsehood-card` markup the page's stylesheet expects. All
//! text coming from articles or the model is HTML-escaped; URLs that are not
//! http(s) are dropped from the source list.

use crate::config::Config;
use crate::models::FactCheck;
use crate::utils::first_char_or;
use quick_xml::escape::escape;
use std::fmt::Write;

/// Render a single card.
pub fn render_card(fact_check: &FactCheck, config: &Config) -> String {
    let (indicator_class, avatar_class) = config
        .party_style(&fact_check.party)
        .map(|s| (s.indicator_class.as_str(), s.avatar_class.as_str()))
        .unwrap_or(("", ""));

    let party = escape(fact_check.party.trim());
    let politician = escape(fact_check.politician.trim());
    let initial = first_char_or(&fact_check.politician, '?').to_string();
    let verdict = fact_check.verification_result;

    let mut html = String::new();
    html.push_str("\n    <!-- 허위 발언 카드 -->\n");
    let _ = writeln!(
        html,
        r#"    <div class="falsehood-card" data-party="{party}" data-verdict="{}">"#,
        verdict.css_class()
    );
    html.push_str("        <div class=\"falsehood-header\">\n");
    let _ = writeln!(
        html,
        r#"            <div class="politician-avatar {avatar_class}">{}</div>"#,
        escape(&initial)
    );
    html.push_str("            <div class=\"politician-info\">\n");
    html.push_str("                <div class=\"politician-name\">\n");
    let _ = writeln!(
        html,
        r#"                    <span class="party-indicator {indicator_class}"></span>"#
    );
    let _ = writeln!(html, "                    {politician}");
    html.push_str("                </div>\n");
    let _ = writeln!(html, r#"                <div class="party-name-small">{party}</div>"#);
    html.push_str("            </div>\n");
    let _ = writeln!(
        html,
        r#"            <div class="falsehood-date">{}</div>"#,
        escape(&fact_check.date)
    );
    html.push_str("        </div>\n");
    let _ = writeln!(
        html,
        r#"        <div class="falsehood-source"><i class="fas fa-bullhorn"></i> {}</div>"#,
        escape(&fact_check.context)
    );
    let _ = writeln!(
        html,
        r#"        <div class="falsehood-content">{}</div>"#,
        escape(&fact_check.statement)
    );
    let _ = writeln!(
        html,
        r#"        <div class="falsehood-verdict verdict-{}">{}</div>"#,
        verdict.css_class(),
        verdict.label()
    );
    html.push_str("        <div class=\"falsehood-correction\">\n");
    html.push_str("            <span class=\"correction-label\">실제 사실:</span>\n");
    let _ = writeln!(html, "            {}", escape(&fact_check.explanation));
    html.push_str("        </div>\n");

    let links: Vec<&str> = fact_check
        .sources
        .iter()
        .map(|s| s.trim())
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .collect();
    if !links.is_empty() {
        html.push_str("        <div class=\"falsehood-sources\">\n");
        for (i, url) in links.iter().enumerate() {
            let _ = writeln!(
                html,
                r#"            <a href="{}" target="_blank" rel="noopener noreferrer">출처 {}</a>"#,
                escape(*url),
                i + 1
            );
        }
        html.push_str("        </div>\n");
    }

    html.push_str("    </div>\n");
    html
}

/// Render cards in order, concatenated.
pub fn render_cards(fact_checks: &[FactCheck], config: &Config) -> String {
    fact_checks
        .iter()
        .map(|fc| render_card(fc, config))
        .collect()
}
