//! Claim verification: prompt construction and response handling.
//!
//! The model answers with one JSON object per statement. Fields it leaves
//! out are filled from the statement itself, and the article URL is always
//! attached as a source, so every [`FactCheck`] has every key set.

use crate::api::{ask_with_backoff, AskAsync};
use crate::models::{FactCheck, Statement, Verdict};
use crate::utils::{looks_truncated, truncate_chars, truncate_for_log};
use itertools::Itertools;
use std::fmt;
use tracing::{error, info, instrument, warn};

/// Article text included in the prompt for context.
const PROMPT_CONTEXT_CHARS: usize = 1500;

/// Longest explanation kept on a card.
const MAX_EXPLANATION_CHARS: usize = 400;

/// Build the verification prompt for one statement.
pub fn build_prompt(statement: &Statement) -> String {
    let context = truncate_chars(&statement.content, PROMPT_CONTEXT_CHARS);
    format!(
        r#"다음 정치인 발언의 사실 여부를 검증해주세요. 공개된 통계와 공식 자료를 기준으로 판단하고, 결과는 JSON 형식으로만 반환해주세요.

발언자: {politician} ({party})
발언: "{claim}"
기사 제목: {title}
출처: {url}
기사 내용: {context}

판정(verification_result)은 다음 중 하나로 답해주세요: "사실", "대체로 사실", "절반의 사실", "대체로 거짓", "거짓", "판단 유보"

다음 형식의 JSON으로 응답해주세요:
{{
    "politician": "발언자 이름",
    "party": "소속 정당",
    "context": "발언 상황 (언제, 어디서)",
    "statement": "검증 대상 발언",
    "verification_result": "판정",
    "explanation": "실제 사실에 대한 설명 (100-150자)",
    "sources": ["근거 자료 URL"]
}}"#,
        politician = statement.politician,
        party = statement.party,
        claim = statement.claim,
        title = statement.title,
        url = statement.url,
        context = context,
    )
}

/// Remove a surrounding Markdown code fence, if the model added one.
pub fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn or_fallback(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.trim().to_string()
    }
}

/// Deserialize a model reply and complete it from `statement`.
pub fn parse_fact_check(
    response: &str,
    statement: &Statement,
    date: &str,
) -> Result<FactCheck, serde_json::Error> {
    let parsed: FactCheck = serde_json::from_str(strip_code_fences(response))?;
    Ok(complete(parsed, statement, date))
}

fn complete(parsed: FactCheck, statement: &Statement, date: &str) -> FactCheck {
    let sources = std::iter::once(statement.url.clone())
        .chain(parsed.sources)
        .map(|s| s.trim().to_string())
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .unique()
        .collect();

    FactCheck {
        politician: or_fallback(parsed.politician, &statement.politician),
        party: or_fallback(parsed.party, &statement.party),
        context: or_fallback(parsed.context, &format!("{} 보도", statement.source)),
        statement: or_fallback(parsed.statement, &statement.claim),
        verification_result: parsed.verification_result,
        explanation: truncate_chars(
            &or_fallback(parsed.explanation, "검증 근거를 확인하지 못했습니다."),
            MAX_EXPLANATION_CHARS,
        ),
        date: or_fallback(parsed.date, date),
        sources,
    }
}

/// Placeholder used in forced runs when the model could not be reached.
pub fn fallback_fact_check(statement: &Statement, date: &str) -> FactCheck {
    FactCheck {
        politician: statement.politician.clone(),
        party: statement.party.clone(),
        context: format!("{} 보도", statement.source),
        statement: statement.claim.clone(),
        verification_result: Verdict::Unverifiable,
        explanation: "자동 검증에 실패하여 판단을 유보합니다. 원문 기사를 참고해주세요.".to_string(),
        date: date.to_string(),
        sources: vec![statement.url.clone()],
    }
}

/// Verify one statement.
///
/// A reply that fails to parse because it was cut short is re-asked once.
/// Any other failure yields `None`, or the placeholder when `forced`.
#[instrument(level = "info", skip_all, fields(politician = %statement.politician, url = %statement.url))]
pub async fn fact_check_statement<A>(
    api: &A,
    statement: &Statement,
    date: &str,
    forced: bool,
) -> Option<FactCheck>
where
    A: AskAsync<Response = String> + fmt::Debug,
{
    let prompt = build_prompt(statement);
    let fallback = || forced.then(|| fallback_fact_check(statement, date));

    let response = match ask_with_backoff(api, &prompt).await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "API call failed");
            return fallback();
        }
    };

    let mut parsed = parse_fact_check(&response, statement, date);
    if let Err(ref e) = parsed {
        if looks_truncated(e) {
            warn!(error = %e, "EOF while parsing; re-asking once");
            match ask_with_backoff(api, &prompt).await {
                Ok(r2) => parsed = parse_fact_check(&r2, statement, date),
                Err(e2) => warn!(error = %e2, "Re-ask failed"),
            }
        }
    }

    match parsed {
        Ok(fact_check) => {
            info!(verdict = %fact_check.verification_result, "Statement verified");
            Some(fact_check)
        }
        Err(e) => {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(&response, 300),
                "Model returned non-conforming JSON"
            );
            fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::error::Error;

    fn statement() -> Statement {
        Statement {
            title: "이재명 \"국가부채 50% 넘었다\"".to_string(),
            url: "https://news.example.kr/1".to_string(),
            source: "연합뉴스".to_string(),
            content: "대표는 기자회견에서 국가부채 비율이 50%를 넘었다고 말했다.".to_string(),
            politician: "이재명".to_string(),
            party: "더불어민주당".to_string(),
            claim: "국가부채 50% 넘었다".to_string(),
        }
    }

    /// Replies with queued answers in order; errors once the queue is empty.
    #[derive(Debug)]
    struct Scripted {
        replies: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: &[&str]) -> Self {
            let mut queue: Vec<String> = replies.iter().map(|r| r.to_string()).collect();
            queue.reverse();
            Self {
                replies: RefCell::new(queue),
            }
        }
    }

    impl AskAsync for Scripted {
        type Response = String;

        async fn ask(&self, _text: &str) -> Result<String, Box<dyn Error>> {
            self.replies
                .borrow_mut()
                .pop()
                .ok_or_else(|| "no scripted reply".into())
        }
    }

    #[test]
    fn test_build_prompt_mentions_statement() {
        let prompt = build_prompt(&statement());
        assert!(prompt.contains("발언: \"국가부채 50% 넘었다\""));
        assert!(prompt.contains("이재명 (더불어민주당)"));
        assert!(prompt.contains("https://news.example.kr/1"));
        assert!(prompt.contains("\"verification_result\""));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {}  "), "{}");
    }

    #[test]
    fn test_parse_fills_missing_fields() {
        let reply = r#"{
            "verification_result": "대체로 거짓",
            "explanation": "2024년 국가부채 비율은 47% 수준이다.",
            "sources": ["https://stats.example.kr/debt", "not a url", "https://news.example.kr/1"]
        }"#;
        let fc = parse_fact_check(reply, &statement(), "2025.05.06").unwrap();
        assert_eq!(fc.politician, "이재명");
        assert_eq!(fc.party, "더불어민주당");
        assert_eq!(fc.statement, "국가부채 50% 넘었다");
        assert_eq!(fc.context, "연합뉴스 보도");
        assert_eq!(fc.date, "2025.05.06");
        assert_eq!(fc.verification_result, Verdict::MostlyFalse);
        assert_eq!(
            fc.sources,
            vec![
                "https://news.example.kr/1".to_string(),
                "https://stats.example.kr/debt".to_string()
            ]
        );
    }

    #[test]
    fn test_parse_keeps_model_fields() {
        let reply = r#"```json
{"speaker": "이재명 대표", "party": "더불어민주당", "context": "5월 6일 기자회견", "statement": "국가부채가 50%를 넘었다", "verification_result": "거짓", "explanation": "사실과 다르다."}
```"#;
        let fc = parse_fact_check(reply, &statement(), "2025.05.06").unwrap();
        assert_eq!(fc.politician, "이재명 대표");
        assert_eq!(fc.context, "5월 6일 기자회견");
        assert_eq!(fc.verification_result, Verdict::False);
    }

    #[test]
    fn test_fallback_is_unverifiable() {
        let fc = fallback_fact_check(&statement(), "2025.05.06");
        assert_eq!(fc.verification_result, Verdict::Unverifiable);
        assert_eq!(fc.sources, vec!["https://news.example.kr/1".to_string()]);
    }

    #[tokio::test]
    async fn test_truncated_reply_is_reasked_once() {
        let api = Scripted::new(&[
            r#"{"verification_result": "거짓", "explanation": "잘린"#,
            r#"{"verification_result": "거짓", "explanation": "완전한 응답"}"#,
        ]);
        let fc = fact_check_statement(&api, &statement(), "2025.05.06", false)
            .await
            .unwrap();
        assert_eq!(fc.explanation, "완전한 응답");
    }

    #[tokio::test]
    async fn test_non_json_reply_yields_none_or_placeholder() {
        let api = Scripted::new(&["이건 JSON이 아닙니다"]);
        assert!(fact_check_statement(&api, &statement(), "2025.05.06", false).await.is_none());

        let api = Scripted::new(&["이건 JSON이 아닙니다"]);
        let fc = fact_check_statement(&api, &statement(), "2025.05.06", true)
            .await
            .unwrap();
        assert_eq!(fc.verification_result, Verdict::Unverifiable);
    }
}
