//! Chat-completion client with exponential backoff.
//!
//! - [`AskAsync`]: send a prompt, get the model's text back
//! - [`OpenAiChat`]: `POST {base}/chat/completions` against an OpenAI-compatible API
//! - [`RetryAsk`]: decorator adding retries to any `AskAsync`
//!
//! # Retry Strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) between attempts

use crate::utils::truncate_for_log;
use rand::{rng, Rng};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Trait for async LLM interaction.
///
/// Implemented by the HTTP client and by decorators such as [`RetryAsk`];
/// tests substitute scripted implementations.
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send a user prompt and receive the model's reply.
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
///
/// # Backoff Strategy
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    /// The underlying LLM client to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// Create a new retry wrapper around an existing [`AskAsync`] implementation.
    ///
    /// ```ignore
    /// let api = RetryAsk::new(&chat, 5, Duration::from_secs(1));
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    /// Override the delay cap.
    pub fn with_max_delay(mut self, max_delay: StdDuration) -> Self {
        self.max_delay = max_delay;
        self
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}


impl<T> AskAsync for &T
where
    T: AskAsync,
{
    type Response = T::Response;

    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        (**self).ask(text).await
    }
}

const SYSTEM_PROMPT: &str = "You are a fact-checking expert for Korean political statements. \
Answer only with a single JSON object, written in Korean.";

/// Client for an OpenAI-compatible chat-completion endpoint.
///
/// Requests JSON-object output so the reply can be deserialized directly.
#[derive(Clone)]
pub struct OpenAiChat {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl fmt::Debug for OpenAiChat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiChat")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiChat {
    pub fn new(http: Client, base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature: 0.3,
        }
    }

    /// Build a client from `OPENAI_API_KEY`; a missing key aborts the run.
    pub fn from_env(http: Client, base_url: &str, model: &str) -> Result<Self, Box<dyn Error>> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or("OPENAI_API_KEY is not set")?;
        Ok(Self::new(http, base_url, &api_key, model))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }
}

/// Pull the first choice's text out of a chat-completion response body.
pub fn extract_content(body: &str) -> Result<String, Box<dyn Error>> {
    let parsed: ChatResponse = serde_json::from_str(body)?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or("chat completion returned no choices")?;
    if choice.finish_reason.as_deref() == Some("length") {
        warn!("Completion hit the token limit; reply may be truncated");
    }
    choice
        .message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| "chat completion returned empty content".into())
}

impl AskAsync for OpenAiChat {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.request_body(text))
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        let dt = t0.elapsed();

        if !status.is_success() {
            warn!(elapsed_ms = dt.as_millis() as u128, %status, "API call failed");
            return Err(format!(
                "chat completion failed with {status}: {}",
                truncate_for_log(&body, 300)
            )
            .into());
        }
        debug!(elapsed_ms = dt.as_millis() as u128, bytes = body.len(), "API call succeeded");
        extract_content(&body)
    }
}

/// Ask the model with exponential backoff retry logic.
///
/// Up to 5 retries, 1s, 2s, 4s, 8s, 16s apart (capped at 30s) plus jitter.
#[instrument(level = "info", skip_all)]
pub async fn ask_with_backoff<A>(api: &A, prompt: &str) -> Result<A::Response, Box<dyn Error>>
where
    A: AskAsync + fmt::Debug,
{
    let t0 = Instant::now();
    let api = RetryAsk::new(api, 5, StdDuration::from_secs(1));
    let res = api.ask(prompt).await;
    let dt = t0.elapsed();

    match &res {
        Ok(_) => info!(
            elapsed_ms_total = dt.as_millis() as u128,
            "ask_with_backoff succeeded"
        ),
        Err(e) => {
            error!(elapsed_ms_total = dt.as_millis() as u128, error = %e, "ask_with_backoff failed")
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Fails `failures` times, then answers with a fixed reply.
    #[derive(Debug)]
    struct Flaky {
        failures: usize,
        calls: Cell<usize>,
    }

    impl AskAsync for Flaky {
        type Response = String;

        async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>> {
            let n = self.calls.get() + 1;
            self.calls.set(n);
            if n <= self.failures {
                Err(format!("failure {n}").into())
            } else {
                Ok(format!("echo: {text}"))
            }
        }
    }

    fn chat() -> OpenAiChat {
        OpenAiChat::new(Client::new(), "https://api.example.com/v1/", "sk-test", "gpt-test")
    }

    #[tokio::test]
    async fn test_retry_recovers_after_failures() {
        let inner = Flaky {
            failures: 2,
            calls: Cell::new(0),
        };
        let api = RetryAsk::new(&inner, 3, StdDuration::from_millis(1))
            .with_max_delay(StdDuration::from_millis(2));
        let reply = api.ask("hi").await.unwrap();
        assert_eq!(reply, "echo: hi");
        assert_eq!(inner.calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let inner = Flaky {
            failures: usize::MAX,
            calls: Cell::new(0),
        };
        let api = RetryAsk::new(&inner, 1, StdDuration::from_millis(1));
        let err = api.ask("hi").await.unwrap_err();
        assert_eq!(err.to_string(), "failure 2");
        assert_eq!(inner.calls.get(), 2);
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        assert_eq!(chat().endpoint(), "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn test_request_body_shape() {
        let chat = chat().with_temperature(0.1);
        let body = serde_json::to_value(chat.request_body("발언을 검증하세요")).unwrap();
        assert_eq!(body["model"], "gpt-test");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "발언을 검증하세요");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!((body["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_extract_content() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"{\"a\":1}"},"finish_reason":"stop"}]}"#;
        assert_eq!(extract_content(body).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_extract_content_errors() {
        assert!(extract_content(r#"{"choices":[]}"#).is_err());
        assert!(extract_content(r#"{"choices":[{"message":{"content":null}}]}"#).is_err());
        assert!(extract_content("not json").is_err());
    }

    #[test]
    fn test_debug_hides_api_key() {
        assert!(!format!("{:?}", chat()).contains("sk-test"));
    }
}
