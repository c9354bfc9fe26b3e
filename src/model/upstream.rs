use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::model::{ChatMessage, Completion};

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const MAX_TOKENS: u32 = 2048;
pub const TEMPERATURE: f32 = 0.7;
const CLIENT_TITLE: &str = "RicoAI";

/// Result of asking one model for a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(Completion),
    /// Recoverable; the caller may move on to another model.
    Failure(String),
    /// The upstream rejected our credentials. No other model will fare better.
    Unauthorized,
}

/// One upstream chat-completion call for a single model.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> AttemptOutcome;
}

#[derive(Serialize)]
struct CompletionPayload<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

/// OpenRouter (or any OpenAI-compatible) chat-completion client.
pub struct OpenRouterClient {
    endpoint: String,
    client: Client,
}

impl OpenRouterClient {
    pub fn new(endpoint: impl Into<String>, api_key: &str, site_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert("http-referer", HeaderValue::from_str(site_url)?);
        headers.insert("x-title", HeaderValue::from_static(CLIENT_TITLE));

        let endpoint = endpoint.into();
        info!("Using upstream chat endpoint: {}", endpoint);

        Ok(Self {
            endpoint,
            client: Client::builder().default_headers(headers).build()?,
        })
    }

    async fn send(&self, model: &str, messages: &[ChatMessage]) -> Result<AttemptOutcome> {
        let payload = CompletionPayload {
            model,
            messages,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self.client.post(&self.endpoint).json(&payload).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Ok(AttemptOutcome::Unauthorized);
        }

        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            debug!("Upstream error body for {}: {}", model, body);
            let reason = body["error"]["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("model {} failed ({})", model, status));
            return Ok(AttemptOutcome::Failure(reason));
        }

        let body: Value = response.json().await?;
        debug!("Upstream response for {}: {}", model, body);

        match extract_content(&body) {
            Some(content) => Ok(AttemptOutcome::Success(Completion {
                content: content.to_string(),
                model: model.to_string(),
            })),
            None => Ok(AttemptOutcome::Failure(format!(
                "model {} returned an empty response",
                model
            ))),
        }
    }
}

#[async_trait]
impl Upstream for OpenRouterClient {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> AttemptOutcome {
        match self.send(model, messages).await {
            Ok(outcome) => outcome,
            Err(e) => AttemptOutcome::Failure(format!("model {} request error: {}", model, e)),
        }
    }
}

/// Chat-style `message.content` first, then completion-style `text`.
fn extract_content(body: &Value) -> Option<&str> {
    let choice = body.get("choices").and_then(|choices| choices.get(0))?;
    [&choice["message"]["content"], &choice["text"]]
        .into_iter()
        .filter_map(Value::as_str)
        .find(|content| !content.trim().is_empty())
}
