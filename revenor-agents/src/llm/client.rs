//! HTTP client for the OpenAI chat completions API.
//!
//! One completion per review batch, strict JSON output, bounded retry on
//! transient errors. The wall-clock budget comes from configuration and is
//! applied as the request timeout.

use crate::llm::types::{
    ApiErrorResponse, ChatMessage, ChatRequest, ChatResponse, ResponseFormat, ResponseStatus,
};
use anyhow::{anyhow, bail, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

const API_BASE_URL: &str = "https://api.openai.com/v1";

/// A single chat completion together with the provider's response id
#[derive(Debug, Clone)]
pub struct Completion {
    pub response_id: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    model: String,
    max_retries: u32,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str, model: String, timeout: Duration, max_retries: u32) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| anyhow!("invalid API key header value: {e}"))?;
        auth.set_sensitive(true);
        headers.insert("authorization", auth);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            model,
            max_retries,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL, e.g. for an API-compatible proxy
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Run one strict-JSON completion. Transient errors (429, 500, 503) are
    /// retried up to `max_retries` times with a short delay; semantic
    /// problems in the reply are the caller's to handle.
    pub async fn complete_json(&self, system: &str, user: &str) -> Result<Completion> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
            temperature: 0.0,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying completion after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self.client.post(&url).json(&request).send().await?;
            let status = response.status();
            debug!(status = %status, attempt, "completion response received");

            if status.is_success() {
                let body: ChatResponse = response.json().await?;
                let content = body
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .ok_or_else(|| anyhow!("completion carried no content"))?;
                return Ok(Completion {
                    response_id: body.id,
                    content,
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(anyhow!("API returned {status}: {body}"));
                continue;
            }

            if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
                bail!(
                    "OpenAI API error ({}): {}",
                    api_err.error.error_type.unwrap_or_default(),
                    api_err.error.message
                );
            }
            bail!("API returned {status}: {body}");
        }

        Err(last_error.unwrap_or_else(|| anyhow!("completion retries exhausted")))
    }

    /// Best-effort status probe for a previously issued response id.
    /// Returns the provider's status string, e.g. "completed" or "failed".
    pub async fn response_status(&self, response_id: &str) -> Result<String> {
        let url = format!("{}/responses/{}", self.base_url, response_id);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            bail!("status probe returned {status}");
        }
        let body: ResponseStatus = response.json().await?;
        Ok(body.status)
    }
}

fn is_transient(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}
