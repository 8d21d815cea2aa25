// src/llm/provider.rs
// Generic LLM provider trait — the thin `call_llm(system, user, temperature) -> text`
// abstraction named in SPEC_FULL.md §1/§6. Vendor framing stays outside this crate.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{LlmError, LlmResult};
use crate::utils::RateLimiter;

/// Abstract chat-completion call. Implementors own retries/backoff internally if desired;
/// callers are responsible for wrapping calls in cancellation-aware timeouts.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn call(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
        timeout: Duration,
    ) -> LlmResult<String>;
}

/// Default concrete provider: a generic chat-completion POST over `reqwest`.
/// Knows nothing about any particular vendor's request/response schema beyond
/// `{model, system, prompt, temperature, max_tokens} -> {text}` — a caller that
/// needs real vendor framing is expected to supply their own `LlmProvider`.
pub struct ReqwestLlmProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: usize,
    rate_limiter: Option<RateLimiter>,
}

impl ReqwestLlmProvider {
    pub fn new(endpoint: String, api_key: String, model: String, max_tokens: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
            max_tokens,
            rate_limiter: None,
        }
    }

    /// Pace outbound calls to this vendor's endpoint to a fixed requests-per-minute budget.
    pub fn with_rate_limit(mut self, requests_per_minute: u32) -> anyhow::Result<Self> {
        self.rate_limiter = Some(RateLimiter::new(requests_per_minute)?);
        Ok(self)
    }
}

#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    temperature: f32,
    max_tokens: usize,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    text: String,
}

#[async_trait]
impl LlmProvider for ReqwestLlmProvider {
    async fn call(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
        timeout: Duration,
    ) -> LlmResult<String> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::Unauthorized);
        }

        if let Some(limiter) = &self.rate_limiter {
            limiter
                .acquire()
                .await
                .map_err(|e| LlmError::Network(e.to_string()))?;
        }

        let body = ChatRequest {
            model: &self.model,
            system: system_prompt,
            prompt: user_prompt,
            temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(timeout)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LlmError::Unauthorized);
        }
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(LlmError::Network(format!("status {}", response.status())));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;

        Ok(parsed.text)
    }
}
