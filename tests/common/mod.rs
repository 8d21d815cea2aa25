// tests/common/mod.rs
// Shared test utilities and configuration

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use promptbrain::llm::LlmProvider;

/// A provider with no credential configured, used to exercise the `needs_setup`
/// path of the AI rewriter without making any network call.
pub struct UnconfiguredProvider;

#[async_trait]
impl LlmProvider for UnconfiguredProvider {
    async fn call(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _temperature: f32,
        _timeout: Duration,
    ) -> promptbrain::error::LlmResult<String> {
        Err(promptbrain::error::LlmError::Unauthorized)
    }
}

pub fn unconfigured_provider() -> Arc<dyn LlmProvider> {
    Arc::new(UnconfiguredProvider)
}
