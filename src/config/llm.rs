// src/config/llm.rs
// LLM judge and AI-rewriter configuration

use serde::{Deserialize, Serialize};

use super::helpers::{env_bool, env_f32_list, env_or, env_u64, env_usize};

/// LLM-judge merge configuration (GOLDEN Evaluator §4.2)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmJudgeConfig {
    pub enabled: bool,
    pub model: String,
    pub cache_ttl_ms: u64,
    pub cache_capacity: usize,
    pub timeout_ms: u64,
}

impl LlmJudgeConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: env_bool("PROMPTBRAIN_LLM_JUDGE_ENABLED", false),
            model: env_or("PROMPTBRAIN_LLM_JUDGE_MODEL", "judge-default"),
            cache_ttl_ms: env_u64("PROMPTBRAIN_LLM_JUDGE_CACHE_TTL_MS", 3_600_000),
            cache_capacity: env_usize("PROMPTBRAIN_LLM_JUDGE_CACHE_CAPACITY", 100),
            timeout_ms: env_u64("PROMPTBRAIN_LLM_JUDGE_TIMEOUT_MS", 30_000),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.enabled && self.model.trim().is_empty() {
            anyhow::bail!("PROMPTBRAIN_LLM_JUDGE_MODEL must be set when the judge is enabled");
        }
        Ok(())
    }
}

/// Multi-variant LLM rewriter configuration (§4.4)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiRewriterConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub temperatures: Vec<f32>,
    pub max_tokens: usize,
    pub per_call_timeout_ms: u64,
    pub fanout_timeout_ms: u64,
    pub cache_ttl_ms: u64,
    pub cache_capacity: usize,
}

impl AiRewriterConfig {
    pub fn from_env() -> Self {
        Self {
            endpoint: env_or("PROMPTBRAIN_LLM_ENDPOINT", "https://api.openai.com/v1/chat/completions"),
            api_key: env_or("PROMPTBRAIN_LLM_API_KEY", ""),
            model: env_or("PROMPTBRAIN_LLM_MODEL", "rewriter-default"),
            temperatures: env_f32_list("PROMPTBRAIN_AI_REWRITER_TEMPERATURES", &[0.3, 0.5, 0.7]),
            max_tokens: env_usize("PROMPTBRAIN_AI_REWRITER_MAX_TOKENS", 2048),
            per_call_timeout_ms: env_u64("PROMPTBRAIN_AI_REWRITER_TIMEOUT_MS", 30_000),
            fanout_timeout_ms: env_u64("PROMPTBRAIN_AI_REWRITER_FANOUT_TIMEOUT_MS", 30_000),
            cache_ttl_ms: env_u64("PROMPTBRAIN_AI_REWRITER_CACHE_TTL_MS", 3_600_000),
            cache_capacity: env_usize("PROMPTBRAIN_AI_REWRITER_CACHE_CAPACITY", 100),
        }
    }

    /// A credential is configured only if the key is present and non-empty (§4.4 step 1).
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}
