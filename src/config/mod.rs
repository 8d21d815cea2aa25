// src/config/mod.rs
// Central configuration for the prompt-analysis engine

pub mod analysis;
pub mod helpers;
pub mod llm;
pub mod server;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

lazy_static! {
    pub static ref CONFIG: EngineConfig = EngineConfig::from_env();
}

/// Main configuration structure - composes all domain configs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub golden: analysis::GoldenConfig,
    pub analysis: analysis::AnalysisConfig,
    pub llm_judge: llm::LlmJudgeConfig,
    pub ai_rewriter: llm::AiRewriterConfig,
    pub database: server::DatabaseConfig,
    pub logging: server::LoggingConfig,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        // Load .env file
        dotenv::dotenv().ok(); // Don't panic if .env doesn't exist (for production)

        Self {
            golden: analysis::GoldenConfig::from_env(),
            analysis: analysis::AnalysisConfig::from_env(),
            llm_judge: llm::LlmJudgeConfig::from_env(),
            ai_rewriter: llm::AiRewriterConfig::from_env(),
            database: server::DatabaseConfig::from_env(),
            logging: server::LoggingConfig::from_env(),
        }
    }

    /// Validate config on startup
    pub fn validate(&self) -> anyhow::Result<()> {
        self.llm_judge.validate()?;
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
