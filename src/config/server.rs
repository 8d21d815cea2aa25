// src/config/server.rs
// Embedded relational store configuration

use serde::{Deserialize, Serialize};

use super::helpers::{env_or, env_usize};

/// Configuration for the embedded SQLite-backed history store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            url: env_or("PROMPTBRAIN_DATABASE_URL", "sqlite://promptbrain.db"),
            max_connections: env_usize("PROMPTBRAIN_SQLITE_MAX_CONNECTIONS", 4) as u32,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            level: env_or("PROMPTBRAIN_LOG_LEVEL", "info"),
        }
    }
}
