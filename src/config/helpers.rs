// src/config/helpers.rs
// Helper functions for loading environment variables

use std::env;

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub fn env_usize(key: &str, default: usize) -> usize {
    env_parsed_or(key, default)
}

pub fn env_f32(key: &str, default: f32) -> f32 {
    env_parsed_or(key, default)
}

pub fn env_u64(key: &str, default: u64) -> u64 {
    env_parsed_or(key, default)
}

pub fn env_bool(key: &str, default: bool) -> bool {
    env_parsed_or(key, default)
}

/// Parse a comma-separated list of floats, falling back to `default` on missing/malformed input.
pub fn env_f32_list(key: &str, default: &[f32]) -> Vec<f32> {
    match env::var(key) {
        Ok(v) => {
            let parsed: Vec<f32> = v.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if parsed.is_empty() { default.to_vec() } else { parsed }
        }
        Err(_) => default.to_vec(),
    }
}
