// src/rewrite/mod.rs
// Rewriter subsystem: deterministic rule variants + multi-temperature AI variant (SPEC_FULL.md §4.3/§4.4)

pub mod ai;
pub mod extract;
pub mod rule;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariantKind {
    Conservative,
    Balanced,
    Comprehensive,
    Ai,
}

/// A rewritten candidate of the original prompt (§3 Variant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub kind: VariantKind,
    pub text: String,
    pub key_changes: Vec<String>,
    pub confidence: f32,
    pub ai_explanation: Option<String>,
    pub origin_temperature: Option<f32>,
    /// Set on the `Ai` variant when no credential is configured; carries no `text`.
    pub needs_setup: bool,
}

impl Variant {
    pub fn needs_setup_placeholder() -> Self {
        Self {
            kind: VariantKind::Ai,
            text: String::new(),
            key_changes: Vec::new(),
            confidence: 0.0,
            ai_explanation: None,
            origin_temperature: None,
            needs_setup: true,
        }
    }
}

/// Strip greeting/filler openings and collapse whitespace, leaving code fences untouched
/// (§4.3 preprocessing).
pub fn preprocess(text: &str) -> String {
    use lazy_static::lazy_static;
    use regex::Regex;

    lazy_static! {
        static ref FENCE: Regex = Regex::new(r"(?s)```.*?```").unwrap();
        static ref GREETING: Regex =
            Regex::new(r"(?i)^\s*(안녕하세요[,.]?\s*|hi[,.!]?\s*|hello[,.!]?\s*)").unwrap();
        static ref FILLER: Regex = Regex::new(r"(?i)^\s*(그래서\s*|so[,]?\s+)").unwrap();
        static ref WHITESPACE: Regex = Regex::new(r"[ \t]+").unwrap();
    }

    // Protect fenced blocks from whitespace collapsing by splitting around them.
    let mut out = String::new();
    let mut last = 0;
    for m in FENCE.find_iter(text) {
        out.push_str(&clean_plain(&text[last..m.start()], &GREETING, &FILLER, &WHITESPACE));
        out.push_str(m.as_str());
        last = m.end();
    }
    out.push_str(&clean_plain(&text[last..], &GREETING, &FILLER, &WHITESPACE));
    out.trim().to_string()
}

fn clean_plain(
    segment: &str,
    greeting: &regex::Regex,
    filler: &regex::Regex,
    whitespace: &regex::Regex,
) -> String {
    let stripped = greeting.replace(segment, "");
    let stripped = filler.replace(&stripped, "");
    whitespace.replace_all(&stripped, " ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_korean_greeting() {
        let out = preprocess("안녕하세요, 버그 수정해줘");
        assert!(!out.starts_with("안녕하세요"));
    }

    #[test]
    fn strips_english_greeting_and_filler() {
        let out = preprocess("hi so fix the bug please");
        assert!(!out.to_lowercase().starts_with("hi"));
    }

    #[test]
    fn leaves_code_fence_untouched() {
        let text = "fix this   now\n```rust\nfn  main()  {}\n```";
        let out = preprocess(text);
        assert!(out.contains("fn  main()  {}"));
    }
}
