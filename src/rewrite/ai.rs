// src/rewrite/ai.rs
// Multi-variant LLM rewriter: temperature fan-out, re-scoring, selection, caching (§4.4)

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use futures::future::join_all;
use lazy_static::lazy_static;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{Variant, VariantKind};
use crate::classifier::{classify, Classification};
use crate::config::llm::AiRewriterConfig;
use crate::features::{Features, LanguageHint};
use crate::golden::rules::score as rule_score;
use crate::golden::GoldenScore;
use crate::llm::LlmProvider;
use crate::prompt::SessionContext;
use crate::utils::sha256_hash;

lazy_static! {
    static ref PREAMBLE_RE: Regex = Regex::new(
        r"(?i)^\s*(다음과\s?같이\s?개선했습니다[:.]?\s*|here'?s\s+the\s+improved\s+prompt[:.]?\s*)"
    ).unwrap();
    static ref LEADING_RULE_RE: Regex = Regex::new(r"^\s*-{3,}\s*\n").unwrap();
    static ref LONG_SEPARATOR_RE: Regex = Regex::new(r"(?s)^.*\n-{3,}\n").unwrap();
}

struct CacheEntry {
    variant: Variant,
    inserted_at: Instant,
}

/// TTL + capacity bounded cache of AI variants, keyed by `(prompt_text, language, context_digest)`.
pub struct AiCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl AiCache {
    pub fn new(ttl_ms: u64, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::from_millis(ttl_ms),
            capacity,
        }
    }

    fn get(&self, key: &str) -> Option<Variant> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.variant.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: String, variant: Variant) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }
        entries.insert(key, CacheEntry { variant, inserted_at: Instant::now() });
    }
}

fn context_digest(session: Option<&SessionContext>) -> String {
    match session {
        None => "none".to_string(),
        Some(s) => format!(
            "{}|{}|{}",
            s.project_name.as_deref().unwrap_or(""),
            s.tech_stack.join(","),
            s.current_task.as_deref().unwrap_or(""),
        ),
    }
}

fn cache_key(text: &str, language: LanguageHint, digest: &str) -> String {
    sha256_hash(&format!("{text}|{language:?}|{digest}"))
}

fn system_prompt(language: LanguageHint) -> String {
    let language_note = match language {
        LanguageHint::Ko => "Respond in Korean, matching the original prompt's language.",
        LanguageHint::En => "Respond in English, matching the original prompt's language.",
        LanguageHint::Mixed => "Respond in the same mix of languages as the original prompt.",
    };
    format!(
        "You rewrite developer prompts to satisfy the GOLDEN framework: Goal, Output, \
         Limits, Data, Evaluation, Next. Produce ONE improved prompt only. Do not include \
         placeholders, meta-commentary, or a preamble like \"here is the improved prompt\". \
         {language_note}"
    )
}

fn context_hint(session: Option<&SessionContext>) -> String {
    match session {
        None => String::new(),
        Some(s) => {
            let mut lines = Vec::new();
            if let Some(name) = &s.project_name {
                lines.push(format!("project: {name}"));
            }
            if !s.tech_stack.is_empty() {
                lines.push(format!("tech_stack: {}", s.tech_stack.join(", ")));
            }
            if s.has_meaningful_task() {
                if let Some(task) = &s.current_task {
                    lines.push(format!("current_task: {task}"));
                }
            }
            if lines.is_empty() {
                String::new()
            } else {
                format!("\n\nContext:\n{}", lines.join("\n"))
            }
        }
    }
}

/// Strip known LLM preamble/separator noise from a raw rewrite response (§4.4 step 4).
fn sanitize(raw: &str) -> String {
    let stripped = PREAMBLE_RE.replace(raw, "");
    let stripped = LONG_SEPARATOR_RE.replace(&stripped, "");
    let stripped = LEADING_RULE_RE.replace(&stripped, "");
    stripped.trim().to_string()
}

struct Candidate {
    text: String,
    temperature: f32,
    score: GoldenScore,
}

async fn call_one(
    provider: &dyn LlmProvider,
    system: &str,
    prompt: &str,
    temperature: f32,
    per_call_timeout: Duration,
) -> Option<String> {
    match provider.call(system, prompt, temperature, per_call_timeout).await {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(error = %e, temperature, "ai rewriter branch failed");
            None
        }
    }
}

fn rescore(text: &str) -> (Classification, Features, GoldenScore) {
    let features = Features::extract(text);
    let classification = classify(text);
    let score = rule_score(text, &features, &classification);
    (classification, features, score)
}

/// Generate the AI variant, or a `needs_setup` placeholder when no credential is
/// configured or every branch fails (§4.4 contract).
pub async fn generate_ai_variant(
    provider: &dyn LlmProvider,
    cache: &AiCache,
    config: &AiRewriterConfig,
    text: &str,
    original_score: &GoldenScore,
    session: Option<&SessionContext>,
    cancel: CancellationToken,
) -> Variant {
    if !config.is_configured() {
        return Variant::needs_setup_placeholder();
    }

    let features = Features::extract(text);
    let digest = context_digest(session);
    let key = cache_key(text, features.language_hint, &digest);

    if let Some(cached) = cache.get(&key) {
        return cached;
    }

    let system = system_prompt(features.language_hint);
    let hint = context_hint(session);
    let user_prompt = format!("{text}{hint}");
    let per_call_timeout = Duration::from_millis(config.per_call_timeout_ms);
    let fanout_timeout = Duration::from_millis(config.fanout_timeout_ms);

    let calls = config.temperatures.iter().map(|&temperature| {
        let system = system.clone();
        let user_prompt = user_prompt.clone();
        async move { (temperature, call_one(provider, &system, &user_prompt, temperature, per_call_timeout).await) }
    });

    let fanout = async {
        tokio::select! {
            results = join_all(calls) => results,
            _ = cancel.cancelled() => Vec::new(),
        }
    };

    let results = match tokio::time::timeout(fanout_timeout, fanout).await {
        Ok(results) => results,
        Err(_) => {
            warn!("ai rewriter fan-out timed out");
            Vec::new()
        }
    };

    let mut candidates: Vec<Candidate> = Vec::new();
    for (temperature, raw) in results {
        let Some(raw) = raw else { continue };
        let sanitized = sanitize(&raw);
        if sanitized.is_empty() {
            continue;
        }
        let (_, _, score) = rescore(&sanitized);
        candidates.push(Candidate { text: sanitized, temperature, score });
    }

    if candidates.is_empty() {
        return Variant::needs_setup_placeholder();
    }

    candidates.sort_by(|a, b| {
        b.score
            .total
            .partial_cmp(&a.score.total)
            .unwrap()
            .then(a.temperature.partial_cmp(&b.temperature).unwrap())
    });
    let best = candidates.into_iter().next().unwrap();

    let improvement_percent =
        ((best.score.total - original_score.total) / original_score.total.max(0.01) * 100.0).round();

    let variant = Variant {
        kind: VariantKind::Ai,
        text: best.text,
        key_changes: vec![format!(
            "원본 대비 GOLDEN 총점 {:.0}% 개선 (temperature {:.1})",
            improvement_percent, best.temperature
        )],
        confidence: (0.9 - 0.2 * best.temperature).clamp(0.0, 1.0),
        ai_explanation: Some(format!(
            "{} candidates 중 temperature {:.1}에서 가장 높은 점수",
            config.temperatures.len(),
            best.temperature
        )),
        origin_temperature: Some(best.temperature),
        needs_setup: false,
    };

    cache.put(key, variant.clone());
    variant
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_preamble() {
        let raw = "다음과 같이 개선했습니다: 버그를 수정해줘, context: src/main.rs";
        let out = sanitize(raw);
        assert!(!out.starts_with("다음과"));
    }

    #[test]
    fn sanitize_strips_english_preamble() {
        let raw = "Here's the improved prompt: Fix the login bug in src/auth.rs";
        let out = sanitize(raw);
        assert!(out.starts_with("Fix"));
    }

    #[test]
    fn sanitize_strips_through_last_separator() {
        let raw = "reasoning about the bug\n---\nsome commentary on the fix\n---\nFix the login bug in src/auth.rs";
        let out = sanitize(raw);
        assert_eq!(out, "Fix the login bug in src/auth.rs");
    }

    #[test]
    fn cache_round_trips() {
        let cache = AiCache::new(60_000, 10);
        let variant = Variant {
            kind: VariantKind::Ai,
            text: "hello".to_string(),
            key_changes: vec![],
            confidence: 0.5,
            ai_explanation: None,
            origin_temperature: Some(0.3),
            needs_setup: false,
        };
        cache.put("k".to_string(), variant);
        assert!(cache.get("k").is_some());
    }

    #[tokio::test]
    async fn no_credential_yields_needs_setup() {
        struct DummyProvider;
        #[async_trait::async_trait]
        impl LlmProvider for DummyProvider {
            async fn call(
                &self,
                _s: &str,
                _u: &str,
                _t: f32,
                _timeout: Duration,
            ) -> crate::error::LlmResult<String> {
                Ok("unused".to_string())
            }
        }

        let config = AiRewriterConfig {
            endpoint: "https://example.invalid".to_string(),
            api_key: "".to_string(),
            model: "m".to_string(),
            temperatures: vec![0.3],
            max_tokens: 100,
            per_call_timeout_ms: 1000,
            fanout_timeout_ms: 1000,
            cache_ttl_ms: 1000,
            cache_capacity: 10,
        };
        let cache = AiCache::new(1000, 10);
        let original = GoldenScore::new(0.5, 0.5, 0.5, 0.5, 0.5, 0.5);
        let variant = generate_ai_variant(
            &DummyProvider,
            &cache,
            &config,
            "fix bug",
            &original,
            None,
            CancellationToken::new(),
        )
        .await;
        assert!(variant.needs_setup);
    }
}
