// src/golden/judge.rs
// LLM-judge merge: fingerprinted cache + fixed-template call + rule/LLM score blending
// (SPEC_FULL.md §4.2 steps 3-6). Grounded on mira-chat/src/tools/mod.rs's `FileCache`
// (Mutex/RwLock<HashMap<K, CacheEntry>>, `Instant`-based TTL, oldest-eviction at
// capacity) and backend/src/memory/features/message_pipeline/analyzers/chat_analyzer.rs's
// prompt-then-strict-JSON-parse shape.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::warn;

use super::{Dimension, GoldenScore};
use crate::config::llm::LlmJudgeConfig;
use crate::llm::LlmProvider;
use crate::utils::sha256_hash;

const SYSTEM_PROMPT: &str = r#"You are a strict evaluator of developer prompts against six dimensions:
goal, output, limits, data, evaluation, next. Score each from 0.0 to 1.0.
Return ONLY a JSON object of the form:
{"goal":0.0,"output":0.0,"limits":0.0,"data":0.0,"evaluation":0.0,"next":0.0,"reasoning":"..."}
No prose outside the JSON object."#;

#[derive(Debug, Deserialize)]
struct JudgeResponse {
    goal: f32,
    output: f32,
    limits: f32,
    data: f32,
    evaluation: f32,
    next: f32,
    #[serde(default)]
    reasoning: String,
}

struct CacheEntry {
    score: GoldenScore,
    inserted_at: Instant,
}

/// Capacity-bounded, TTL-expiring cache of judge verdicts keyed by a prompt fingerprint.
pub struct JudgeCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl JudgeCache {
    pub fn new(ttl_ms: u64, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::from_millis(ttl_ms),
            capacity,
        }
    }

    fn get(&self, key: &str) -> Option<GoldenScore> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.score),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: String, score: GoldenScore) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            if let Some(oldest_key) = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest_key);
            }
        }
        entries.insert(
            key,
            CacheEntry {
                score,
                inserted_at: Instant::now(),
            },
        );
    }
}

/// Fingerprint a prompt + rule score for cache keying. Rule score is included since a
/// config change to the rule heuristics should invalidate previously-cached merges.
fn fingerprint(text: &str, rule_score: &GoldenScore) -> String {
    sha256_hash(&format!("{text}|{:.4}", rule_score.total))
}

fn parse_judge_response(raw: &str) -> Option<GoldenScore> {
    let trimmed = raw.trim();
    let json_slice = if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        &trimmed[start..=end]
    } else {
        trimmed
    };
    let parsed: JudgeResponse = serde_json::from_str(json_slice).ok()?;
    let clamp = |x: f32| x.clamp(0.0, 1.0);
    Some(GoldenScore::new(
        clamp(parsed.goal),
        clamp(parsed.output),
        clamp(parsed.limits),
        clamp(parsed.data),
        clamp(parsed.evaluation),
        clamp(parsed.next),
    ))
}

/// How the final score was produced, recorded for diagnostics on `AnalysisResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    RuleOnly,
    Balanced,
    LlmHeavy,
}

pub struct JudgeOutcome {
    pub score: GoldenScore,
    pub strategy: MergeStrategy,
    pub fallback_reason: Option<String>,
}

/// Merge a rule-based score with an LLM judge verdict, or fall back to the rule score
/// alone on any failure (disabled, timeout, malformed response). Never returns an error.
pub async fn merge_with_judge(
    provider: &dyn LlmProvider,
    cache: &JudgeCache,
    config: &LlmJudgeConfig,
    text: &str,
    rule_score: GoldenScore,
) -> JudgeOutcome {
    if !config.enabled {
        return JudgeOutcome {
            score: rule_score,
            strategy: MergeStrategy::RuleOnly,
            fallback_reason: None,
        };
    }

    let key = fingerprint(text, &rule_score);
    if let Some(cached) = cache.get(&key) {
        return classify_merge(rule_score, cached);
    }

    let timeout = Duration::from_millis(config.timeout_ms);
    let call = provider.call(SYSTEM_PROMPT, text, 0.0, timeout);

    let judge_score = match tokio::time::timeout(timeout, call).await {
        Ok(Ok(raw)) => match parse_judge_response(&raw) {
            Some(score) => score,
            None => {
                warn!("judge response failed to parse, falling back to rule score");
                return JudgeOutcome {
                    score: rule_score,
                    strategy: MergeStrategy::RuleOnly,
                    fallback_reason: Some("judge response malformed".to_string()),
                };
            }
        },
        Ok(Err(e)) => {
            warn!(error = %e, "judge call failed, falling back to rule score");
            return JudgeOutcome {
                score: rule_score,
                strategy: MergeStrategy::RuleOnly,
                fallback_reason: Some(format!("judge call failed: {e}")),
            };
        }
        Err(_) => {
            warn!("judge call timed out, falling back to rule score");
            return JudgeOutcome {
                score: rule_score,
                strategy: MergeStrategy::RuleOnly,
                fallback_reason: Some("judge call timed out".to_string()),
            };
        }
    };

    cache.put(key, judge_score);
    classify_merge(rule_score, judge_score)
}

fn classify_merge(rule_score: GoldenScore, judge_score: GoldenScore) -> JudgeOutcome {
    let diff = (rule_score.total - judge_score.total).abs();
    let (rule_weight, llm_weight, strategy) = if diff > 0.25 {
        (0.3, 0.7, MergeStrategy::LlmHeavy)
    } else {
        (0.45, 0.55, MergeStrategy::Balanced)
    };

    let blend = |dim: Dimension| {
        rule_score.get(dim) * rule_weight as f32 + judge_score.get(dim) * llm_weight as f32
    };

    let merged = GoldenScore::new(
        blend(Dimension::Goal),
        blend(Dimension::Output),
        blend(Dimension::Limits),
        blend(Dimension::Data),
        blend(Dimension::Evaluation),
        blend(Dimension::Next),
    );

    JudgeOutcome {
        score: merged,
        strategy,
        fallback_reason: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(v: f32) -> GoldenScore {
        GoldenScore::new(v, v, v, v, v, v)
    }

    #[test]
    fn close_scores_merge_balanced() {
        let outcome = classify_merge(score(0.5), score(0.55));
        assert_eq!(outcome.strategy, MergeStrategy::Balanced);
    }

    #[test]
    fn diverging_scores_merge_llm_heavy() {
        let outcome = classify_merge(score(0.2), score(0.9));
        assert_eq!(outcome.strategy, MergeStrategy::LlmHeavy);
    }

    #[test]
    fn cache_put_then_get_round_trips() {
        let cache = JudgeCache::new(60_000, 10);
        cache.put("k1".to_string(), score(0.7));
        let got = cache.get("k1");
        assert!(got.is_some());
        assert!((got.unwrap().total - 0.7).abs() < 1e-6);
    }

    #[test]
    fn cache_respects_capacity() {
        let cache = JudgeCache::new(60_000, 2);
        cache.put("a".to_string(), score(0.1));
        cache.put("b".to_string(), score(0.2));
        cache.put("c".to_string(), score(0.3));
        let entries = cache.entries.lock().unwrap();
        assert!(entries.len() <= 2);
    }

    #[test]
    fn parses_judge_json_with_surrounding_text() {
        let raw = "here you go: {\"goal\":0.5,\"output\":0.6,\"limits\":0.7,\"data\":0.8,\"evaluation\":0.9,\"next\":1.0,\"reasoning\":\"ok\"} thanks";
        let parsed = parse_judge_response(raw);
        assert!(parsed.is_some());
    }
}
