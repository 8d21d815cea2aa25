// src/orchestrator/mod.rs
// Pipeline sequencing: classify -> evaluate -> judge merge -> rewrite -> persist -> enrich
// (SPEC_FULL.md §4.7). Grounded on operations/engine/orchestration.rs's
// struct-of-collaborators + cancellation-token + tracing-span shape.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use crate::classifier::{category_slug, classify, intent_slug, Classification};
use crate::config::EngineConfig;
use crate::features::Features;
use crate::golden::judge::merge_with_judge;
use crate::golden::judge::JudgeCache;
use crate::golden::{evaluate_rule_based, Grade, GoldenScore, Issue, Severity};
use crate::history::{NewAnalysis, Repository};
use crate::llm::LlmProvider;
use crate::prompt::{Prompt, SessionContext};
use crate::recommend::{self, Enrichment};
use crate::rewrite::ai::{generate_ai_variant, AiCache};
use crate::rewrite::rule::generate_variants;
use crate::rewrite::Variant;

/// Prompts longer than this are treated as an `InputError` (§7) rather than analyzed.
const MAX_PROMPT_CHARS: usize = 20_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub prompt_text: String,
    pub features: Features,
    pub classification: Classification,
    pub golden: GoldenScore,
    pub grade: Grade,
    pub issues: Vec<Issue>,
    pub variants: Vec<Variant>,
    pub session_context: Option<SessionContext>,
    pub enrichment: Option<Enrichment>,
    pub persisted: bool,
    pub warnings: Vec<String>,
}

fn input_error_result(text: &str, reason: &str) -> AnalysisResult {
    let features = Features::extract(text);
    let classification = classify(text);
    AnalysisResult {
        prompt_text: text.to_string(),
        features,
        classification,
        golden: GoldenScore::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
        grade: Grade::F,
        issues: vec![Issue {
            severity: Severity::High,
            category: crate::golden::Dimension::Goal,
            message: reason.to_string(),
            suggestion: "프롬프트를 다시 입력해주세요".to_string(),
        }],
        variants: Vec::new(),
        session_context: None,
        enrichment: None,
        persisted: false,
        warnings: Vec::new(),
    }
}

/// Coordinates a single analysis end to end. Owns the LLM-judge and AI-rewriter caches
/// as explicit state (§9: no process-global singletons) and the cancellation token of
/// the most recent in-flight AI job, so a new analysis supersedes an older one.
pub struct Orchestrator {
    llm_provider: Arc<dyn LlmProvider>,
    repository: Option<Repository>,
    config: EngineConfig,
    judge_cache: JudgeCache,
    ai_cache: AiCache,
    active_token: StdMutex<Option<CancellationToken>>,
}

impl Orchestrator {
    pub fn new(llm_provider: Arc<dyn LlmProvider>, repository: Option<Repository>, config: EngineConfig) -> Self {
        let judge_cache = JudgeCache::new(config.llm_judge.cache_ttl_ms, config.llm_judge.cache_capacity);
        let ai_cache = AiCache::new(config.ai_rewriter.cache_ttl_ms, config.ai_rewriter.cache_capacity);
        Self {
            llm_provider,
            repository,
            config,
            judge_cache,
            ai_cache,
            active_token: StdMutex::new(None),
        }
    }

    /// Cancel any in-flight AI job from a previous analysis and register a fresh token
    /// for this one (§4.7, §5 ordering guarantees).
    fn start_new_token(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut guard = self.active_token.lock().unwrap();
        if let Some(previous) = guard.take() {
            previous.cancel();
        }
        *guard = Some(token.clone());
        token
    }

    pub async fn analyze(&self, prompt: Prompt, session: Option<SessionContext>) -> AnalysisResult {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "analyze",
            %request_id,
            source_app = prompt.source_app.as_deref().unwrap_or("")
        );
        self.analyze_inner(prompt, session).instrument(span).await
    }

    async fn analyze_inner(&self, prompt: Prompt, session: Option<SessionContext>) -> AnalysisResult {
        let text = prompt.text.trim();
        if text.is_empty() {
            return input_error_result(&prompt.text, "프롬프트가 비어 있습니다");
        }
        if text.chars().count() > MAX_PROMPT_CHARS {
            return input_error_result(&prompt.text, "프롬프트가 너무 깁니다");
        }

        let deadline = Instant::now() + Duration::from_millis(self.config.analysis.deadline_ms);
        let token = self.start_new_token();

        let features = Features::extract(&prompt.text);
        let classification = classify(&prompt.text);

        let (rule_score, issues) = evaluate_rule_based(
            &prompt.text,
            &features,
            &classification,
            self.config.golden.weakness_threshold,
        );

        let mut golden = rule_score;
        if self.config.llm_judge.enabled {
            let outcome = merge_with_judge(
                self.llm_provider.as_ref(),
                &self.judge_cache,
                &self.config.llm_judge,
                &prompt.text,
                rule_score,
            )
            .await;
            golden = outcome.score;
            if let Some(reason) = outcome.fallback_reason {
                warn!(reason, "judge merge fell back to rule score");
            }
        }

        let grade = Grade::from_total(golden.total, &self.config.golden.grade_boundaries);
        let category = category_slug(classification.task_category);
        let intent = intent_slug(classification.intent);

        let mut variants: Vec<Variant> =
            generate_variants(&prompt.text, &golden, &classification, session.as_ref()).to_vec();

        // The AI rewriter and the enrichment's project-average read are independent of
        // each other (enrichment keys off `golden`, not the rewritten variants), so they
        // run concurrently against the orchestrator's deadline (§4.7).
        let remaining = deadline.saturating_duration_since(Instant::now());
        let overall_score = (golden.total.clamp(0.0, 1.0) * 100.0).round() as i64;

        let ai_future = async {
            if remaining == Duration::from_millis(0) {
                warn!("ai rewriter skipped: deadline already exceeded");
                return None;
            }
            let ai_future = generate_ai_variant(
                self.llm_provider.as_ref(),
                &self.ai_cache,
                &self.config.ai_rewriter,
                &prompt.text,
                &golden,
                session.as_ref(),
                token.clone(),
            );
            match tokio::time::timeout(remaining, ai_future).await {
                Ok(variant) => Some(variant),
                Err(_) => {
                    warn!("ai rewriter omitted: orchestrator deadline exceeded");
                    None
                }
            }
        };

        let enrich_future = async {
            match &self.repository {
                Some(repository) => {
                    recommend::enrich_analysis(
                        repository,
                        overall_score,
                        Some(category),
                        prompt.project_path.as_deref(),
                    )
                    .await
                    .map(Some)
                    .unwrap_or_else(|e| {
                        warn!(error = %e, "enrichment unavailable");
                        None
                    })
                }
                None => None,
            }
        };

        let (ai_variant, enrichment) = tokio::join!(ai_future, enrich_future);
        if let Some(variant) = ai_variant {
            variants.push(variant);
        }

        let mut warnings = Vec::new();
        let mut persisted = false;

        if let Some(repository) = &self.repository {
            let improved_prompt = variants
                .iter()
                .filter(|v| !v.needs_setup)
                .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap())
                .map(|v| v.text.as_str());

            let new_analysis = NewAnalysis {
                prompt_text: &prompt.text,
                score: &golden,
                grade,
                issues: &issues,
                improved_prompt,
                source_app: prompt.source_app.as_deref(),
                project_path: prompt.project_path.as_deref(),
                intent: Some(intent),
                category: Some(category),
            };

            match repository.save_analysis(&new_analysis).await {
                Ok(_) => persisted = true,
                Err(e) => {
                    warnings.push(format!("analysis not saved: {e}"));
                    warn!(error = %e, "persistence failed");
                }
            }
        }

        AnalysisResult {
            prompt_text: prompt.text,
            features,
            classification,
            golden,
            grade,
            issues,
            variants,
            session_context: session,
            enrichment,
            persisted,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StubProvider;
    #[async_trait]
    impl LlmProvider for StubProvider {
        async fn call(
            &self,
            _s: &str,
            _u: &str,
            _t: f32,
            _timeout: Duration,
        ) -> crate::error::LlmResult<String> {
            Err(crate::error::LlmError::Unauthorized)
        }
    }

    #[tokio::test]
    async fn empty_prompt_short_circuits() {
        let config = EngineConfig::from_env();
        let orchestrator = Orchestrator::new(Arc::new(StubProvider), None, config);
        let result = orchestrator.analyze(Prompt::new(""), None).await;
        assert!(result.variants.is_empty());
        assert_eq!(result.grade, Grade::F);
        assert_eq!(result.issues.len(), 1);
    }

    #[tokio::test]
    async fn normal_prompt_without_repository_is_not_persisted() {
        let config = EngineConfig::from_env();
        let orchestrator = Orchestrator::new(Arc::new(StubProvider), None, config);
        let result = orchestrator.analyze(Prompt::new("fix bug"), None).await;
        assert!(!result.persisted);
        assert!(result.variants.len() == 3 || result.variants.len() == 4);
    }
}
