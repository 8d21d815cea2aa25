// src/config/analysis.rs
// GOLDEN scoring, grading, and orchestration-deadline configuration

use serde::{Deserialize, Serialize};

use super::helpers::{env_f32, env_u64};

/// Grade boundaries, applied to a `total` score normalized to [0,1] (§3 Invariants).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeBoundaries {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
}

impl Default for GradeBoundaries {
    fn default() -> Self {
        Self { a: 0.9, b: 0.75, c: 0.6, d: 0.45 }
    }
}

/// GOLDEN evaluator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenConfig {
    /// Weakness threshold, stored normalized to [0,1]. The 0-100 form used by the
    /// history repository is always `weakness_threshold * 100.0` — there is no
    /// second stored constant (see SPEC_FULL.md §9, resolved open question).
    pub weakness_threshold: f32,
    pub grade_boundaries: GradeBoundaries,
}

impl GoldenConfig {
    pub fn from_env() -> Self {
        Self {
            weakness_threshold: env_f32("PROMPTBRAIN_WEAKNESS_THRESHOLD", 0.5),
            grade_boundaries: GradeBoundaries {
                a: env_f32("PROMPTBRAIN_GRADE_A", 0.9),
                b: env_f32("PROMPTBRAIN_GRADE_B", 0.75),
                c: env_f32("PROMPTBRAIN_GRADE_C", 0.6),
                d: env_f32("PROMPTBRAIN_GRADE_D", 0.45),
            },
        }
    }

    /// The weakness threshold expressed on the history repository's 0-100 integer scale.
    pub fn weakness_threshold_int(&self) -> i64 {
        (self.weakness_threshold * 100.0).round() as i64
    }
}

/// Orchestrator-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub deadline_ms: u64,
}

impl AnalysisConfig {
    pub fn from_env() -> Self {
        Self {
            deadline_ms: env_u64("PROMPTBRAIN_ANALYSIS_DEADLINE_MS", 45_000),
        }
    }
}
