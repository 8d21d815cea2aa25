// src/history/record.rs
// Persisted schema types for the history repository (SPEC_FULL.md §4.5, §3)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::golden::{Dimension, Grade, GoldenScore, Issue};

/// `prompt_history` row. `overall_score` and each `golden_*` column are integers in
/// [0,100] — the GoldenScore's [0,1] floats scaled and rounded on insert.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PromptHistoryRecord {
    pub id: i64,
    pub prompt_text: String,
    pub overall_score: i64,
    pub grade: String,
    pub golden_goal: i64,
    pub golden_output: i64,
    pub golden_limits: i64,
    pub golden_data: i64,
    pub golden_evaluation: i64,
    pub golden_next: i64,
    pub issues_json: Option<String>,
    pub improved_prompt: Option<String>,
    pub source_app: Option<String>,
    pub project_path: Option<String>,
    pub intent: Option<String>,
    pub category: Option<String>,
    pub analyzed_at: DateTime<Utc>,
}

impl PromptHistoryRecord {
    pub fn get(&self, dim: Dimension) -> i64 {
        match dim {
            Dimension::Goal => self.golden_goal,
            Dimension::Output => self.golden_output,
            Dimension::Limits => self.golden_limits,
            Dimension::Data => self.golden_data,
            Dimension::Evaluation => self.golden_evaluation,
            Dimension::Next => self.golden_next,
        }
    }
}

/// `personal_tips` row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PersonalTip {
    pub weakness_type: String,
    pub frequency: i64,
    pub last_seen_at: DateTime<Utc>,
}

fn to_int_scale(score: f32) -> i64 {
    (score.clamp(0.0, 1.0) * 100.0).round() as i64
}

pub fn grade_label(grade: Grade) -> &'static str {
    match grade {
        Grade::A => "A",
        Grade::B => "B",
        Grade::C => "C",
        Grade::D => "D",
        Grade::F => "F",
    }
}

/// Input to `Repository::save_analysis`.
pub struct NewAnalysis<'a> {
    pub prompt_text: &'a str,
    pub score: &'a GoldenScore,
    pub grade: Grade,
    pub issues: &'a [Issue],
    pub improved_prompt: Option<&'a str>,
    pub source_app: Option<&'a str>,
    pub project_path: Option<&'a str>,
    pub intent: Option<&'a str>,
    pub category: Option<&'a str>,
}

pub struct ScaledDimensions {
    pub overall: i64,
    pub goal: i64,
    pub output: i64,
    pub limits: i64,
    pub data: i64,
    pub evaluation: i64,
    pub next: i64,
}

impl<'a> NewAnalysis<'a> {
    pub fn scaled(&self) -> ScaledDimensions {
        ScaledDimensions {
            overall: to_int_scale(self.score.total),
            goal: to_int_scale(self.score.goal),
            output: to_int_scale(self.score.output),
            limits: to_int_scale(self.score.limits),
            data: to_int_scale(self.score.data),
            evaluation: to_int_scale(self.score.evaluation),
            next: to_int_scale(self.score.next),
        }
    }
}
