// src/history/aggregates.rs
// Result types for the repository's aggregate queries (SPEC_FULL.md §4.5 Queries)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTrendPoint {
    pub day: String,
    pub avg_score: f64,
    pub count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DimensionAverages {
    pub goal: f64,
    pub output: f64,
    pub limits: f64,
    pub data: f64,
    pub evaluation: f64,
    pub next: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DimensionWeaknessCounts {
    pub goal: i64,
    pub output: i64,
    pub limits: i64,
    pub data: i64,
    pub evaluation: i64,
    pub next: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectStats {
    pub project_path: String,
    pub sample_count: i64,
    pub dimension_averages: DimensionAverages,
    pub weakness_counts: DimensionWeaknessCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyStats {
    pub week_start: String,
    pub avg_score: f64,
    pub improvement_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub month: String,
    pub avg_score: f64,
    pub grade_distribution: std::collections::HashMap<String, i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Improving,
    Worsening,
    Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuePatternTrend {
    pub category: String,
    pub recent_rate: f64,
    pub older_rate: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub kind: String,
    pub description: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovementAnalysis {
    pub current_week_avg: Option<f64>,
    pub four_weeks_ago_avg: Option<f64>,
    pub delta: Option<f64>,
    pub best_dimension: Option<String>,
    pub worst_dimension: Option<String>,
    pub streak_days: i64,
    pub milestones: Vec<Milestone>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictedScore {
    pub value: f64,
    pub confidence: Confidence,
    pub sample_count: i64,
}
