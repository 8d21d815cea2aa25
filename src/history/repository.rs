// src/history/repository.rs
// SQL-backed history repository: append, aggregates, trend queries (SPEC_FULL.md §4.5)

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

use super::aggregates::{
    Confidence, DailyTrendPoint, DimensionAverages, DimensionWeaknessCounts, ImprovementAnalysis,
    IssuePatternTrend, Milestone, MonthlyStats, PredictedScore, ProjectStats, Trend, WeeklyStats,
};
use super::record::{grade_label, NewAnalysis, PromptHistoryRecord};
use crate::error::{StorageError, StorageResult};
use crate::golden::{Dimension, Issue};

/// Recursive CTE streak depth cap (§9 design note: a deliberate cap against runaway streaks).
const MAX_STREAK_DAYS: i64 = 100;

/// Thin async wrapper over an embedded SQLite store. All writes serialize behind the
/// pool's single connection; readers proceed in parallel (§4.5 Concurrency).
pub struct Repository {
    pool: SqlitePool,
    weakness_threshold_int: i64,
}

impl Repository {
    pub async fn connect(database_url: &str, max_connections: u32, weakness_threshold_int: i64) -> StorageResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(database_url, "history repository connected and migrated");
        Ok(Self { pool, weakness_threshold_int })
    }

    pub fn from_pool(pool: SqlitePool, weakness_threshold_int: i64) -> Self {
        Self { pool, weakness_threshold_int }
    }

    /// Insert a `PromptHistoryRecord` and upsert `personal_tips` atomically (§4.5 Invariants).
    pub async fn save_analysis(&self, new: &NewAnalysis<'_>) -> StorageResult<i64> {
        let scaled = new.scaled();
        let issues_json = if new.issues.is_empty() {
            None
        } else {
            Some(serde_json::to_string(new.issues)?)
        };

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO prompt_history (
                prompt_text, overall_score, grade,
                golden_goal, golden_output, golden_limits, golden_data, golden_evaluation, golden_next,
                issues_json, improved_prompt, source_app, project_path, intent, category
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.prompt_text)
        .bind(scaled.overall)
        .bind(grade_label(new.grade))
        .bind(scaled.goal)
        .bind(scaled.output)
        .bind(scaled.limits)
        .bind(scaled.data)
        .bind(scaled.evaluation)
        .bind(scaled.next)
        .bind(&issues_json)
        .bind(new.improved_prompt)
        .bind(new.source_app)
        .bind(new.project_path)
        .bind(new.intent)
        .bind(new.category)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for (dim, value) in [
            (Dimension::Goal, scaled.goal),
            (Dimension::Output, scaled.output),
            (Dimension::Limits, scaled.limits),
            (Dimension::Data, scaled.data),
            (Dimension::Evaluation, scaled.evaluation),
            (Dimension::Next, scaled.next),
        ] {
            if value < self.weakness_threshold_int {
                sqlx::query(
                    r#"
                    INSERT INTO personal_tips (weakness_type, frequency, last_seen_at)
                    VALUES (?, 1, CURRENT_TIMESTAMP)
                    ON CONFLICT(weakness_type) DO UPDATE SET
                        frequency = frequency + 1,
                        last_seen_at = CURRENT_TIMESTAMP
                    "#,
                )
                .bind(dimension_key(dim))
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(id)
    }

    pub async fn recent(&self, limit: i64) -> StorageResult<Vec<PromptHistoryRecord>> {
        let records = sqlx::query_as::<_, PromptHistoryRecord>(
            "SELECT * FROM prompt_history ORDER BY analyzed_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn daily_trend(&self, days: i64) -> StorageResult<Vec<DailyTrendPoint>> {
        let rows = sqlx::query(
            r#"
            SELECT date(analyzed_at) as day, AVG(overall_score) as avg_score, COUNT(*) as count
            FROM prompt_history
            WHERE analyzed_at >= datetime('now', ?)
            GROUP BY day
            ORDER BY day ASC
            "#,
        )
        .bind(format!("-{days} days"))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| DailyTrendPoint {
                day: r.get("day"),
                avg_score: r.get("avg_score"),
                count: r.get("count"),
            })
            .collect())
    }

    pub async fn dimension_averages(&self, days: i64) -> StorageResult<DimensionAverages> {
        let row = sqlx::query(
            r#"
            SELECT
                AVG(golden_goal) as goal, AVG(golden_output) as output, AVG(golden_limits) as limits,
                AVG(golden_data) as data, AVG(golden_evaluation) as evaluation, AVG(golden_next) as next
            FROM prompt_history
            WHERE analyzed_at >= datetime('now', ?)
            "#,
        )
        .bind(format!("-{days} days"))
        .fetch_one(&self.pool)
        .await?;

        Ok(DimensionAverages {
            goal: row.try_get::<Option<f64>, _>("goal")?.unwrap_or(0.0),
            output: row.try_get::<Option<f64>, _>("output")?.unwrap_or(0.0),
            limits: row.try_get::<Option<f64>, _>("limits")?.unwrap_or(0.0),
            data: row.try_get::<Option<f64>, _>("data")?.unwrap_or(0.0),
            evaluation: row.try_get::<Option<f64>, _>("evaluation")?.unwrap_or(0.0),
            next: row.try_get::<Option<f64>, _>("next")?.unwrap_or(0.0),
        })
    }

    /// Per-project dimension averages and weakness counts, or `None` if the project has
    /// no history yet (§4.6 "returns null when no project averages exist").
    pub async fn project_stats(&self, project_path: &str) -> StorageResult<Option<ProjectStats>> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) as sample_count,
                AVG(golden_goal) as goal, AVG(golden_output) as output, AVG(golden_limits) as limits,
                AVG(golden_data) as data, AVG(golden_evaluation) as evaluation, AVG(golden_next) as next,
                SUM(CASE WHEN golden_goal < ? THEN 1 ELSE 0 END) as goal_weak,
                SUM(CASE WHEN golden_output < ? THEN 1 ELSE 0 END) as output_weak,
                SUM(CASE WHEN golden_limits < ? THEN 1 ELSE 0 END) as limits_weak,
                SUM(CASE WHEN golden_data < ? THEN 1 ELSE 0 END) as data_weak,
                SUM(CASE WHEN golden_evaluation < ? THEN 1 ELSE 0 END) as evaluation_weak,
                SUM(CASE WHEN golden_next < ? THEN 1 ELSE 0 END) as next_weak
            FROM prompt_history
            WHERE project_path = ?
            "#,
        )
        .bind(self.weakness_threshold_int)
        .bind(self.weakness_threshold_int)
        .bind(self.weakness_threshold_int)
        .bind(self.weakness_threshold_int)
        .bind(self.weakness_threshold_int)
        .bind(self.weakness_threshold_int)
        .bind(project_path)
        .fetch_one(&self.pool)
        .await?;

        let sample_count: i64 = row.get("sample_count");
        if sample_count == 0 {
            return Ok(None);
        }

        Ok(Some(ProjectStats {
            project_path: project_path.to_string(),
            sample_count,
            dimension_averages: DimensionAverages {
                goal: row.try_get::<Option<f64>, _>("goal")?.unwrap_or(0.0),
                output: row.try_get::<Option<f64>, _>("output")?.unwrap_or(0.0),
                limits: row.try_get::<Option<f64>, _>("limits")?.unwrap_or(0.0),
                data: row.try_get::<Option<f64>, _>("data")?.unwrap_or(0.0),
                evaluation: row.try_get::<Option<f64>, _>("evaluation")?.unwrap_or(0.0),
                next: row.try_get::<Option<f64>, _>("next")?.unwrap_or(0.0),
            },
            weakness_counts: DimensionWeaknessCounts {
                goal: row.get("goal_weak"),
                output: row.get("output_weak"),
                limits: row.get("limits_weak"),
                data: row.get("data_weak"),
                evaluation: row.get("evaluation_weak"),
                next: row.get("next_weak"),
            },
        }))
    }

    pub async fn high_scoring_examples(
        &self,
        project_path: Option<&str>,
        limit: i64,
    ) -> StorageResult<Vec<PromptHistoryRecord>> {
        let records = sqlx::query_as::<_, PromptHistoryRecord>(
            r#"
            SELECT * FROM prompt_history
            WHERE overall_score >= 80 AND (?1 IS NULL OR project_path = ?1)
            ORDER BY overall_score DESC
            LIMIT ?2
            "#,
        )
        .bind(project_path)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn similar_by_category(
        &self,
        category: &str,
        project_path: Option<&str>,
        limit: i64,
    ) -> StorageResult<Vec<PromptHistoryRecord>> {
        let records = sqlx::query_as::<_, PromptHistoryRecord>(
            r#"
            SELECT * FROM prompt_history
            WHERE category = ?1 AND (?2 IS NULL OR project_path = ?2)
            ORDER BY analyzed_at DESC
            LIMIT ?3
            "#,
        )
        .bind(category)
        .bind(project_path)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn weekly_stats(&self, weeks: i64) -> StorageResult<Vec<WeeklyStats>> {
        let rows = sqlx::query(
            r#"
            WITH weekly AS (
                SELECT strftime('%Y-%W', analyzed_at) as week_start, AVG(overall_score) as avg_score
                FROM prompt_history
                WHERE analyzed_at >= datetime('now', ?)
                GROUP BY week_start
            )
            SELECT
                week_start,
                avg_score,
                (avg_score - LAG(avg_score) OVER (ORDER BY week_start))
                    / NULLIF(LAG(avg_score) OVER (ORDER BY week_start), 0) * 100.0 as improvement_pct
            FROM weekly
            ORDER BY week_start ASC
            "#,
        )
        .bind(format!("-{} days", weeks * 7))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| WeeklyStats {
                week_start: r.get("week_start"),
                avg_score: r.get("avg_score"),
                improvement_pct: r.try_get::<Option<f64>, _>("improvement_pct").ok().flatten(),
            })
            .collect())
    }

    pub async fn monthly_stats(&self, months: i64) -> StorageResult<Vec<MonthlyStats>> {
        let since = format!("-{} days", months * 31);

        let avg_rows = sqlx::query(
            r#"
            SELECT strftime('%Y-%m', analyzed_at) as month, AVG(overall_score) as avg_score
            FROM prompt_history
            WHERE analyzed_at >= datetime('now', ?)
            GROUP BY month
            ORDER BY month ASC
            "#,
        )
        .bind(&since)
        .fetch_all(&self.pool)
        .await?;

        let grade_rows = sqlx::query(
            r#"
            SELECT strftime('%Y-%m', analyzed_at) as month, grade, COUNT(*) as count
            FROM prompt_history
            WHERE analyzed_at >= datetime('now', ?)
            GROUP BY month, grade
            "#,
        )
        .bind(&since)
        .fetch_all(&self.pool)
        .await?;

        let mut distributions: HashMap<String, HashMap<String, i64>> = HashMap::new();
        for row in grade_rows {
            let month: String = row.get("month");
            let grade: String = row.get("grade");
            let count: i64 = row.get("count");
            distributions.entry(month).or_default().insert(grade, count);
        }

        Ok(avg_rows
            .into_iter()
            .map(|r| {
                let month: String = r.get("month");
                let grade_distribution = distributions.remove(&month).unwrap_or_default();
                MonthlyStats {
                    avg_score: r.get("avg_score"),
                    grade_distribution,
                    month,
                }
            })
            .collect())
    }

    /// Week-over-week delta, 30-day best/worst dimension, consecutive-day streak
    /// (recursive CTE, capped at `MAX_STREAK_DAYS`), and milestone extraction.
    pub async fn improvement_analysis(&self) -> StorageResult<ImprovementAnalysis> {
        let current_week_avg: Option<f64> = sqlx::query(
            "SELECT AVG(overall_score) as avg_score FROM prompt_history WHERE analyzed_at >= datetime('now', '-7 days')",
        )
        .fetch_one(&self.pool)
        .await?
        .try_get("avg_score")
        .unwrap_or(None);

        let four_weeks_ago_avg: Option<f64> = sqlx::query(
            r#"
            SELECT AVG(overall_score) as avg_score FROM prompt_history
            WHERE analyzed_at >= datetime('now', '-35 days') AND analyzed_at < datetime('now', '-28 days')
            "#,
        )
        .fetch_one(&self.pool)
        .await?
        .try_get("avg_score")
        .unwrap_or(None);

        let delta = match (current_week_avg, four_weeks_ago_avg) {
            (Some(c), Some(f)) => Some(c - f),
            _ => None,
        };

        let dims = self.dimension_averages(30).await?;
        let pairs = [
            ("goal", dims.goal),
            ("output", dims.output),
            ("limits", dims.limits),
            ("data", dims.data),
            ("evaluation", dims.evaluation),
            ("next", dims.next),
        ];
        let best_dimension = pairs
            .iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .map(|(name, _)| name.to_string());
        let worst_dimension = pairs
            .iter()
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .map(|(name, _)| name.to_string());

        let streak_row = sqlx::query(
            r#"
            WITH RECURSIVE streak(d, n) AS (
                SELECT date('now'),
                    CASE WHEN EXISTS(SELECT 1 FROM prompt_history WHERE date(analyzed_at) = date('now')) THEN 1 ELSE 0 END
                UNION ALL
                SELECT date(d, '-1 day'), n + 1
                FROM streak
                WHERE n > 0 AND n < ?
                    AND EXISTS(SELECT 1 FROM prompt_history WHERE date(analyzed_at) = date(d, '-1 day'))
            )
            SELECT MAX(n) as streak FROM streak
            "#,
        )
        .bind(MAX_STREAK_DAYS)
        .fetch_one(&self.pool)
        .await?;
        let streak_days: i64 = streak_row.try_get("streak").unwrap_or(0);

        let mut milestones = Vec::new();
        if let Some(row) = sqlx::query(
            "SELECT analyzed_at FROM prompt_history WHERE grade = 'A' ORDER BY analyzed_at ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?
        {
            let at: DateTime<Utc> = row.get("analyzed_at");
            milestones.push(Milestone {
                kind: "first_a_grade".to_string(),
                description: "첫 A 등급 달성".to_string(),
                at,
            });
        }
        if let Some(row) = sqlx::query(
            "SELECT analyzed_at, overall_score FROM prompt_history ORDER BY overall_score DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?
        {
            let at: DateTime<Utc> = row.get("analyzed_at");
            let score: i64 = row.get("overall_score");
            milestones.push(Milestone {
                kind: "highest_score".to_string(),
                description: format!("최고 점수 {score}"),
                at,
            });
        }

        Ok(ImprovementAnalysis {
            current_week_avg,
            four_weeks_ago_avg,
            delta,
            best_dimension,
            worst_dimension,
            streak_days,
            milestones,
        })
    }

    /// Classify each issue category's recent (≤7d) vs older (8-30d) frequency rate.
    pub async fn issue_pattern_trends(&self) -> StorageResult<Vec<IssuePatternTrend>> {
        let rows = sqlx::query(
            r#"
            SELECT issues_json, analyzed_at,
                (julianday('now') - julianday(analyzed_at)) <= 7 as is_recent
            FROM prompt_history
            WHERE issues_json IS NOT NULL AND analyzed_at >= datetime('now', '-30 days')
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut recent_counts: HashMap<String, i64> = HashMap::new();
        let mut older_counts: HashMap<String, i64> = HashMap::new();
        let mut recent_total = 0i64;
        let mut older_total = 0i64;

        for row in rows {
            let issues_json: String = row.get("issues_json");
            let is_recent: i64 = row.get("is_recent");
            let issues: Vec<Issue> = match serde_json::from_str(&issues_json) {
                Ok(v) => v,
                Err(e) => {
                    warn!(error = %e, "skipping malformed issues_json row");
                    continue;
                }
            };
            for issue in issues {
                let key = dimension_key(issue.category).to_string();
                if is_recent == 1 {
                    *recent_counts.entry(key).or_insert(0) += 1;
                    recent_total += 1;
                } else {
                    *older_counts.entry(key).or_insert(0) += 1;
                    older_total += 1;
                }
            }
        }

        let mut categories: Vec<String> = recent_counts.keys().chain(older_counts.keys()).cloned().collect();
        categories.sort();
        categories.dedup();

        Ok(categories
            .into_iter()
            .map(|category| {
                let recent_rate = rate(*recent_counts.get(&category).unwrap_or(&0), recent_total);
                let older_rate = rate(*older_counts.get(&category).unwrap_or(&0), older_total);
                let trend = if older_rate > 0.0 && recent_rate < 0.5 * older_rate {
                    Trend::Improving
                } else if older_rate > 0.0 && recent_rate > 1.5 * older_rate {
                    Trend::Worsening
                } else {
                    Trend::Stable
                };
                IssuePatternTrend { category, recent_rate, older_rate, trend }
            })
            .collect())
    }

    /// Window-average predicted score; confidence scales with how close `sample_count`
    /// comes to filling the window (§4.5 Queries).
    pub async fn predicted_score(&self, window: i64) -> StorageResult<PredictedScore> {
        let row = sqlx::query(
            "SELECT AVG(overall_score) as avg_score, COUNT(*) as sample_count FROM (SELECT overall_score FROM prompt_history ORDER BY analyzed_at DESC LIMIT ?)",
        )
        .bind(window)
        .fetch_one(&self.pool)
        .await?;

        let value: Option<f64> = row.try_get("avg_score").unwrap_or(None);
        let sample_count: i64 = row.get("sample_count");

        let confidence = if sample_count >= window {
            Confidence::High
        } else if sample_count >= window / 2 {
            Confidence::Medium
        } else {
            Confidence::Low
        };

        Ok(PredictedScore { value: value.unwrap_or(0.0), confidence, sample_count })
    }
}

fn rate(count: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn dimension_key(dim: Dimension) -> &'static str {
    match dim {
        Dimension::Goal => "goal",
        Dimension::Output => "output",
        Dimension::Limits => "limits",
        Dimension::Data => "data",
        Dimension::Evaluation => "evaluation",
        Dimension::Next => "next",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::golden::{Grade, Severity};

    async fn test_repo() -> Repository {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        Repository::from_pool(pool, 60)
    }

    fn sample_score(total_each: f32) -> crate::golden::GoldenScore {
        crate::golden::GoldenScore::new(total_each, total_each, total_each, total_each, total_each, total_each)
    }

    #[tokio::test]
    async fn save_and_read_recent() {
        let repo = test_repo().await;
        let score = sample_score(0.8);
        let new = NewAnalysis {
            prompt_text: "fix bug",
            score: &score,
            grade: Grade::B,
            issues: &[],
            improved_prompt: None,
            source_app: None,
            project_path: Some("/proj/a"),
            intent: Some("command"),
            category: Some("bug-fix"),
        };
        let id = repo.save_analysis(&new).await.unwrap();
        assert!(id > 0);

        let recent = repo.recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].overall_score, 80);
    }

    #[tokio::test]
    async fn weak_dimension_increments_personal_tip() {
        let repo = test_repo().await;
        let score = sample_score(0.2);
        let new = NewAnalysis {
            prompt_text: "fix bug",
            score: &score,
            grade: Grade::F,
            issues: &[Issue {
                severity: Severity::High,
                category: Dimension::Goal,
                message: "m".to_string(),
                suggestion: "s".to_string(),
            }],
            improved_prompt: None,
            source_app: None,
            project_path: None,
            intent: None,
            category: None,
        };
        repo.save_analysis(&new).await.unwrap();
        repo.save_analysis(&new).await.unwrap();

        let tip: (i64,) = sqlx::query_as("SELECT frequency FROM personal_tips WHERE weakness_type = 'goal'")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(tip.0, 2);
    }

    #[tokio::test]
    async fn project_stats_none_when_empty() {
        let repo = test_repo().await;
        let stats = repo.project_stats("/proj/missing").await.unwrap();
        assert!(stats.is_none());
    }
}
