// src/recommend/mod.rs
// History-aware recommendation engine (SPEC_FULL.md §4.6). Grounded on the
// storage-backed scoring/sort-and-cap shape of patterns/matcher.rs.

use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::history::aggregates::{DimensionAverages, ProjectStats};
use crate::history::Repository;

const MAX_RECOMMENDATIONS: usize = 5;
const REFERENCE_EXAMPLE_MAX_CHARS: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// One of four recommendation shapes (§9 design note: tagged variants, not a dynamically
/// typed payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Recommendation {
    Weakness { dimension: String, score: f64, priority: Priority, message: String },
    Pattern { dimension: String, score: f64, priority: Priority, message: String },
    Reference { example_prompt: String, priority: Priority, message: String },
    Improvement { gap: f64, target: f64, priority: Priority, message: String },
}

impl Recommendation {
    fn priority(&self) -> Priority {
        match self {
            Recommendation::Weakness { priority, .. }
            | Recommendation::Pattern { priority, .. }
            | Recommendation::Reference { priority, .. }
            | Recommendation::Improvement { priority, .. } => *priority,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub score_diff: f64,
    pub better_than_average: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrichment {
    pub recommendations: Vec<Recommendation>,
    pub comparison: Option<Comparison>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectPatternAnalysis {
    pub project_path: String,
    pub dimension_averages: DimensionAverages,
    pub weaknesses: Vec<(String, f64)>,
}

fn korean_label(dim: &str) -> &'static str {
    match dim {
        "goal" => "목표",
        "output" => "출력",
        "limits" => "제약",
        "data" => "데이터",
        "evaluation" => "평가",
        "next" => "다음 단계",
        _ => "알 수 없음",
    }
}

/// Fixed code -> human label mapping for category titles (§4.6). An unknown code is
/// used verbatim as its own label.
pub fn category_label(category: &str) -> String {
    match category {
        "code-generation" => "코드 생성".to_string(),
        "code-review" => "코드 리뷰".to_string(),
        "bug-fix" => "버그 수정".to_string(),
        "refactoring" => "리팩토링".to_string(),
        "explanation" => "설명".to_string(),
        "documentation" => "문서화".to_string(),
        "testing" => "테스트".to_string(),
        "architecture" => "아키텍처".to_string(),
        "deployment" => "배포".to_string(),
        "data-analysis" => "데이터 분석".to_string(),
        "general" => "일반".to_string(),
        other => other.to_string(),
    }
}

fn dimension_pairs(avgs: &DimensionAverages) -> [(&'static str, f64); 6] {
    [
        ("goal", avgs.goal),
        ("output", avgs.output),
        ("limits", avgs.limits),
        ("data", avgs.data),
        ("evaluation", avgs.evaluation),
        ("next", avgs.next),
    ]
}

/// Top two weakest project dimensions, ascending (lowest first).
fn weakest_two(avgs: &DimensionAverages) -> Vec<(&'static str, f64)> {
    let mut pairs: Vec<_> = dimension_pairs(avgs).to_vec();
    pairs.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    pairs.into_iter().take(2).collect()
}

/// Build a standalone report of a project's weakest dimensions.
pub async fn analyze_project_patterns(
    repo: &Repository,
    project_path: &str,
) -> StorageResult<Option<ProjectPatternAnalysis>> {
    let stats = match repo.project_stats(project_path).await? {
        Some(stats) => stats,
        None => return Ok(None),
    };

    let weaknesses = weakest_two(&stats.dimension_averages)
        .into_iter()
        .map(|(dim, score)| (dim.to_string(), score))
        .collect();

    Ok(Some(ProjectPatternAnalysis {
        project_path: project_path.to_string(),
        dimension_averages: stats.dimension_averages,
        weaknesses,
    }))
}

fn weakness_recommendations(stats: &ProjectStats) -> Vec<Recommendation> {
    let top_two = weakest_two(&stats.dimension_averages);
    top_two
        .into_iter()
        .enumerate()
        .map(|(i, (dim, score))| {
            let priority = if i == 0 { Priority::High } else { Priority::Medium };
            Recommendation::Weakness {
                dimension: dim.to_string(),
                score,
                priority,
                message: format!("{} 항목이 약점입니다 (평균 {:.0}점)", korean_label(dim), score),
            }
        })
        .collect()
}

fn pattern_recommendation(stats: &ProjectStats) -> Option<Recommendation> {
    let (dim, score) = dimension_pairs(&stats.dimension_averages)
        .into_iter()
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())?;

    if score > 70.0 {
        return None;
    }

    Some(Recommendation::Pattern {
        dimension: dim.to_string(),
        score,
        priority: Priority::Medium,
        message: format!("{} 항목에 집중해보세요 (평균 {:.0}점)", korean_label(dim), score),
    })
}

fn truncate_example(text: &str) -> String {
    if text.chars().count() <= REFERENCE_EXAMPLE_MAX_CHARS {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(REFERENCE_EXAMPLE_MAX_CHARS).collect();
        format!("{truncated}…")
    }
}

fn improvement_recommendation(avg_overall: f64) -> Option<Recommendation> {
    if avg_overall < 60.0 {
        Some(Recommendation::Improvement {
            gap: 60.0 - avg_overall,
            target: 60.0,
            priority: Priority::High,
            message: "전체 평균 점수를 60점 이상으로 끌어올려보세요".to_string(),
        })
    } else if avg_overall < 75.0 {
        Some(Recommendation::Improvement {
            gap: 75.0 - avg_overall,
            target: 75.0,
            priority: Priority::Medium,
            message: "전체 평균 점수를 75점 이상으로 끌어올려보세요".to_string(),
        })
    } else {
        None
    }
}

fn comparison_message(diff: f64) -> Option<String> {
    if diff >= 10.0 {
        Some("크게 개선되었습니다".to_string())
    } else if diff >= 5.0 {
        Some("개선되었습니다".to_string())
    } else if diff <= -10.0 {
        Some("품질이 낮습니다".to_string())
    } else {
        None
    }
}

fn project_average_overall(stats: &ProjectStats) -> f64 {
    let avgs = &stats.dimension_averages;
    (avgs.goal + avgs.output + avgs.limits + avgs.data + avgs.evaluation + avgs.next) / 6.0
}

/// Attach up to 5 prioritized recommendations plus a project-average comparison to a
/// freshly computed analysis (§4.6 `enrich_analysis`).
pub async fn enrich_analysis(
    repo: &Repository,
    overall_score: i64,
    category: Option<&str>,
    project_path: Option<&str>,
) -> StorageResult<Enrichment> {
    let mut recommendations = Vec::new();
    let mut comparison = None;

    if let Some(project_path) = project_path {
        if let Some(stats) = repo.project_stats(project_path).await? {
            recommendations.extend(weakness_recommendations(&stats));
            recommendations.extend(pattern_recommendation(&stats));
            recommendations.extend(improvement_recommendation(project_average_overall(&stats)));

            let avg_overall = project_average_overall(&stats);
            let score_diff = overall_score as f64 - avg_overall;
            comparison = Some(Comparison {
                score_diff,
                better_than_average: score_diff > 0.0,
                message: comparison_message(score_diff),
            });
        }
    }

    if let Some(category) = category {
        if let Some(example) = repo
            .similar_by_category(category, None, 1)
            .await?
            .into_iter()
            .find(|r| r.overall_score >= 80)
        {
            recommendations.push(Recommendation::Reference {
                example_prompt: truncate_example(&example.prompt_text),
                priority: Priority::Low,
                message: format!("{} 카테고리의 높은 점수 예시를 참고하세요", category_label(category)),
            });
        }
    }

    recommendations.sort_by_key(|r| r.priority());
    recommendations.truncate(MAX_RECOMMENDATIONS);

    Ok(Enrichment { recommendations, comparison })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::aggregates::DimensionWeaknessCounts;

    fn stats(goal: f64, output: f64) -> ProjectStats {
        ProjectStats {
            project_path: "/proj/a".to_string(),
            sample_count: 10,
            dimension_averages: DimensionAverages {
                goal,
                output,
                limits: 80.0,
                data: 80.0,
                evaluation: 80.0,
                next: 80.0,
            },
            weakness_counts: DimensionWeaknessCounts::default(),
        }
    }

    #[test]
    fn weakness_recommendations_prioritize_top_two() {
        let s = stats(40.0, 50.0);
        let recs = weakness_recommendations(&s);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].priority(), Priority::High);
        assert_eq!(recs[1].priority(), Priority::Medium);
    }

    #[test]
    fn pattern_skipped_above_seventy() {
        let s = stats(75.0, 80.0);
        assert!(pattern_recommendation(&s).is_none());
    }

    #[test]
    fn truncate_example_adds_ellipsis() {
        let long = "x".repeat(200);
        let out = truncate_example(&long);
        assert!(out.ends_with('…'));
        assert!(out.chars().count() <= 151);
    }

    #[test]
    fn truncate_example_keeps_short_text_verbatim() {
        let short = "fix bug";
        assert_eq!(truncate_example(short), short);
    }

    #[test]
    fn unknown_category_label_is_verbatim() {
        assert_eq!(category_label("something-new"), "something-new");
    }
}
