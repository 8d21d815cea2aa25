// src/golden/mod.rs
// GOLDEN evaluator: six-dimension rule scoring, optional LLM-judge merge, grading.

pub mod judge;
pub mod rules;

use serde::{Deserialize, Serialize};

use crate::classifier::Classification;
use crate::config::analysis::GradeBoundaries;
use crate::features::Features;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// `grade` is a pure function of `total` in [0,1] (§3 invariant).
    pub fn from_total(total: f32, boundaries: &GradeBoundaries) -> Self {
        if total >= boundaries.a {
            Grade::A
        } else if total >= boundaries.b {
            Grade::B
        } else if total >= boundaries.c {
            Grade::C
        } else if total >= boundaries.d {
            Grade::D
        } else {
            Grade::F
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum Dimension {
    Goal,
    Output,
    Limits,
    Data,
    Evaluation,
    Next,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::Goal,
        Dimension::Output,
        Dimension::Limits,
        Dimension::Data,
        Dimension::Evaluation,
        Dimension::Next,
    ];
}

/// Six-dimension prompt-quality score, each in [0,1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GoldenScore {
    pub goal: f32,
    pub output: f32,
    pub limits: f32,
    pub data: f32,
    pub evaluation: f32,
    pub next: f32,
    pub total: f32,
}

impl GoldenScore {
    pub fn new(goal: f32, output: f32, limits: f32, data: f32, evaluation: f32, next: f32) -> Self {
        let total = (goal + output + limits + data + evaluation + next) / 6.0;
        Self { goal, output, limits, data, evaluation, next, total }
    }

    pub fn get(&self, dim: Dimension) -> f32 {
        match dim {
            Dimension::Goal => self.goal,
            Dimension::Output => self.output,
            Dimension::Limits => self.limits,
            Dimension::Data => self.data,
            Dimension::Evaluation => self.evaluation,
            Dimension::Next => self.next,
        }
    }

    /// The single lowest-scoring dimension. Ties break toward the earlier `Dimension::ALL` entry.
    pub fn weakest(&self) -> Dimension {
        Dimension::ALL
            .iter()
            .copied()
            .min_by(|a, b| self.get(*a).partial_cmp(&self.get(*b)).unwrap())
            .unwrap()
    }

    /// The two lowest-scoring dimensions, weakest first.
    pub fn weakest_two(&self) -> [Dimension; 2] {
        let mut dims = Dimension::ALL;
        dims.sort_by(|a, b| self.get(*a).partial_cmp(&self.get(*b)).unwrap());
        [dims[0], dims[1]]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub category: Dimension,
    pub message: String,
    pub suggestion: String,
}

fn severity_for(score: f32) -> Severity {
    if score < 0.2 {
        Severity::High
    } else if score < 0.35 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn issue_for(dim: Dimension, score: f32) -> Issue {
    let (message, suggestion) = match dim {
        Dimension::Goal => (
            "목표가 불분명합니다 (goal is unclear)",
            "구체적인 행동과 대상을 명시하세요 (state a concrete action and target)",
        ),
        Dimension::Output => (
            "원하는 출력 형식이 명시되지 않았습니다 (desired output format is unspecified)",
            "출력 형식을 지정하세요, 예: JSON, 표, 코드 블록 (specify a format: JSON, table, code block)",
        ),
        Dimension::Limits => (
            "제약 조건이 없습니다 (no constraints given)",
            "기술 스택이나 제한 사항을 명시하세요 (name the tech stack or limitations)",
        ),
        Dimension::Data => (
            "참조할 데이터나 컨텍스트가 부족합니다 (missing reference data or context)",
            "코드, 파일 경로, 에러 메시지를 포함하세요 (include code, a file path, or an error message)",
        ),
        Dimension::Evaluation => (
            "성공 기준이 명시되지 않았습니다 (no success criteria given)",
            "완료 조건이나 테스트 기준을 추가하세요 (add a definition of done or test criteria)",
        ),
        Dimension::Next => (
            "다음 단계가 불분명합니다 (next steps are unclear)",
            "후속 작업이나 연계 작업을 언급하세요 (mention the follow-up step)",
        ),
    };
    Issue {
        severity: severity_for(score),
        category: dim,
        message: message.to_string(),
        suggestion: suggestion.to_string(),
    }
}

/// Rule-based scoring + issue emission (§4.2 contract). Pure.
pub fn evaluate_rule_based(
    text: &str,
    features: &Features,
    classification: &Classification,
    weakness_threshold: f32,
) -> (GoldenScore, Vec<Issue>) {
    let score = rules::score(text, features, classification);

    let mut issues: Vec<Issue> = Dimension::ALL
        .iter()
        .filter(|d| score.get(**d) < weakness_threshold)
        .map(|d| issue_for(*d, score.get(*d)))
        .collect();

    issues.sort_by(|a, b| severity_rank(a.severity).cmp(&severity_rank(b.severity)));
    (score, issues)
}

fn severity_rank(s: Severity) -> u8 {
    match s {
        Severity::High => 0,
        Severity::Medium => 1,
        Severity::Low => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_mean_of_dimensions() {
        let score = GoldenScore::new(0.1, 0.2, 0.3, 0.4, 0.5, 0.6);
        assert!((score.total - 0.35).abs() < 1e-6);
    }

    #[test]
    fn grade_boundaries_are_applied() {
        let b = GradeBoundaries::default();
        assert_eq!(Grade::from_total(0.95, &b), Grade::A);
        assert_eq!(Grade::from_total(0.8, &b), Grade::B);
        assert_eq!(Grade::from_total(0.65, &b), Grade::C);
        assert_eq!(Grade::from_total(0.5, &b), Grade::D);
        assert_eq!(Grade::from_total(0.1, &b), Grade::F);
    }

    #[test]
    fn weakest_dimension_is_lowest() {
        let score = GoldenScore::new(0.9, 0.9, 0.1, 0.9, 0.9, 0.9);
        assert_eq!(score.weakest(), Dimension::Limits);
    }

    #[test]
    fn weakness_issues_only_below_threshold() {
        let c = crate::classifier::classify("fix bug");
        let f = Features::extract("fix bug");
        let (score, issues) = evaluate_rule_based("fix bug", &f, &c, 0.5);
        assert!(issues.len() <= 6);
        for issue in &issues {
            assert!(score.get(issue.category) < 0.5);
        }
    }
}
