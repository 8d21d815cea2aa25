// src/golden/rules.rs
// Six independent heuristics behind the GOLDEN rule-based scorer (SPEC_FULL.md §4.2)

use lazy_static::lazy_static;
use regex::Regex;

use super::GoldenScore;
use crate::classifier::Classification;
use crate::features::Features;

lazy_static! {
    static ref GOAL_VERBS: Regex = Regex::new(
        r"(?i)(만들어|구현해|작성해|수정해|고쳐|추가해|삭제해|개선해|create|implement|write|fix|add|remove|refactor|build|generate)"
    ).unwrap();
    static ref OUTPUT_MARKERS: Regex = Regex::new(
        r"(?i)(형식|포맷|출력:|output:|json|yaml|표로|table|bullet|목록으로|마크다운|markdown)"
    ).unwrap();
    static ref LIMITS_MARKERS: Regex = Regex::new(
        r"(?i)(제약|조건|only|without|don't|do not|no more than|제외하고|하지\s?말고|must not|반드시.*말)"
    ).unwrap();
    static ref EVALUATION_MARKERS: Regex = Regex::new(
        r"(?i)(성공\s?기준|완료\s?조건|must|should pass|테스트|test|검증|verify|assert)"
    ).unwrap();
    static ref NEXT_MARKERS: Regex = Regex::new(
        r"(?i)(다음\s?단계|그\s?다음|그리고\s?나서|after that|then|next step|follow(ing)? up|이후에)"
    ).unwrap();
    static ref CONTEXT_MARKER: Regex = Regex::new(r"(?i)(context:|컨텍스트:|배경:)").unwrap();
    static ref ERROR_MARKER: Regex =
        Regex::new(r"(?i)(error|exception|traceback|에러|오류|실패)").unwrap();
}

fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

fn score_goal(text: &str, features: &Features) -> f32 {
    let mut score: f32 = 0.2;
    if GOAL_VERBS.is_match(text) {
        score += 0.45;
    }
    if features.word_count >= 5 {
        score += 0.2;
    }
    if features.length <= 15 {
        score -= 0.3;
    }
    if matches!(
        features.complexity,
        crate::features::Complexity::Moderate | crate::features::Complexity::Complex
    ) {
        score += 0.15;
    }
    clamp01(score)
}

fn score_output(text: &str, classification: &Classification) -> f32 {
    let mut score: f32 = 0.15;
    if OUTPUT_MARKERS.is_match(text) {
        score += 0.65;
    }
    if matches!(
        classification.task_category,
        crate::classifier::TaskCategory::Documentation | crate::classifier::TaskCategory::CodeGeneration
    ) {
        score += 0.1;
    }
    clamp01(score)
}

fn score_limits(text: &str, session_has_stack: bool) -> f32 {
    let mut score: f32 = 0.15;
    if LIMITS_MARKERS.is_match(text) {
        score += 0.6;
    }
    if session_has_stack {
        score += 0.15;
    }
    clamp01(score)
}

fn score_data(text: &str, features: &Features) -> f32 {
    let mut score: f32 = 0.1;
    if features.has_code_block {
        score += 0.45;
    }
    if features.has_file_path {
        score += 0.2;
    }
    if ERROR_MARKER.is_match(text) {
        score += 0.2;
    }
    if CONTEXT_MARKER.is_match(text) {
        score += 0.2;
    }
    clamp01(score)
}

fn score_evaluation(text: &str) -> f32 {
    let mut score: f32 = 0.15;
    if EVALUATION_MARKERS.is_match(text) {
        score += 0.65;
    }
    clamp01(score)
}

fn score_next(text: &str) -> f32 {
    let mut score: f32 = 0.2;
    if NEXT_MARKERS.is_match(text) {
        score += 0.6;
    }
    clamp01(score)
}

/// Score all six dimensions from text + features + classification. Pure (§4.2 contract).
/// `session_has_stack` lets the Limits heuristic use session context without a full
/// dependency on `SessionContext` (the rewriter owns context-weaving, not the scorer).
pub fn score(text: &str, features: &Features, classification: &Classification) -> GoldenScore {
    score_with_context(text, features, classification, false)
}

pub fn score_with_context(
    text: &str,
    features: &Features,
    classification: &Classification,
    session_has_stack: bool,
) -> GoldenScore {
    GoldenScore::new(
        score_goal(text, features),
        score_output(text, classification),
        score_limits(text, session_has_stack),
        score_data(text, features),
        score_evaluation(text),
        score_next(text),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;

    #[test]
    fn vague_prompt_scores_low() {
        let text = "fix bug";
        let f = Features::extract(text);
        let c = classify(text);
        let s = score(text, &f, &c);
        assert!(s.total < 0.4, "expected low total, got {}", s.total);
    }

    #[test]
    fn rich_prompt_scores_higher() {
        let text = "다음 단계로 버그를 수정해줘. 반드시 JSON 형식으로 출력하고, context: src/main.rs 에러 스택트레이스 포함. 성공 기준: 모든 테스트 통과.";
        let f = Features::extract(text);
        let c = classify(text);
        let s = score(text, &f, &c);
        assert!(s.total > 0.5, "expected higher total, got {}", s.total);
    }

    #[test]
    fn determinism() {
        let text = "리팩토링 해줘 src/main.rs, 테스트도 추가해줘";
        let f = Features::extract(text);
        let c = classify(text);
        let a = score(text, &f, &c);
        let b = score(text, &f, &c);
        assert_eq!(a.total, b.total);
    }
}
