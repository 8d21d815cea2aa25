// src/classifier/mod.rs
// Bilingual intent + task-category classifier (SPEC_FULL.md §4.1)

pub mod keywords;

use serde::{Deserialize, Serialize};

use crate::features::{Complexity, Features};
use keywords::{category_keywords, intent_keywords};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Command,
    Question,
    Instruction,
    Feedback,
    Context,
    Clarification,
    Unknown,
}

impl Intent {
    const ALL: [Intent; 6] = [
        Intent::Command,
        Intent::Question,
        Intent::Instruction,
        Intent::Feedback,
        Intent::Context,
        Intent::Clarification,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskCategory {
    CodeGeneration,
    CodeReview,
    BugFix,
    Refactoring,
    Explanation,
    Documentation,
    Testing,
    Architecture,
    Deployment,
    DataAnalysis,
    General,
    Unknown,
}

impl TaskCategory {
    const ALL: [TaskCategory; 10] = [
        TaskCategory::CodeGeneration,
        TaskCategory::CodeReview,
        TaskCategory::BugFix,
        TaskCategory::Refactoring,
        TaskCategory::Explanation,
        TaskCategory::Documentation,
        TaskCategory::Testing,
        TaskCategory::Architecture,
        TaskCategory::Deployment,
        TaskCategory::DataAnalysis,
    ];
}

/// Kebab-case slug used as the persisted `category` column and as the key into
/// `recommend::category_label` (§4.5, §4.6).
pub fn category_slug(category: TaskCategory) -> &'static str {
    match category {
        TaskCategory::CodeGeneration => "code-generation",
        TaskCategory::CodeReview => "code-review",
        TaskCategory::BugFix => "bug-fix",
        TaskCategory::Refactoring => "refactoring",
        TaskCategory::Explanation => "explanation",
        TaskCategory::Documentation => "documentation",
        TaskCategory::Testing => "testing",
        TaskCategory::Architecture => "architecture",
        TaskCategory::Deployment => "deployment",
        TaskCategory::DataAnalysis => "data-analysis",
        TaskCategory::General | TaskCategory::Unknown => "general",
    }
}

/// Lowercase slug used as the persisted `intent` column.
pub fn intent_slug(intent: Intent) -> &'static str {
    match intent {
        Intent::Command => "command",
        Intent::Question => "question",
        Intent::Instruction => "instruction",
        Intent::Feedback => "feedback",
        Intent::Context => "context",
        Intent::Clarification => "clarification",
        Intent::Unknown => "unknown",
    }
}

/// Result of classifying a prompt (SPEC_FULL.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    pub intent_confidence: f32,
    pub task_category: TaskCategory,
    pub category_confidence: f32,
    pub matched_keywords: Vec<String>,
}

/// Normalization constant dividing raw keyword score into a confidence in [0, 0.95].
const NORMALIZATION_CONSTANT: f32 = 3.0;
/// Question-mark bonus added directly to the `question` intent's raw score.
const QUESTION_MARK_BONUS: f32 = 1.2;
/// Keywords in the first quarter of the text are weighted by this multiplier.
const POSITION_MULTIPLIER: f32 = 1.5;

struct ScoredMatch {
    score: f32,
    matched: Vec<String>,
}

fn score_keywords(text: &str, keywords: &[keywords::Keyword]) -> ScoredMatch {
    let lower = text.to_lowercase();
    let quarter_len = (lower.chars().count() / 4).max(1);
    let quarter_prefix: String = lower.chars().take(quarter_len).collect();

    let mut score = 0.0;
    let mut matched = Vec::new();
    for keyword in keywords {
        if lower.contains(keyword.word) {
            let in_prefix = quarter_prefix.contains(keyword.word);
            let multiplier = if in_prefix { POSITION_MULTIPLIER } else { 1.0 };
            score += keyword.weight * multiplier;
            matched.push(keyword.word.to_string());
        }
    }
    ScoredMatch { score, matched }
}

fn classify_intent(text: &str, features: &Features) -> (Intent, f32, Vec<String>) {
    let mut best: Option<(Intent, f32, Vec<String>)> = None;

    for &intent in Intent::ALL.iter() {
        let mut scored = score_keywords(text, intent_keywords(intent));
        if intent == Intent::Question && features.has_question_mark {
            scored.score += QUESTION_MARK_BONUS;
        }
        if scored.score > 0.0 && best.as_ref().map(|(_, s, _)| scored.score > *s).unwrap_or(true) {
            best = Some((intent, scored.score, scored.matched));
        }
    }

    match best {
        Some((intent, raw_score, matched)) => {
            let confidence = (raw_score / NORMALIZATION_CONSTANT).min(0.95);
            (intent, confidence, matched)
        }
        None => {
            if features.has_question_mark {
                (Intent::Question, 0.6, Vec::new())
            } else if features.complexity != Complexity::Simple {
                (Intent::Instruction, 0.45, Vec::new())
            } else {
                (Intent::Unknown, 0.4, Vec::new())
            }
        }
    }
}

fn classify_category(text: &str) -> (TaskCategory, f32, Vec<String>) {
    let mut best: Option<(TaskCategory, f32, Vec<String>)> = None;

    for &category in TaskCategory::ALL.iter() {
        let scored = score_keywords(text, category_keywords(category));
        if scored.score > 0.0 && best.as_ref().map(|(_, s, _)| scored.score > *s).unwrap_or(true) {
            best = Some((category, scored.score, scored.matched));
        }
    }

    match best {
        Some((category, raw_score, matched)) => {
            let confidence = (raw_score / NORMALIZATION_CONSTANT).min(0.95);
            (category, confidence, matched)
        }
        None => (TaskCategory::General, 0.3, Vec::new()),
    }
}

/// Classify prompt text into intent + task category. Deterministic and pure (§4.1 contract).
pub fn classify(text: &str) -> Classification {
    if text.trim().is_empty() {
        return Classification {
            intent: Intent::Unknown,
            intent_confidence: 0.2,
            task_category: TaskCategory::Unknown,
            category_confidence: 0.2,
            matched_keywords: Vec::new(),
        };
    }

    let features = Features::extract(text);
    let (intent, intent_confidence, mut intent_matches) = classify_intent(text, &features);
    let (task_category, category_confidence, category_matches) = classify_category(text);

    intent_matches.extend(category_matches);
    intent_matches.sort();
    intent_matches.dedup();

    Classification {
        intent,
        intent_confidence,
        task_category,
        category_confidence,
        matched_keywords: intent_matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_prompt_is_unknown() {
        let c = classify("");
        assert_eq!(c.intent, Intent::Unknown);
        assert_eq!(c.task_category, TaskCategory::Unknown);
        assert!(c.intent_confidence >= 0.2 && c.intent_confidence <= 0.4);
    }

    #[test]
    fn vague_bug_fix_prompt() {
        let c = classify("fix bug");
        assert_eq!(c.task_category, TaskCategory::BugFix);
    }

    #[test]
    fn korean_command_is_detected() {
        let c = classify("버그 수정해줘");
        assert_eq!(c.intent, Intent::Command);
        assert_eq!(c.task_category, TaskCategory::BugFix);
    }

    #[test]
    fn question_without_keyword_falls_back() {
        let c = classify("this is something?");
        assert_eq!(c.intent, Intent::Question);
        assert_eq!(c.intent_confidence, 0.6);
    }

    #[test]
    fn determinism() {
        let a = classify("리팩토링 해줘 src/main.rs");
        let b = classify("리팩토링 해줘 src/main.rs");
        assert_eq!(a.intent, b.intent);
        assert_eq!(a.task_category, b.task_category);
        assert_eq!(a.intent_confidence, b.intent_confidence);
    }

    #[test]
    fn confidence_is_bounded() {
        let c = classify("해줘 해줘 실행 해주세요 만들어 추가해 삭제해 수정해");
        assert!(c.intent_confidence <= 0.95);
    }

    #[test]
    fn category_slug_is_kebab_case() {
        assert_eq!(category_slug(TaskCategory::BugFix), "bug-fix");
        assert_eq!(category_slug(TaskCategory::Unknown), "general");
    }

    #[test]
    fn intent_slug_is_lowercase() {
        assert_eq!(intent_slug(Intent::Command), "command");
    }
}
