// src/rewrite/rule.rs
// Deterministic rule-based variant generation (SPEC_FULL.md §4.3). Pure and synchronous.

use lazy_static::lazy_static;
use regex::Regex;

use super::extract::{dedup_against, extract_code_blocks, extract_errors, extract_inline_references};
use super::{preprocess, Variant, VariantKind};
use crate::classifier::{Classification, TaskCategory};
use crate::golden::{Dimension, GoldenScore};
use crate::prompt::SessionContext;

lazy_static! {
    static ref BUGFIX_RE: Regex = Regex::new(r"(?i)(버그|오류|에러|bug|error|fix)").unwrap();
    static ref TEST_RE: Regex = Regex::new(r"(?i)(테스트|test)").unwrap();
    static ref DOC_RE: Regex = Regex::new(r"(?i)(문서|주석|document|readme)").unwrap();
    static ref REVIEW_RE: Regex = Regex::new(r"(?i)(리뷰|검토|review)").unwrap();
    static ref REFACTOR_RE: Regex = Regex::new(r"(?i)(리팩토링|refactor)").unwrap();
}

/// Independent lightweight category tag scan, used for the comprehensive section header
/// even when the main classifier returned `Unknown` (§4.3 "Category detection inside rewriter").
fn detect_category_tag(text: &str) -> &'static str {
    if BUGFIX_RE.is_match(text) {
        "버그 수정"
    } else if TEST_RE.is_match(text) {
        "테스트"
    } else if DOC_RE.is_match(text) {
        "문서화"
    } else if REVIEW_RE.is_match(text) {
        "코드 리뷰"
    } else if REFACTOR_RE.is_match(text) {
        "리팩토링"
    } else {
        "일반 작업"
    }
}

fn category_output_clause(category: TaskCategory) -> &'static str {
    match category {
        TaskCategory::CodeGeneration => "동작하는 코드와 간단한 사용 예시",
        TaskCategory::CodeReview => "개선 제안 목록과 근거",
        TaskCategory::BugFix => "원인 설명과 수정된 코드",
        TaskCategory::Refactoring => "리팩토링된 코드와 변경 이유",
        TaskCategory::Explanation => "단계별 설명",
        TaskCategory::Documentation => "완성된 문서 초안",
        TaskCategory::Testing => "테스트 코드와 커버리지 요약",
        TaskCategory::Architecture => "구조 다이어그램 설명과 트레이드오프",
        TaskCategory::Deployment => "배포 절차와 체크리스트",
        TaskCategory::DataAnalysis => "분석 결과와 시각화 설명",
        TaskCategory::General | TaskCategory::Unknown => "명확한 결과물",
    }
}

fn category_success_criteria(category: TaskCategory) -> &'static str {
    match category {
        TaskCategory::BugFix => "재현 케이스가 더 이상 실패하지 않아야 함",
        TaskCategory::Testing => "모든 테스트가 통과해야 함",
        TaskCategory::Refactoring => "기존 동작이 그대로 유지되어야 함",
        TaskCategory::Documentation => "모든 공개 API가 문서화되어야 함",
        TaskCategory::Deployment => "배포 후 헬스체크가 통과해야 함",
        _ => "요청한 결과물이 명시된 조건을 만족해야 함",
    }
}

/// Tech-stack-specific constraint phrases (§4.3 comprehensive `제약` section).
fn tech_constraint(name: &str) -> Option<&'static str> {
    match name.to_lowercase().as_str() {
        "typescript" => Some("TypeScript: 타입 안정성 유지, strict mode 기준 작성"),
        "react" => Some("React: 훅(hooks) 규칙 준수"),
        "firebase" => Some("Firebase: 보안 규칙과 비용을 함께 고려"),
        "vue" => Some("Vue: Composition API 사용"),
        "next.js" | "nextjs" => Some("Next.js: App Router와 SSR 동작을 고려"),
        "electron" => Some("Electron: main/renderer 프로세스 분리 유지"),
        "node.js" | "node" => Some("Node.js: async/await 기반으로 작성"),
        "vite" => Some("Vite: HMR을 깨뜨리지 않도록 작성"),
        "tailwind" | "tailwindcss" => Some("Tailwind: 기존 테마 토큰을 활용"),
        _ => None,
    }
}

fn tech_constraints(tech_stack: &[String]) -> Vec<&'static str> {
    tech_stack.iter().filter_map(|t| tech_constraint(t)).collect()
}

/// One targeted patch per weakest dimension, applied to `base`. Returns the patched text
/// and a human description of the change for `key_changes`.
fn patch_for_dimension(
    dim: Dimension,
    base: &str,
    category: TaskCategory,
    tech_stack: &[String],
) -> (String, String) {
    match dim {
        Dimension::Goal => {
            let tag = detect_category_tag(base);
            (
                format!("[{tag}] {base} — 구체적으로 무엇을 어떻게 해야 하는지 명시해주세요."),
                "목표를 명확히 하는 태그와 문구 추가".to_string(),
            )
        }
        Dimension::Output => (
            format!("{base}\n\n출력: {}", category_output_clause(category)),
            "원하는 출력 형식 명시".to_string(),
        ),
        Dimension::Limits => {
            let constraints = tech_constraints(tech_stack);
            if constraints.is_empty() {
                (
                    format!("{base}\n\n제약: 간결하게, 불필요한 변경 없이."),
                    "간결성 제약 추가".to_string(),
                )
            } else {
                (
                    format!("{base}\n\n제약: {}", constraints.join("; ")),
                    "기술 스택 제약 조건 추가".to_string(),
                )
            }
        }
        Dimension::Data => (base.to_string(), "참조할 프로젝트 컨텍스트 없음".to_string()),
        Dimension::Evaluation => (
            format!("{base}\n\n완료 조건: {}", category_success_criteria(category)),
            "성공 기준 추가".to_string(),
        ),
        Dimension::Next => (
            format!("{base}\n\n다음 단계: 결과를 확인한 뒤 후속 작업을 진행해주세요."),
            "다음 단계 안내 추가".to_string(),
        ),
    }
}

fn conservative_variant(
    text: &str,
    score: &GoldenScore,
    category: TaskCategory,
    session: Option<&SessionContext>,
) -> Variant {
    let weakest = score.weakest();
    let tech_stack = session.map(|s| s.tech_stack.clone()).unwrap_or_default();

    if score.get(weakest) >= 0.8 {
        return Variant {
            kind: VariantKind::Conservative,
            text: text.to_string(),
            key_changes: vec!["이미 잘 작성됨".to_string()],
            confidence: 0.6,
            ai_explanation: None,
            origin_temperature: None,
            needs_setup: false,
        };
    }

    let (patched, change) = patch_for_dimension(weakest, text, category, &tech_stack);
    Variant {
        kind: VariantKind::Conservative,
        text: patched,
        key_changes: vec![change],
        confidence: 0.6,
        ai_explanation: None,
        origin_temperature: None,
        needs_setup: false,
    }
}

fn current_situation_section(session: &SessionContext) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(name) = &session.project_name {
        lines.push(format!("- 프로젝트: {name}"));
    }
    if !session.tech_stack.is_empty() {
        let preview: Vec<_> = session.tech_stack.iter().take(5).cloned().collect();
        lines.push(format!("- 기술 스택: {}", preview.join(", ")));
    }
    if session.has_meaningful_task() {
        let task = session.current_task.as_deref().unwrap_or_default();
        let truncated: String = task.chars().take(120).collect();
        lines.push(format!("- 진행 중인 작업: {truncated}"));
    }
    if let Some(branch) = session.non_default_branch() {
        lines.push(format!("- 브랜치: {branch}"));
    }
    if let Some(last) = &session.last_exchange {
        if let Some(summary) = &last.summary {
            lines.push(format!("- 이전 작업 요약: {summary}"));
        }
        if !last.modified_files.is_empty() {
            let files: Vec<_> = last.modified_files.iter().take(3).cloned().collect();
            lines.push(format!("- 최근 수정 파일: {}", files.join(", ")));
        }
    }

    if lines.is_empty() {
        None
    } else {
        Some(format!("현재 상황:\n{}", lines.join("\n")))
    }
}

fn balanced_variant(
    text: &str,
    score: &GoldenScore,
    category: TaskCategory,
    session: Option<&SessionContext>,
) -> Variant {
    let [first, second] = score.weakest_two();
    let tech_stack = session.map(|s| s.tech_stack.clone()).unwrap_or_default();

    let (mut patched, change_one) = patch_for_dimension(first, text, category, &tech_stack);
    let (patched2, change_two) = patch_for_dimension(second, &patched, category, &tech_stack);
    patched = patched2;

    let mut key_changes = vec![change_one, change_two];
    let mut confidence: f32 = 0.75;

    if let Some(session) = session {
        if let Some(section) = current_situation_section(session) {
            patched = format!("{patched}\n\n{section}");
            key_changes.push("세션 컨텍스트 기반 현재 상황 추가".to_string());
            confidence += 0.05;
        }
    }

    Variant {
        kind: VariantKind::Balanced,
        text: patched,
        key_changes,
        confidence: confidence.min(1.0),
        ai_explanation: None,
        origin_temperature: None,
        needs_setup: false,
    }
}

/// Remove fenced code blocks and error/stack lines from `text`, leaving the plain
/// instruction behind for the comprehensive variant's 요청 section.
fn strip_extracted(text: &str) -> String {
    lazy_static! {
        static ref FENCE: Regex = Regex::new(r"(?s)```.*?```").unwrap();
        static ref ERROR_LINE: Regex = Regex::new(
            r"(?m)^.*(TypeError|ReferenceError|SyntaxError|RangeError|Error):.*$\n?"
        ).unwrap();
        static ref STACK_FRAME: Regex =
            Regex::new(r"(?m)^\s*at\s+\S+\s+\([^)]+:\d+:\d+\)\s*$\n?").unwrap();
        static ref BLANK_LINES: Regex = Regex::new(r"\n{3,}").unwrap();
    }
    let without_fences = FENCE.replace_all(text, "");
    let without_errors = ERROR_LINE.replace_all(&without_fences, "");
    let without_stack = STACK_FRAME.replace_all(&without_errors, "");
    BLANK_LINES.replace_all(&without_stack, "\n\n").trim().to_string()
}

fn comprehensive_variant(
    text: &str,
    category: TaskCategory,
    session: Option<&SessionContext>,
) -> Variant {
    let tag = detect_category_tag(text);
    let tech_stack = session.map(|s| s.tech_stack.clone()).unwrap_or_default();
    let constraints = tech_constraints(&tech_stack);

    let code_blocks = extract_code_blocks(text);
    let errors = extract_errors(text);

    // 요청 carries the verb/object instruction with fenced code and error lines pulled
    // out — they resurface verbatim in 참조 코드 / 참조 에러 instead of being duplicated.
    let request_body = strip_extracted(text);
    let inline_refs = dedup_against(extract_inline_references(text), &request_body);

    let mut sections = Vec::new();
    sections.push(format!("요청 [{tag}]:\n{}", request_body.trim()));
    sections.push(format!("출력:\n{}", category_output_clause(category)));

    if constraints.is_empty() {
        sections.push("제약:\n- 불필요한 범위 확장 없이 간결하게".to_string());
    } else {
        let lines: Vec<String> = constraints.iter().map(|c| format!("- {c}")).collect();
        sections.push(format!("제약:\n{}", lines.join("\n")));
    }

    if !code_blocks.is_empty() || !inline_refs.is_empty() {
        let mut lines = Vec::new();
        for block in &code_blocks {
            lines.push(format!("```\n{block}\n```"));
        }
        for r in &inline_refs {
            lines.push(format!("`{r}`"));
        }
        sections.push(format!("참조 코드:\n{}", lines.join("\n")));
    }

    if !errors.is_empty() {
        sections.push(format!("참조 에러:\n{}", errors.join("\n")));
    }

    sections.push(format!("완료 조건:\n{}", category_success_criteria(category)));

    let confidence = if session.is_some() { 0.88 } else { 0.7 };

    Variant {
        kind: VariantKind::Comprehensive,
        text: sections.join("\n\n"),
        key_changes: vec!["구조화된 섹션으로 재구성".to_string()],
        confidence,
        ai_explanation: None,
        origin_temperature: None,
        needs_setup: false,
    }
}

/// Generate the three deterministic variants (§4.3 contract).
pub fn generate_variants(
    text: &str,
    score: &GoldenScore,
    classification: &Classification,
    session: Option<&SessionContext>,
) -> [Variant; 3] {
    let cleaned = preprocess(text);
    let category = classification.task_category;

    [
        conservative_variant(&cleaned, score, category, session),
        balanced_variant(&cleaned, score, category, session),
        comprehensive_variant(&cleaned, category, session),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::features::Features;
    use crate::golden::rules::score as rule_score;

    #[test]
    fn conservative_targets_weakest_dimension() {
        let text = "fix bug";
        let c = classify(text);
        let f = Features::extract(text);
        let score = rule_score(text, &f, &c);
        let [conservative, ..] = generate_variants(text, &score, &c, None);
        assert!(!conservative.text.is_empty());
        assert_eq!(conservative.confidence, 0.6);
    }

    #[test]
    fn balanced_variant_includes_tech_stack() {
        let text = "버그 수정해줘";
        let c = classify(text);
        let f = Features::extract(text);
        let score = rule_score(text, &f, &c);
        let session = SessionContext {
            tech_stack: vec!["TypeScript".to_string(), "React".to_string()],
            ..Default::default()
        };
        let [_, balanced, _] = generate_variants(text, &score, &c, Some(&session));
        assert!(balanced.text.contains("TypeScript"));
        assert!(balanced.text.contains("React"));
    }

    #[test]
    fn comprehensive_variant_has_required_sections() {
        let text = "fix bug";
        let c = classify(text);
        let f = Features::extract(text);
        let score = rule_score(text, &f, &c);
        let [.., comprehensive] = generate_variants(text, &score, &c, None);
        assert!(comprehensive.text.contains("요청"));
        assert!(comprehensive.text.contains("출력"));
        assert!(comprehensive.text.contains("완료 조건"));
    }

    #[test]
    fn comprehensive_variant_does_not_duplicate_code_block() {
        let text = "fix this\n```rust\nfn main() {}\n```";
        let c = classify(text);
        let f = Features::extract(text);
        let score = rule_score(text, &f, &c);
        let [.., comprehensive] = generate_variants(text, &score, &c, None);
        let occurrences = comprehensive.text.matches("fn main() {}").count();
        assert_eq!(occurrences, 1);
    }
}
