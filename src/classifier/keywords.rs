// src/classifier/keywords.rs
// Bilingual keyword tables for intent and task-category scoring (SPEC_FULL.md §4.1)

use crate::classifier::{Intent, TaskCategory};

/// A single keyword signal: the literal to match (case-insensitive) and its weight.
pub struct Keyword {
    pub word: &'static str,
    pub weight: f32,
}

const fn kw(word: &'static str, weight: f32) -> Keyword {
    Keyword { word, weight }
}

pub fn intent_keywords(intent: Intent) -> &'static [Keyword] {
    match intent {
        Intent::Command => &[
            kw("해줘", 1.0), kw("해주세요", 1.0), kw("실행", 0.8), kw("만들어", 0.9),
            kw("추가해", 0.9), kw("삭제해", 0.9), kw("수정해", 0.9),
            kw("run", 0.8), kw("execute", 0.8), kw("create", 0.8), kw("add", 0.7),
            kw("delete", 0.8), kw("remove", 0.8), kw("fix", 0.8), kw("implement", 0.8),
            kw("build", 0.7), kw("generate", 0.7),
        ],
        Intent::Question => &[
            kw("왜", 0.9), kw("어떻게", 0.9), kw("무엇", 0.8), kw("뭐", 0.7), kw("어디", 0.7),
            kw("why", 0.9), kw("how", 0.9), kw("what", 0.8), kw("where", 0.7), kw("which", 0.6),
            kw("is it", 0.5), kw("can you explain", 0.8),
        ],
        Intent::Instruction => &[
            kw("단계별로", 1.0), kw("다음과 같이", 0.8), kw("먼저", 0.7), kw("그 다음", 0.7),
            kw("step by step", 1.0), kw("first", 0.6), kw("then", 0.6), kw("follow these", 0.8),
            kw("make sure", 0.6), kw("please ensure", 0.7),
        ],
        Intent::Feedback => &[
            kw("좋아요", 0.8), kw("별로", 0.8), kw("마음에 안", 0.9), kw("완벽해", 0.8),
            kw("good job", 0.8), kw("not good", 0.8), kw("looks great", 0.8), kw("bad", 0.6),
            kw("this is wrong", 0.9), kw("doesn't work", 0.9),
        ],
        Intent::Context => &[
            kw("참고로", 0.8), kw("배경은", 0.8), kw("현재 상황", 0.8),
            kw("for context", 0.8), kw("background", 0.7), kw("fyi", 0.6), kw("note that", 0.6),
        ],
        Intent::Clarification => &[
            kw("다시 말해", 0.9), kw("정확히는", 0.8), kw("즉", 0.6),
            kw("to clarify", 0.9), kw("what i mean", 0.8), kw("in other words", 0.8),
            kw("specifically", 0.5),
        ],
        Intent::Unknown => &[],
    }
}

pub fn category_keywords(category: TaskCategory) -> &'static [Keyword] {
    match category {
        TaskCategory::CodeGeneration => &[
            kw("만들어줘", 1.0), kw("작성해줘", 0.9), kw("구현해줘", 1.0), kw("함수", 0.6),
            kw("implement", 0.9), kw("write a function", 1.0), kw("create a", 0.7),
            kw("generate code", 1.0), kw("build a", 0.6),
        ],
        TaskCategory::CodeReview => &[
            kw("리뷰해줘", 1.0), kw("검토해줘", 0.9), kw("코드 리뷰", 1.0),
            kw("review this code", 1.0), kw("code review", 1.0), kw("feedback on", 0.6),
            kw("look over", 0.5),
        ],
        TaskCategory::BugFix => &[
            kw("버그", 1.0), kw("오류", 0.9), kw("에러", 0.9), kw("고쳐줘", 1.0), kw("안돼", 0.6),
            kw("bug", 1.0), kw("error", 0.9), kw("fix this", 0.9), kw("not working", 0.8),
            kw("crash", 0.8), kw("exception", 0.7),
        ],
        TaskCategory::Refactoring => &[
            kw("리팩토링", 1.0), kw("개선해줘", 0.7), kw("구조 변경", 0.8),
            kw("refactor", 1.0), kw("clean up", 0.7), kw("restructure", 0.8), kw("simplify", 0.6),
        ],
        TaskCategory::Explanation => &[
            kw("설명해줘", 1.0), kw("알려줘", 0.6), kw("이해가 안", 0.7),
            kw("explain", 1.0), kw("what does this do", 0.9), kw("help me understand", 0.8),
        ],
        TaskCategory::Documentation => &[
            kw("문서화", 1.0), kw("주석", 0.7), kw("readme", 0.8),
            kw("document", 1.0), kw("add comments", 0.8), kw("write docs", 0.9),
        ],
        TaskCategory::Testing => &[
            kw("테스트", 1.0), kw("단위 테스트", 1.0), kw("검증해줘", 0.6),
            kw("test", 1.0), kw("unit test", 1.0), kw("write tests", 1.0), kw("assert", 0.5),
        ],
        TaskCategory::Architecture => &[
            kw("아키텍처", 1.0), kw("설계", 0.8), kw("구조를", 0.6),
            kw("architecture", 1.0), kw("design a system", 1.0), kw("structure the", 0.6),
        ],
        TaskCategory::Deployment => &[
            kw("배포", 1.0), kw("릴리즈", 0.8), kw("빌드해줘", 0.7),
            kw("deploy", 1.0), kw("release", 0.8), kw("ci/cd", 0.9), kw("pipeline", 0.6),
        ],
        TaskCategory::DataAnalysis => &[
            kw("데이터 분석", 1.0), kw("통계", 0.7), kw("시각화", 0.7),
            kw("analyze data", 1.0), kw("dataset", 0.7), kw("visualize", 0.7), kw("statistics", 0.6),
        ],
        TaskCategory::General | TaskCategory::Unknown => &[],
    }
}
