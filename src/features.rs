// src/features.rs
// Pure feature extraction over prompt text (SPEC_FULL.md §3, §4.1 step 1-2)

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref CODE_FENCE_RE: Regex = Regex::new(r"(?s)```.*?```").unwrap();
    static ref FILE_PATH_RE: Regex =
        Regex::new(r"(?:[A-Za-z]:\\|\.{1,2}/|/)?(?:[\w.-]+/)+[\w.-]+\.[A-Za-z0-9]{1,8}").unwrap();
    static ref URL_RE: Regex = Regex::new(r"https?://[^\s]+").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageHint {
    Ko,
    En,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

/// Derived properties of the prompt text. Pure function of the text (§3 invariant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Features {
    pub language_hint: LanguageHint,
    pub has_code_block: bool,
    pub has_file_path: bool,
    pub has_url: bool,
    pub word_count: usize,
    pub length: usize,
    pub has_question_mark: bool,
    pub has_exclamation_mark: bool,
    pub complexity: Complexity,
}

fn hangul_ratio(text: &str) -> f32 {
    let mut total = 0usize;
    let mut hangul = 0usize;
    for c in text.chars() {
        if c.is_whitespace() {
            continue;
        }
        total += 1;
        if ('\u{AC00}'..='\u{D7A3}').contains(&c) || ('\u{3130}'..='\u{318F}').contains(&c) {
            hangul += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        hangul as f32 / total as f32
    }
}

fn detect_language(text: &str) -> LanguageHint {
    let ratio = hangul_ratio(text);
    if ratio >= 0.6 {
        LanguageHint::Ko
    } else if ratio <= 0.05 {
        LanguageHint::En
    } else {
        LanguageHint::Mixed
    }
}

impl Features {
    /// Extract features from raw prompt text. Deterministic, no I/O.
    pub fn extract(text: &str) -> Self {
        let has_code_block = CODE_FENCE_RE.is_match(text);
        let has_file_path = FILE_PATH_RE.is_match(text);
        let has_url = URL_RE.is_match(text);
        let word_count = text.split_whitespace().count();
        let length = text.chars().count();
        let has_question_mark = text.contains('?') || text.contains('?');
        let has_exclamation_mark = text.contains('!') || text.contains('!');
        let language_hint = detect_language(text);

        let complexity = if word_count < 10 {
            Complexity::Simple
        } else if (has_code_block && word_count < 100) || (!has_code_block && word_count < 50) {
            Complexity::Moderate
        } else {
            Complexity::Complex
        };

        Self {
            language_hint,
            has_code_block,
            has_file_path,
            has_url,
            word_count,
            length,
            has_question_mark,
            has_exclamation_mark,
            complexity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_simple() {
        let f = Features::extract("");
        assert_eq!(f.word_count, 0);
        assert_eq!(f.complexity, Complexity::Simple);
        assert!(!f.has_code_block);
    }

    #[test]
    fn detects_code_block() {
        let f = Features::extract("fix this\n```rust\nfn main() {}\n```");
        assert!(f.has_code_block);
    }

    #[test]
    fn detects_korean() {
        let f = Features::extract("버그를 수정해 주세요");
        assert_eq!(f.language_hint, LanguageHint::Ko);
    }

    #[test]
    fn detects_english() {
        let f = Features::extract("please fix this bug in the login flow");
        assert_eq!(f.language_hint, LanguageHint::En);
    }

    #[test]
    fn detects_mixed() {
        let f = Features::extract("please 버그 fix this 수정 오류 문제점 해결해줘");
        assert_eq!(f.language_hint, LanguageHint::Mixed);
    }

    #[test]
    fn detects_file_path_and_url() {
        let f = Features::extract("see src/main.rs and https://example.com/docs");
        assert!(f.has_file_path);
        assert!(f.has_url);
    }

    #[test]
    fn long_prompt_without_code_is_complex() {
        let text = "word ".repeat(60);
        let f = Features::extract(&text);
        assert_eq!(f.complexity, Complexity::Complex);
    }
}
