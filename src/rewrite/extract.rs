// src/rewrite/extract.rs
// Code/error extraction shared by the rule rewriter's comprehensive variant (§4.3)

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CODE_FENCE_RE: Regex = Regex::new(r"(?s)```(?:\w+\n)?(.*?)```").unwrap();
    static ref INLINE_CODE_RE: Regex = Regex::new(r"`([^`\n]+)`").unwrap();
    static ref ERROR_LINE_RE: Regex = Regex::new(
        r"(?m)^.*(TypeError|ReferenceError|SyntaxError|RangeError|Error):.*$"
    ).unwrap();
    static ref STACK_FRAME_RE: Regex =
        Regex::new(r"(?m)^\s*at\s+\S+\s+\([^)]+:\d+:\d+\)\s*$").unwrap();
}

/// Fenced code blocks, innermost content only (no backticks), in source order.
pub fn extract_code_blocks(text: &str) -> Vec<String> {
    CODE_FENCE_RE
        .captures_iter(text)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Backtick-quoted inline tokens that are not part of a fenced block.
pub fn extract_inline_references(text: &str) -> Vec<String> {
    let without_fences = CODE_FENCE_RE.replace_all(text, "");
    INLINE_CODE_RE
        .captures_iter(&without_fences)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Error messages and stack frames pulled out of the raw text.
pub fn extract_errors(text: &str) -> Vec<String> {
    let mut found: Vec<String> = ERROR_LINE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .collect();
    found.extend(
        STACK_FRAME_RE
            .find_iter(text)
            .map(|m| m.as_str().trim().to_string()),
    );
    found
}

/// Drop fragments already present verbatim in `existing` (§4.3: never duplicated).
pub fn dedup_against(fragments: Vec<String>, existing: &str) -> Vec<String> {
    fragments
        .into_iter()
        .filter(|f| !existing.contains(f.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fenced_code() {
        let text = "fix this:\n```rust\nfn main() {}\n```\nplease";
        let blocks = extract_code_blocks(text);
        assert_eq!(blocks, vec!["fn main() {}".to_string()]);
    }

    #[test]
    fn extracts_inline_reference_ignoring_fences() {
        let text = "see `foo.rs` and\n```\nlet x = `bar`;\n```";
        let refs = extract_inline_references(text);
        assert_eq!(refs, vec!["foo.rs".to_string()]);
    }

    #[test]
    fn extracts_error_and_stack_frame() {
        let text = "Uncaught TypeError: x is not a function\n  at foo (src/app.ts:12:5)";
        let errors = extract_errors(text);
        assert!(errors.iter().any(|e| e.contains("TypeError")));
        assert!(errors.iter().any(|e| e.contains("at foo")));
    }

    #[test]
    fn dedup_removes_already_present_fragment() {
        let existing = "please look at fn main() {} again";
        let fragments = vec!["fn main() {}".to_string(), "fn other() {}".to_string()];
        let kept = dedup_against(fragments, existing);
        assert_eq!(kept, vec!["fn other() {}".to_string()]);
    }
}
