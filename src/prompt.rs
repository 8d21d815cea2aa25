// src/prompt.rs
// Prompt + session-context data model (SPEC_FULL.md §3)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw input plus capture metadata. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub text: String,
    pub source_app: Option<String>,
    pub project_path: Option<String>,
    pub window_title: Option<String>,
    pub captured_at: DateTime<Utc>,
}

impl Prompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_app: None,
            project_path: None,
            window_title: None,
            captured_at: Utc::now(),
        }
    }

    pub fn with_source_app(mut self, source_app: impl Into<String>) -> Self {
        self.source_app = Some(source_app.into());
        self
    }

    pub fn with_project_path(mut self, project_path: impl Into<String>) -> Self {
        self.project_path = Some(project_path.into());
        self
    }
}

/// A modified file mentioned in the last exchange with an assistant.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LastExchange {
    pub summary: Option<String>,
    pub modified_files: Vec<String>,
}

/// Capture-time snapshot of the user's workspace (SPEC_FULL.md §3).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionContext {
    pub project_path: Option<String>,
    pub project_name: Option<String>,
    pub ide_name: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    pub current_task: Option<String>,
    #[serde(default)]
    pub recent_files: Vec<String>,
    #[serde(default)]
    pub recent_tools: Vec<String>,
    pub git_branch: Option<String>,
    pub last_exchange: Option<LastExchange>,
}

impl SessionContext {
    /// Whether `current_task` is specific enough to surface verbatim (§4.3 Balanced variant):
    /// skipped if shorter than 5 chars or a generic phrase.
    pub fn has_meaningful_task(&self) -> bool {
        const GENERIC_PHRASES: &[&str] = &["작업 중", "working on it", "task", "todo", "none"];
        match &self.current_task {
            Some(task) => {
                let trimmed = task.trim();
                trimmed.chars().count() >= 5
                    && !GENERIC_PHRASES
                        .iter()
                        .any(|g| trimmed.eq_ignore_ascii_case(g))
            }
            None => false,
        }
    }

    /// `git_branch`, excluding default/uninformative branch names.
    pub fn non_default_branch(&self) -> Option<&str> {
        const DEFAULT_BRANCHES: &[&str] = &["main", "master", "develop", "dev"];
        self.git_branch.as_deref().filter(|b| {
            !DEFAULT_BRANCHES
                .iter()
                .any(|d| b.eq_ignore_ascii_case(d))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_current_task_is_skipped() {
        let ctx = SessionContext { current_task: Some("todo".into()), ..Default::default() };
        assert!(!ctx.has_meaningful_task());
    }

    #[test]
    fn short_current_task_is_skipped() {
        let ctx = SessionContext { current_task: Some("fix".into()), ..Default::default() };
        assert!(!ctx.has_meaningful_task());
    }

    #[test]
    fn specific_current_task_is_kept() {
        let ctx = SessionContext {
            current_task: Some("Implement OAuth refresh token rotation".into()),
            ..Default::default()
        };
        assert!(ctx.has_meaningful_task());
    }

    #[test]
    fn default_branch_is_hidden() {
        let ctx = SessionContext { git_branch: Some("main".into()), ..Default::default() };
        assert_eq!(ctx.non_default_branch(), None);
    }

    #[test]
    fn feature_branch_is_shown() {
        let ctx = SessionContext { git_branch: Some("feature/oauth".into()), ..Default::default() };
        assert_eq!(ctx.non_default_branch(), Some("feature/oauth"));
    }
}
