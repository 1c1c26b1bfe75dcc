//! Anchored regex rules.
//!
//! A [`PatchRule`] pairs a compiled pattern with an action. Only the first
//! match in the buffer is used; the span it covers becomes an [`Edit`]. When
//! the pattern finds nothing the rule is a no-op, and the rule's marker (text
//! only present after it has run) tells "already applied" apart from "anchor
//! not found".

use crate::edit::{Edit, EditError};
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// What a rule does with its match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleAction {
    /// Keep the match and insert `text` right after capture group 1.
    InsertBetween { text: String },
    /// Replace the whole match with `text`.
    Replace { text: String },
}

impl RuleAction {
    fn text(&self) -> &str {
        match self {
            RuleAction::InsertBetween { text } | RuleAction::Replace { text } => text,
        }
    }
}

/// Outcome of running one rule against a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleStatus {
    /// Pattern matched and the buffer changed
    Applied,
    /// Pattern did not match, but the rule's marker is present
    AlreadyApplied,
    /// Pattern did not match and there is no trace of a previous run
    NotFound,
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleStatus::Applied => write!(f, "applied"),
            RuleStatus::AlreadyApplied => write!(f, "already applied"),
            RuleStatus::NotFound => write!(f, "pattern not found"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("rule '{name}' has an invalid pattern: {source}")]
    InvalidPattern { name: String, source: regex::Error },

    #[error("rule '{name}' inserts after group 1 but its pattern has no capture group")]
    MissingGroup { name: String },

    #[error("rule '{name}' marker {marker:?} does not occur in its injected text")]
    MarkerNotInjected { name: String, marker: String },

    #[error("rule '{name}' produced an invalid edit: {source}")]
    Edit { name: String, source: EditError },
}

#[derive(Debug, Clone)]
pub struct PatchRule {
    name: String,
    pattern: Regex,
    action: RuleAction,
    marker: String,
}

impl PatchRule {
    /// Compile a rule. `marker` must be a substring of the action's text.
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        action: RuleAction,
        marker: impl Into<String>,
    ) -> Result<Self, RuleError> {
        let name = name.into();
        let marker = marker.into();

        let pattern = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
            name: name.clone(),
            source,
        })?;

        if matches!(action, RuleAction::InsertBetween { .. }) && pattern.captures_len() < 2 {
            return Err(RuleError::MissingGroup { name });
        }

        if marker.is_empty() || !action.text().contains(&marker) {
            return Err(RuleError::MarkerNotInjected { name, marker });
        }

        Ok(Self {
            name,
            pattern,
            action,
            marker,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Locate the first match and build the edit for it, without touching
    /// the buffer.
    ///
    /// The replacement text is used literally: `$` in injected JavaScript
    /// (template literals) is never read as a capture reference. Its line
    /// endings follow the buffer's, so CRLF sources stay CRLF.
    pub fn plan(&self, content: &str) -> Option<Edit> {
        let caps = self.pattern.captures(content)?;
        let whole = caps.get(0)?;
        let text = match_line_endings(self.action.text(), content);

        let new_text = match &self.action {
            RuleAction::InsertBetween { .. } => {
                let split = caps.get(1)?.end() - whole.start();
                let matched = whole.as_str();
                let mut out = String::with_capacity(matched.len() + text.len());
                out.push_str(&matched[..split]);
                out.push_str(&text);
                out.push_str(&matched[split..]);
                out
            }
            RuleAction::Replace { .. } => text.into_owned(),
        };

        Some(Edit::new(whole.start(), whole.end(), new_text))
    }

    /// Run the rule against `content` in place.
    pub fn apply(&self, content: &mut String) -> Result<RuleStatus, RuleError> {
        let Some(edit) = self.plan(content) else {
            let status = if content.contains(&self.marker) {
                RuleStatus::AlreadyApplied
            } else {
                RuleStatus::NotFound
            };
            debug!(rule = %self.name, %status, "no anchor match");
            return Ok(status);
        };

        let span = edit.byte_start..edit.byte_end;
        let bytes_changed = edit.apply_to(content).map_err(|source| RuleError::Edit {
            name: self.name.clone(),
            source,
        })?;

        debug!(rule = %self.name, ?span, bytes_changed, "anchor matched");
        Ok(RuleStatus::Applied)
    }
}

/// Injected text is written with LF; convert it when the buffer uses CRLF.
fn match_line_endings<'a>(text: &'a str, content: &str) -> Cow<'a, str> {
    if content.contains("\r\n") && !text.contains('\r') {
        Cow::Owned(text.replace('\n', "\r\n"))
    } else {
        Cow::Borrowed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert_rule() -> PatchRule {
        PatchRule::new(
            "log-items",
            r"(const items = \[[^\]]*\];\r?\n)(\s*return items)",
            RuleAction::InsertBetween {
                text: "console.log('items', items);\n".to_string(),
            },
            "console.log('items'",
        )
        .unwrap()
    }

    #[test]
    fn test_insert_between_groups() {
        let mut content = "fn();\nconst items = [1, 2];\nreturn items;\n".to_string();

        let status = insert_rule().apply(&mut content).unwrap();

        assert_eq!(status, RuleStatus::Applied);
        assert_eq!(
            content,
            "fn();\nconst items = [1, 2];\nconsole.log('items', items);\nreturn items;\n"
        );
    }

    #[test]
    fn test_first_occurrence_only() {
        let mut content =
            "const items = [1];\nreturn items;\nconst items = [2];\nreturn items;\n".to_string();

        insert_rule().apply(&mut content).unwrap();

        assert_eq!(content.matches("console.log").count(), 1);
        assert!(content.ends_with("const items = [2];\nreturn items;\n"));
    }

    #[test]
    fn test_no_match_is_noop() {
        let original = "const other = [1];\nreturn other;\n";
        let mut content = original.to_string();

        assert_eq!(insert_rule().apply(&mut content).unwrap(), RuleStatus::NotFound);
        assert_eq!(content, original);
    }

    #[test]
    fn test_second_run_reports_already_applied() {
        let rule = insert_rule();
        let mut content = "const items = [1, 2];\nreturn items;\n".to_string();

        assert_eq!(rule.apply(&mut content).unwrap(), RuleStatus::Applied);
        let once = content.clone();
        assert_eq!(rule.apply(&mut content).unwrap(), RuleStatus::AlreadyApplied);
        assert_eq!(content, once);
    }

    #[test]
    fn test_crlf_buffer_gets_crlf_text() {
        let mut content = "const items = [1, 2];\r\nreturn items;\r\n".to_string();

        assert_eq!(insert_rule().apply(&mut content).unwrap(), RuleStatus::Applied);
        assert_eq!(
            content,
            "const items = [1, 2];\r\nconsole.log('items', items);\r\nreturn items;\r\n"
        );
    }

    #[test]
    fn test_replacement_dollar_is_literal() {
        let rule = PatchRule::new(
            "template",
            r"(?s)items\.map\(\(x\) => \(\{.*?\}\)\)",
            RuleAction::Replace {
                text: "items.map((x, index) => ({ id: `item-${index}`, x }))".to_string(),
            },
            "`item-${index}`",
        )
        .unwrap();
        let mut content = "return items.map((x) => ({ x }));".to_string();

        rule.apply(&mut content).unwrap();

        assert_eq!(
            content,
            "return items.map((x, index) => ({ id: `item-${index}`, x }));"
        );
    }

    #[test]
    fn test_constructor_rejects_bad_rules() {
        let bad_pattern = PatchRule::new(
            "bad",
            r"(unclosed",
            RuleAction::Replace { text: "x".into() },
            "x",
        );
        assert!(matches!(bad_pattern, Err(RuleError::InvalidPattern { .. })));

        let no_group = PatchRule::new(
            "no-group",
            r"return items",
            RuleAction::InsertBetween { text: "x".into() },
            "x",
        );
        assert!(matches!(no_group, Err(RuleError::MissingGroup { .. })));

        let stray_marker = PatchRule::new(
            "stray",
            r"return items",
            RuleAction::Replace { text: "return all".into() },
            "console.log",
        );
        assert!(matches!(stray_marker, Err(RuleError::MarkerNotInjected { .. })));
    }
}
