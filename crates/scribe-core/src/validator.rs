//! Schema checks on completion output.
//!
//! The model is asked for `{"issues": [{"title", "body", "labels"}]}`. Nothing
//! it returns is trusted until every issue in the batch passes; a single bad
//! field rejects the whole batch, and the error lists every failing path.

use scribe_models::{GeneratedIssue, IssueBatch};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Minimum title length in characters.
pub const MIN_TITLE_CHARS: usize = 10;

/// Minimum body length in characters.
pub const MIN_BODY_CHARS: usize = 30;

/// Shortest accepted label.
pub const LABEL_MIN_CHARS: usize = 2;

/// Longest accepted label.
pub const LABEL_MAX_CHARS: usize = 20;

/// One failing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    /// Path into the document, e.g. `issues[1].labels[0]`.
    pub path: String,
    /// What is wrong with it.
    pub message: String,
}

impl Problem {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Aggregate validation failure for a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("generated issues failed validation: {}", join_problems(.problems))]
pub struct ValidationError {
    /// Every failing path, in document order.
    pub problems: Vec<Problem>,
}

fn join_problems(problems: &[Problem]) -> String {
    problems
        .iter()
        .map(Problem::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse and validate a raw completion.
///
/// Accepts the document bare or wrapped in a markdown code fence.
pub fn validate_issues(raw: &str) -> Result<IssueBatch, ValidationError> {
    let document = strip_code_fence(raw);
    let root: Value = serde_json::from_str(document).map_err(|e| ValidationError {
        problems: vec![Problem::new("$", format!("invalid JSON: {}", e))],
    })?;

    let mut problems = Vec::new();
    let Some(candidates) = root.get("issues").and_then(Value::as_array) else {
        problems.push(Problem::new("issues", "expected an array of issues"));
        return Err(ValidationError { problems });
    };
    if candidates.is_empty() {
        problems.push(Problem::new("issues", "expected at least one issue"));
    }

    let mut issues = Vec::with_capacity(candidates.len());
    for (index, candidate) in candidates.iter().enumerate() {
        if let Some(issue) = check_issue(index, candidate, &mut problems) {
            issues.push(issue);
        }
    }

    if problems.is_empty() {
        Ok(IssueBatch { issues })
    } else {
        debug!(problems = problems.len(), candidates = candidates.len(), "Batch rejected");
        Err(ValidationError { problems })
    }
}

fn check_issue(index: usize, candidate: &Value, problems: &mut Vec<Problem>) -> Option<GeneratedIssue> {
    let path = format!("issues[{}]", index);
    let Some(object) = candidate.as_object() else {
        problems.push(Problem::new(path, "expected an object"));
        return None;
    };

    let before = problems.len();
    let title = check_text(&path, "title", object.get("title"), MIN_TITLE_CHARS, problems);
    let body = check_text(&path, "body", object.get("body"), MIN_BODY_CHARS, problems);

    let mut labels = Vec::new();
    match object.get("labels") {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                let label_path = format!("{}.labels[{}]", path, i);
                match item.as_str() {
                    Some(label) if label.trim().is_empty() => {
                        problems.push(Problem::new(label_path, "must not be blank"));
                    }
                    Some(label) => {
                        // kept verbatim; the length bound applies to the label as given
                        let len = label.chars().count();
                        if (LABEL_MIN_CHARS..=LABEL_MAX_CHARS).contains(&len) {
                            labels.push(label.to_string());
                        } else {
                            problems.push(Problem::new(
                                label_path,
                                format!(
                                    "must be {} to {} characters (got {})",
                                    LABEL_MIN_CHARS, LABEL_MAX_CHARS, len
                                ),
                            ));
                        }
                    }
                    None => problems.push(Problem::new(label_path, "expected a string")),
                }
            }
        }
        Some(_) => problems.push(Problem::new(format!("{}.labels", path), "expected an array")),
    }

    if problems.len() > before {
        return None;
    }
    Some(GeneratedIssue {
        title: title?,
        body: body?,
        labels,
    })
}

fn check_text(
    path: &str,
    field: &str,
    value: Option<&Value>,
    min_chars: usize,
    problems: &mut Vec<Problem>,
) -> Option<String> {
    let field_path = format!("{}.{}", path, field);
    match value.and_then(Value::as_str) {
        Some(text) => {
            let text = text.trim();
            let len = text.chars().count();
            if len < min_chars {
                problems.push(Problem::new(
                    field_path,
                    format!("must be at least {} characters (got {})", min_chars, len),
                ));
                None
            } else {
                Some(text.to_string())
            }
        }
        None => {
            problems.push(Problem::new(field_path, "required string is missing"));
            None
        }
    }
}

/// Drop a surrounding markdown fence (```json ... ```) if present.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_end();
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    // Skip the info string ("json"), which ends at the first newline or at the document
    let body = match rest.split_once('\n') {
        Some((info, body)) if !info.trim_start().starts_with(|c: char| c == '{' || c == '[') => body,
        _ => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    body.trim()
}
