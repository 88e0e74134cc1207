//! The instruction sent to the model with every generation request.

use scribe_models::EDIT_INSTRUCTION_TAG;

/// Issue shapes the model may produce. Each has a fixed section skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueTemplate {
    BugReport,
    FeatureRequest,
    Enhancement,
    Performance,
}

impl IssueTemplate {
    /// All templates, in the order they are described to the model.
    pub const ALL: [IssueTemplate; 4] = [
        Self::BugReport,
        Self::FeatureRequest,
        Self::Enhancement,
        Self::Performance,
    ];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::BugReport => "Bug Report",
            Self::FeatureRequest => "Feature Request",
            Self::Enhancement => "Enhancement",
            Self::Performance => "Performance Issue",
        }
    }

    /// Label the model should attach for this template.
    pub fn label(self) -> &'static str {
        match self {
            Self::BugReport => "bug",
            Self::FeatureRequest => "feature",
            Self::Enhancement => "enhancement",
            Self::Performance => "performance",
        }
    }

    /// Markdown section headings, in order.
    pub fn sections(self) -> &'static [&'static str] {
        match self {
            Self::BugReport => &[
                "Description",
                "Steps to Reproduce",
                "Expected Behavior",
                "Actual Behavior",
                "Environment",
            ],
            Self::FeatureRequest => &[
                "Summary",
                "Motivation",
                "Proposed Solution",
                "Alternatives Considered",
            ],
            Self::Enhancement => &["Current Behavior", "Proposed Improvement", "Benefits"],
            Self::Performance => &[
                "Description",
                "Measurements",
                "Expected Performance",
                "Possible Causes",
            ],
        }
    }

    fn skeleton(self) -> String {
        let mut out = format!("### {} (label: \"{}\")\n", self.name(), self.label());
        for section in self.sections() {
            out.push_str(&format!("## {}\n", section));
        }
        out
    }
}

const POLICY: &str = r#"You turn informal notes, chat messages and screenshots into issue tracker tickets.

Rules:
- Split unrelated concerns into separate issues; one problem or request per issue
- Keep closely related details together in a single issue rather than fragmenting them
- Write a specific, descriptive title (at least 10 characters)
- Write the body in markdown using exactly one of the templates below (at least 30 characters)
- Attach short lowercase labels (2-20 characters each), including the template's label
- Describe what screenshots show when they matter to the issue
- Lines starting with "{EDIT_TAG}" are corrections from the reporter about the previous draft; apply them

Respond with a single JSON object and nothing else:
{"issues": [{"title": "...", "body": "...", "labels": ["..."]}]}

Templates:
"#;

/// Build the system instruction: decomposition policy plus every template skeleton.
pub fn system_prompt() -> String {
    let mut prompt = POLICY.replace("{EDIT_TAG}", EDIT_INSTRUCTION_TAG);
    for template in IssueTemplate::ALL {
        prompt.push('\n');
        prompt.push_str(&template.skeleton());
    }
    prompt
}

/// Concatenate collected text fragments into the user message.
pub fn user_text(fragments: &[String]) -> String {
    if fragments.is_empty() {
        return "(No text provided; use the attached images.)".to_string();
    }
    fragments.join("\n\n")
}
