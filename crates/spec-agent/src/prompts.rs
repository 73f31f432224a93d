//! Prompt and comment templates.
//!
//! Everything the bot says (to the model or on the issue) is a Handlebars
//! template registered here. Output is plain text, so HTML escaping is off.

use handlebars::Handlebars;
use serde::Serialize;
use serde_json::json;

use crate::errors::WorkflowResult;

/// Manages the embedded Handlebars templates.
pub struct PromptManager {
    handlebars: Handlebars<'static>,
}

impl PromptManager {
    pub fn new() -> WorkflowResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);

        for (name, template) in TEMPLATES {
            handlebars.register_template_string(name, *template)?;
        }

        Ok(Self { handlebars })
    }

    /// Render a template with the given data.
    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> WorkflowResult<String> {
        Ok(self.handlebars.render(template, data)?)
    }

    /// Persona that precedes every conversation.
    pub fn system_persona(&self) -> WorkflowResult<String> {
        self.render("system", &json!({}))
    }

    /// Instruction asking for a refreshed draft with the four sections.
    pub fn draft_instruction(&self) -> WorkflowResult<String> {
        self.render(
            "draft_instruction",
            &json!({ "keyword": crate::thread::APPROVAL_KEYWORD }),
        )
    }

    /// Instruction asking for the raw final document.
    pub fn final_instruction(&self) -> WorkflowResult<String> {
        self.render("final_instruction", &json!({}))
    }

    pub fn commit_message(&self, updating: bool, issue_number: u64) -> WorkflowResult<String> {
        let template = if updating {
            "commit_update"
        } else {
            "commit_add"
        };
        self.render(template, &json!({ "issue_number": issue_number }))
    }

    pub fn pr_title(&self, issue_title: &str) -> WorkflowResult<String> {
        self.render("pr_title", &json!({ "title": issue_title }))
    }

    pub fn pr_body(&self, issue_number: u64) -> WorkflowResult<String> {
        self.render("pr_body", &json!({ "issue_number": issue_number }))
    }

    pub fn published_comment(&self, pr_url: &str) -> WorkflowResult<String> {
        self.render("published_comment", &json!({ "pr_url": pr_url }))
    }

    pub fn pr_failed_comment(&self, reason: &str) -> WorkflowResult<String> {
        self.render("pr_failed_comment", &json!({ "reason": reason }))
    }
}

const TEMPLATES: &[(&str, &str)] = &[
    ("system", SYSTEM_TEMPLATE),
    ("draft_instruction", DRAFT_INSTRUCTION_TEMPLATE),
    ("final_instruction", FINAL_INSTRUCTION_TEMPLATE),
    ("commit_add", "Add spec for issue {{issue_number}}"),
    ("commit_update", "Update spec for issue {{issue_number}}"),
    ("pr_title", "Docs: Spec for {{title}}"),
    (
        "pr_body",
        "This PR adds the approved specification for Issue #{{issue_number}}.",
    ),
    (
        "published_comment",
        "✅ Specification approved! I have created a Pull Request with the documentation: {{pr_url}}",
    ),
    (
        "pr_failed_comment",
        "⚠️ Spec approved, but failed to create PR: {{reason}}",
    ),
];

const SYSTEM_TEMPLATE: &str = "You are a Senior Technical Architect. Your goal is to write detailed technical specifications based on GitHub Issues. The output must be valid Markdown.";

const DRAFT_INSTRUCTION_TEMPLATE: &str = r"Based on the conversation, provide an updated Technical Specification. Include:
1. Summary
2. Implementation Steps
3. Tech Stack
4. Edge Cases

Ask the user to reply '{{keyword}}' if this looks good.";

const FINAL_INSTRUCTION_TEMPLATE: &str = "The user has approved the spec. Output ONLY the raw markdown content for the documentation file. Do not include conversational filler.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_instruction_names_sections_and_keyword() {
        let prompts = PromptManager::new().unwrap();
        let text = prompts.draft_instruction().unwrap();
        for section in ["Summary", "Implementation Steps", "Tech Stack", "Edge Cases"] {
            assert!(text.contains(section), "missing {section}");
        }
        assert!(text.contains("'approved'"));
    }

    #[test]
    fn test_titles_are_not_html_escaped() {
        let prompts = PromptManager::new().unwrap();
        assert_eq!(
            prompts.pr_title("Support <T> & \"quotes\"").unwrap(),
            "Docs: Spec for Support <T> & \"quotes\""
        );
    }

    #[test]
    fn test_commit_messages_reference_issue() {
        let prompts = PromptManager::new().unwrap();
        assert_eq!(
            prompts.commit_message(false, 7).unwrap(),
            "Add spec for issue 7"
        );
        assert_eq!(
            prompts.commit_message(true, 7).unwrap(),
            "Update spec for issue 7"
        );
        assert_eq!(
            prompts.pr_body(7).unwrap(),
            "This PR adds the approved specification for Issue #7."
        );
    }

    #[test]
    fn test_outcome_comments() {
        let prompts = PromptManager::new().unwrap();
        assert!(prompts
            .published_comment("https://github.com/o/r/pull/3")
            .unwrap()
            .ends_with("documentation: https://github.com/o/r/pull/3"));
        assert_eq!(
            prompts.pr_failed_comment("Validation Failed").unwrap(),
            "⚠️ Spec approved, but failed to create PR: Validation Failed"
        );
    }

    #[test]
    fn test_strict_mode_rejects_missing_fields() {
        let prompts = PromptManager::new().unwrap();
        assert!(prompts.render("pr_title", &json!({})).is_err());
    }
}
