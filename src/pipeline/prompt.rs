//! Prompt assembly: persona + fixed output contract + product text.
//!
//! Pure functions, no I/O. The result is a [`PromptPayload`]: one
//! instruction (sent as the system message) and one user message.

use crate::pipeline::ingest::ProductInfo;
use crate::prompts::{
    ANALYSIS_CONTEXT_LABEL, ANALYZE_PROMPT, ANALYZE_USER_LEAD, DEFAULT_ROLE_PROMPT,
    GENERATE_USER_LEAD, PRODUCT_INFO_LABEL, SLIDE_OUTPUT_RULES,
};
use serde::{Deserialize, Serialize};

/// The two strings handed to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPayload {
    pub instruction: String,
    pub user_message: String,
}

/// Build the analyze-stage prompt.
pub fn analysis_prompt(product_info: &ProductInfo) -> PromptPayload {
    PromptPayload {
        instruction: ANALYZE_PROMPT.to_string(),
        user_message: format!("{ANALYZE_USER_LEAD}{product_info}"),
    }
}

/// Build the generate-stage prompt.
///
/// A blank `role_prompt` falls back to [`DEFAULT_ROLE_PROMPT`]; a blank
/// `analysis_context` is omitted. [`SLIDE_OUTPUT_RULES`] is appended in
/// every case.
pub fn generation_prompt(
    role_prompt: Option<&str>,
    product_info: &ProductInfo,
    analysis_context: Option<&str>,
) -> PromptPayload {
    let role = non_blank(role_prompt).unwrap_or(DEFAULT_ROLE_PROMPT);
    let instruction = format!("{role}\n{SLIDE_OUTPUT_RULES}");

    let mut user_message = String::from(GENERATE_USER_LEAD);
    if let Some(context) = non_blank(analysis_context) {
        user_message.push_str(&format!("{ANALYSIS_CONTEXT_LABEL}\n{context}\n\n"));
    }
    user_message.push_str(&format!("{PRODUCT_INFO_LABEL}\n{product_info}"));

    PromptPayload {
        instruction,
        user_message,
    }
}

/// The persona used when the caller does not supply one.
pub fn default_role_prompt() -> &'static str {
    DEFAULT_ROLE_PROMPT
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ingest::IngestLimits;

    fn info(text: &str) -> ProductInfo {
        ProductInfo::new(text, &IngestLimits::default()).unwrap()
    }

    #[test]
    fn analysis_prompt_layout() {
        let p = analysis_prompt(&info("Widget Pro: fast widgets"));
        assert_eq!(p.instruction, ANALYZE_PROMPT);
        assert!(p.user_message.starts_with(ANALYZE_USER_LEAD));
        assert!(p.user_message.ends_with("Widget Pro: fast widgets"));
    }

    #[test]
    fn default_persona_used_when_no_override() {
        let p = generation_prompt(None, &info("Widget Pro: fast widgets"), None);
        assert!(p.instruction.starts_with(DEFAULT_ROLE_PROMPT));
        assert!(p.instruction.ends_with(SLIDE_OUTPUT_RULES));
    }

    #[test]
    fn blank_override_falls_back_to_default() {
        let p = generation_prompt(Some("   \n"), &info("Widget Pro: fast widgets"), None);
        assert!(p.instruction.starts_with(DEFAULT_ROLE_PROMPT));
    }

    #[test]
    fn override_replaces_persona_but_not_rules() {
        let p = generation_prompt(
            Some("You are a terse startup advisor."),
            &info("Widget Pro: fast widgets"),
            None,
        );
        assert!(p.instruction.starts_with("You are a terse startup advisor.\n"));
        assert!(!p.instruction.contains(DEFAULT_ROLE_PROMPT));
        assert!(p.instruction.ends_with(SLIDE_OUTPUT_RULES));
    }

    #[test]
    fn analysis_context_precedes_product_text() {
        let p = generation_prompt(
            None,
            &info("Widget Pro: fast widgets"),
            Some("{\"product_name\": \"Widget Pro\"}"),
        );
        let ctx = p.user_message.find(ANALYSIS_CONTEXT_LABEL).unwrap();
        let prod = p.user_message.find(PRODUCT_INFO_LABEL).unwrap();
        assert!(ctx < prod);
        assert!(p.user_message.contains("{\"product_name\": \"Widget Pro\"}"));
        assert!(p.user_message.ends_with("Widget Pro: fast widgets"));
    }

    #[test]
    fn blank_context_omitted() {
        let p = generation_prompt(None, &info("Widget Pro: fast widgets"), Some(""));
        assert!(!p.user_message.contains(ANALYSIS_CONTEXT_LABEL));
        assert!(p.user_message.contains(PRODUCT_INFO_LABEL));
    }
}
