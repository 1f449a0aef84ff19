//! Per-step LLM role selection policy: vision actions resolve to
//! `vision`, actions that write code-shaped artifacts resolve to
//! `coding`, everything else resolves to `reasoning`. The catalog's
//! `default_llm` field already encodes this table per `(tool, action)`;
//! this function is the one place that table is read from, so parsing
//! and any later re-resolution agree on the same answer.
//!
//! An explicit step-level `preferred_llm` always overrides this policy
//! — this function is only consulted when a step didn't name one.

use kernel_core::catalog::PreferredLlm;
use kernel_core::CATALOG;

/// The policy's answer for `(tool, action)`, or `None` if the pair
/// isn't in the catalog at all (the caller should reject the step).
pub fn resolve_llm_role(tool: &str, action: &str) -> Option<PreferredLlm> {
    CATALOG.action(tool, action).map(|spec| spec.default_llm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vision_actions_resolve_to_vision() {
        assert_eq!(resolve_llm_role("vision", "analyze_image"), Some(PreferredLlm::Vision));
    }

    #[test]
    fn code_writing_actions_resolve_to_coding() {
        assert_eq!(resolve_llm_role("files", "write_file"), Some(PreferredLlm::Coding));
    }

    #[test]
    fn unknown_action_resolves_to_none() {
        assert_eq!(resolve_llm_role("files", "teleport"), None);
    }
}
