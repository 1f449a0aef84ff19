//! Prompt assembly for the planning LLM call.

use kernel_core::CATALOG;

const ROLE_DESCRIPTIONS: &[(&str, &str)] = &[
    ("reasoning", "general reasoning and planning — the default role"),
    ("coding", "reading, writing, or reasoning about source code"),
    ("vision", "interpreting images or screenshots"),
];

/// Assemble the prompt sent to the reasoning-role LLM: the user's
/// message, the SuperContext summary, the verbatim tool catalog, and
/// the three model-role descriptions.
pub fn build_prompt(user_message: &str, context_summary: &str) -> String {
    let mut roles = String::new();
    for (role, description) in ROLE_DESCRIPTIONS {
        roles.push_str(&format!("- {role}: {description}\n"));
    }

    format!(
        "User message: {user_message}\n\
         \n\
         Context summary: {context_summary}\n\
         \n\
         Available tools:\n{}\n\
         Model roles:\n{roles}\n\
         \n\
         Respond with a JSON object of the shape \
         {{\"steps\": [{{\"tool\": \"...\", \"action\": \"...\", \"args\": {{}}, \"preferred_llm\": \"reasoning\"}}], \"reasoning\": \"...\"}}. \
         An empty `steps` array means you will answer directly.",
        CATALOG.render_for_prompt(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_user_message_and_catalog() {
        let prompt = build_prompt("what files are here?", "Memory: last 0 messages");
        assert!(prompt.contains("what files are here?"));
        assert!(prompt.contains("files.list_dir"));
        assert!(prompt.contains("reasoning: general reasoning"));
    }
}
