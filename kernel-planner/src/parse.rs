//! Parse the LLM's raw response into a [`Plan`] and validate every
//! step against the catalog.

use crate::error::PlannerError;
use crate::policy::resolve_llm_role;
use kernel_core::catalog::PreferredLlm;
use kernel_core::{Plan, PlanStep, CATALOG};
use std::collections::HashMap;

/// Strip a leading/trailing ```` ``` ```` or ```` ```json ```` fence, if present.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse and validate the reasoning LLM's raw text response into a [`Plan`].
pub fn parse_plan(raw: &str) -> Result<Plan, PlannerError> {
    let json_text = strip_code_fence(raw);
    let value: serde_json::Value = serde_json::from_str(json_text)
        .map_err(|e| PlannerError::ParseFailure(e.to_string()))?;

    let obj = value
        .as_object()
        .ok_or_else(|| PlannerError::ParseFailure("top-level response is not an object".to_string()))?;

    let reasoning = obj
        .get("reasoning")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let steps_value = obj
        .get("steps")
        .ok_or_else(|| PlannerError::ParseFailure("missing `steps` field".to_string()))?;
    let steps_array = steps_value
        .as_array()
        .ok_or_else(|| PlannerError::ParseFailure("`steps` is not an array".to_string()))?;

    let mut steps = Vec::with_capacity(steps_array.len());
    for step_value in steps_array {
        steps.push(parse_step(step_value)?);
    }

    Ok(Plan { steps, reasoning })
}

fn parse_step(value: &serde_json::Value) -> Result<PlanStep, PlannerError> {
    let obj = value
        .as_object()
        .ok_or_else(|| PlannerError::ParseFailure("step is not an object".to_string()))?;

    let tool = obj
        .get("tool")
        .and_then(|v| v.as_str())
        .ok_or_else(|| PlannerError::InvalidStep("step missing `tool`".to_string()))?
        .to_string();
    let action = obj
        .get("action")
        .and_then(|v| v.as_str())
        .ok_or_else(|| PlannerError::InvalidStep("step missing `action`".to_string()))?
        .to_string();

    let spec = CATALOG
        .action(&tool, &action)
        .ok_or_else(|| PlannerError::InvalidStep(format!("unknown tool/action {tool}.{action}")))?;

    let args: HashMap<String, serde_json::Value> = obj
        .get("args")
        .and_then(|v| v.as_object())
        .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();

    for required in spec.required_args {
        if !args.contains_key(*required) {
            return Err(PlannerError::InvalidStep(format!(
                "{tool}.{action} missing required arg `{required}`"
            )));
        }
    }

    // Absent `preferred_llm` defaults per the catalog; present-but-
    // unrecognized defaults to `reasoning`.
    let preferred_llm = match obj.get("preferred_llm").and_then(|v| v.as_str()) {
        Some(s) => s.parse::<PreferredLlm>().unwrap_or(PreferredLlm::Reasoning),
        None => resolve_llm_role(&tool, &action).unwrap_or(PreferredLlm::Reasoning),
    };

    let parallel_group = obj
        .get("parallel_group")
        .and_then(|v| v.as_u64())
        .map(|n| n as u32);

    Ok(PlanStep {
        tool,
        action,
        args,
        preferred_llm,
        parallel_group,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_plan() {
        let raw = r#"{"steps":[{"tool":"files","action":"read_file","args":{"path":"a.txt"}}],"reasoning":"read it"}"#;
        let plan = parse_plan(raw).unwrap();
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].preferred_llm, PreferredLlm::Reasoning);
        assert_eq!(plan.reasoning, "read it");
    }

    #[test]
    fn strips_markdown_code_fence() {
        let raw = "```json\n{\"steps\":[],\"reasoning\":\"answer directly\"}\n```";
        let plan = parse_plan(raw).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn missing_preferred_llm_defaults_from_catalog() {
        let raw = r#"{"steps":[{"tool":"files","action":"write_file","args":{"path":"a.txt","content":"x"}}],"reasoning":""}"#;
        let plan = parse_plan(raw).unwrap();
        assert_eq!(plan.steps[0].preferred_llm, PreferredLlm::Coding);
    }

    #[test]
    fn unrecognized_preferred_llm_falls_back_to_reasoning() {
        let raw = r#"{"steps":[{"tool":"files","action":"write_file","args":{"path":"a.txt","content":"x"},"preferred_llm":"nonsense"}],"reasoning":""}"#;
        let plan = parse_plan(raw).unwrap();
        assert_eq!(plan.steps[0].preferred_llm, PreferredLlm::Reasoning);
    }

    #[test]
    fn missing_required_arg_is_invalid() {
        let raw = r#"{"steps":[{"tool":"files","action":"read_file","args":{}}],"reasoning":""}"#;
        assert!(matches!(parse_plan(raw), Err(PlannerError::InvalidStep(_))));
    }

    #[test]
    fn unknown_tool_is_invalid() {
        let raw = r#"{"steps":[{"tool":"nope","action":"whatever","args":{}}],"reasoning":""}"#;
        assert!(matches!(parse_plan(raw), Err(PlannerError::InvalidStep(_))));
    }

    #[test]
    fn malformed_json_is_parse_failure() {
        assert!(matches!(parse_plan("not json"), Err(PlannerError::ParseFailure(_))));
    }
}
