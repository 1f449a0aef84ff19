//! `$previous` argument substitution.

use kernel_core::plan::PREVIOUS_SENTINEL;
use kernel_core::PlanStep;
use std::collections::HashMap;

/// Resolve a step's arguments, replacing any `"$previous"` value with
/// `previous_result`. Returns `None` if the step references `$previous`
/// but no prior successful result is available.
pub fn resolve_args(
    step: &PlanStep,
    previous_result: Option<&serde_json::Value>,
) -> Option<HashMap<String, serde_json::Value>> {
    if !step.references_previous() {
        return Some(step.args.clone());
    }
    let previous_result = previous_result?;

    let mut resolved = HashMap::with_capacity(step.args.len());
    for (key, value) in &step.args {
        if value.as_str() == Some(PREVIOUS_SENTINEL) {
            resolved.insert(key.clone(), previous_result.clone());
        } else {
            resolved.insert(key.clone(), value.clone());
        }
    }
    Some(resolved)
}
