//! `dry_run`: catalog validation only, no dispatch.

use kernel_core::{Plan, CATALOG};
use serde::Serialize;

/// Why one step failed `dry_run` validation.
#[derive(Debug, Clone, Serialize)]
pub struct InvalidStep {
    /// Index of the step within the plan.
    pub index: usize,
    /// Human-readable reason it is invalid.
    pub reason: String,
}

/// Result of validating a plan against the catalog without executing it.
#[derive(Debug, Clone, Serialize)]
pub struct DryRunReport {
    /// Total number of steps in the plan.
    pub total: usize,
    /// Number of steps that passed validation.
    pub valid: usize,
    /// Steps that failed validation, with a reason each.
    pub invalid: Vec<InvalidStep>,
    /// Whether the plan can be executed as-is (`invalid` is empty).
    pub can_execute: bool,
}

/// Validate every step of `plan` against the tool catalog: the step's
/// `(tool, action)` pair must exist and its required args must be present.
pub fn dry_run(plan: &Plan) -> DryRunReport {
    let mut invalid = Vec::new();

    for (index, step) in plan.steps.iter().enumerate() {
        match CATALOG.action(&step.tool, &step.action) {
            None => invalid.push(InvalidStep {
                index,
                reason: format!("unknown tool/action {}.{}", step.tool, step.action),
            }),
            Some(spec) => {
                for required in spec.required_args {
                    if !step.args.contains_key(*required) {
                        invalid.push(InvalidStep {
                            index,
                            reason: format!("missing required arg `{required}`"),
                        });
                        break;
                    }
                }
            }
        }
    }

    let total = plan.steps.len();
    let valid = total - invalid.len();
    DryRunReport {
        total,
        valid,
        can_execute: invalid.is_empty(),
        invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_core::PlanStep;

    #[test]
    fn valid_plan_can_execute() {
        let plan = Plan {
            steps: vec![PlanStep::new("files", "read_file").with_arg("path", serde_json::json!("a.txt"))],
            reasoning: String::new(),
        };
        let report = dry_run(&plan);
        assert!(report.can_execute);
        assert_eq!(report.valid, 1);
    }

    #[test]
    fn missing_required_arg_is_invalid() {
        let plan = Plan {
            steps: vec![PlanStep::new("files", "read_file")],
            reasoning: String::new(),
        };
        let report = dry_run(&plan);
        assert!(!report.can_execute);
        assert_eq!(report.invalid.len(), 1);
    }

    #[test]
    fn unknown_action_is_invalid() {
        let plan = Plan {
            steps: vec![PlanStep::new("files", "teleport")],
            reasoning: String::new(),
        };
        let report = dry_run(&plan);
        assert!(!report.can_execute);
    }

    #[test]
    fn empty_plan_can_execute() {
        let report = dry_run(&Plan::default());
        assert!(report.can_execute);
        assert_eq!(report.total, 0);
    }
}
