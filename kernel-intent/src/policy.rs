//! Sensitive-step tagging: a short-circuiting pipeline of
//! policies over a [`PlanStep`], in the same observe-then-decide shape
//! the rest of the kernel uses for cross-cutting concerns. Each policy
//! gets a chance to flag a step; the first non-`Continue` decision
//! wins and later policies are not consulted.

use kernel_core::{PlanStep, CATALOG};
use std::sync::Arc;

/// One policy's verdict on a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensitiveDecision {
    /// This policy has no opinion; consult the next one.
    Continue,
    /// This step is sensitive and must be gated behind confirmation.
    Sensitive {
        /// Why the policy flagged it.
        reason: String,
    },
}

/// One link in the sensitive-step pipeline.
pub trait SensitivePolicy: Send + Sync {
    /// Evaluate `step`, returning `Continue` to defer to the next policy.
    fn evaluate(&self, step: &PlanStep) -> SensitiveDecision;
}

/// The fixed catalog lookup as a policy.
pub struct CatalogSensitivePolicy;

impl SensitivePolicy for CatalogSensitivePolicy {
    fn evaluate(&self, step: &PlanStep) -> SensitiveDecision {
        match CATALOG.action(&step.tool, &step.action) {
            Some(spec) if spec.sensitive => SensitiveDecision::Sensitive {
                reason: format!("{}.{} is a sensitive action", step.tool, step.action),
            },
            _ => SensitiveDecision::Continue,
        }
    }
}

/// An ordered pipeline of [`SensitivePolicy`] links, dispatched in
/// registration order. Policy errors are not representable here by
/// design — `evaluate` cannot fail, so no decision is ever silently
/// dropped the way a hook's error would be.
pub struct SensitivePolicyPipeline {
    policies: Vec<Arc<dyn SensitivePolicy>>,
}

impl SensitivePolicyPipeline {
    /// An empty pipeline.
    pub fn new() -> Self {
        Self { policies: Vec::new() }
    }

    /// The default pipeline: just the catalog lookup.
    pub fn with_defaults() -> Self {
        let mut pipeline = Self::new();
        pipeline.add(Arc::new(CatalogSensitivePolicy));
        pipeline
    }

    /// Append a policy to the end of the pipeline.
    pub fn add(&mut self, policy: Arc<dyn SensitivePolicy>) {
        self.policies.push(policy);
    }

    /// Run `step` through the pipeline, stopping at the first non-`Continue` verdict.
    pub fn evaluate(&self, step: &PlanStep) -> SensitiveDecision {
        for policy in &self.policies {
            match policy.evaluate(step) {
                SensitiveDecision::Continue => continue,
                decision => return decision,
            }
        }
        SensitiveDecision::Continue
    }

    /// Convenience: whether `step` is sensitive under this pipeline.
    pub fn is_sensitive(&self, step: &PlanStep) -> bool {
        matches!(self.evaluate(step), SensitiveDecision::Sensitive { .. })
    }
}

impl Default for SensitivePolicyPipeline {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_flags_write_file_as_sensitive() {
        let pipeline = SensitivePolicyPipeline::with_defaults();
        let step = PlanStep::new("files", "write_file")
            .with_arg("path", serde_json::json!("a.txt"))
            .with_arg("content", serde_json::json!("x"));
        assert!(pipeline.is_sensitive(&step));
    }

    #[test]
    fn catalog_does_not_flag_read_file() {
        let pipeline = SensitivePolicyPipeline::with_defaults();
        let step = PlanStep::new("files", "read_file").with_arg("path", serde_json::json!("a.txt"));
        assert!(!pipeline.is_sensitive(&step));
    }

    #[test]
    fn a_flagging_policy_short_circuits_later_policies() {
        struct AlwaysFlag;
        impl SensitivePolicy for AlwaysFlag {
            fn evaluate(&self, _step: &PlanStep) -> SensitiveDecision {
                SensitiveDecision::Sensitive { reason: "always".to_string() }
            }
        }
        struct Panics;
        impl SensitivePolicy for Panics {
            fn evaluate(&self, _step: &PlanStep) -> SensitiveDecision {
                panic!("should never be consulted");
            }
        }

        let mut pipeline = SensitivePolicyPipeline::new();
        pipeline.add(Arc::new(AlwaysFlag));
        pipeline.add(Arc::new(Panics));

        let step = PlanStep::new("files", "read_file").with_arg("path", serde_json::json!("a.txt"));
        assert!(pipeline.is_sensitive(&step));
    }

    #[test]
    fn empty_pipeline_never_flags() {
        let pipeline = SensitivePolicyPipeline::new();
        let step = PlanStep::new("files", "delete_file").with_arg("path", serde_json::json!("a.txt"));
        assert!(!pipeline.is_sensitive(&step));
    }
}
