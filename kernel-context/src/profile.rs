//! Adaptive RAG top-k weighting.

/// Which dataset family the Context Builder should weight toward, when
/// an intent classification is available. Falls back to
/// [`IntentProfile::Balanced`] when none is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntentProfile {
    /// The fixed default weighting.
    #[default]
    Balanced,
    /// Weight toward `agent_core` (identity/rules questions).
    RulesHeavy,
    /// Weight toward `projects` (ongoing-work questions).
    ProjectHeavy,
    /// Weight toward `agent_memory` (lessons-learned questions).
    MemoryHeavy,
    /// Same RAG weighting as [`IntentProfile::Balanced`], used when the
    /// intent router has flagged this turn as vision/audio-relevant —
    /// the Context Builder still fetches those sources whenever their
    /// tool-clients are registered, regardless of profile.
    VisionAudioEnabled,
}

impl IntentProfile {
    /// Per-dataset top-k under this profile, as `(dataset_tag, top_k)` pairs.
    pub fn rag_top_k(self) -> [(&'static str, usize); 4] {
        match self {
            IntentProfile::Balanced | IntentProfile::VisionAudioEnabled => {
                [("agent_core", 2), ("projects", 2), ("scratchpad", 1), ("agent_memory", 1)]
            }
            IntentProfile::RulesHeavy => {
                [("agent_core", 4), ("projects", 1), ("scratchpad", 1), ("agent_memory", 1)]
            }
            IntentProfile::ProjectHeavy => {
                [("agent_core", 1), ("projects", 4), ("scratchpad", 1), ("agent_memory", 1)]
            }
            IntentProfile::MemoryHeavy => {
                [("agent_core", 1), ("projects", 1), ("scratchpad", 1), ("agent_memory", 4)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_matches_spec_defaults() {
        assert_eq!(
            IntentProfile::Balanced.rag_top_k(),
            [("agent_core", 2), ("projects", 2), ("scratchpad", 1), ("agent_memory", 1)]
        );
    }

    #[test]
    fn rules_heavy_weights_agent_core() {
        let top_k = IntentProfile::RulesHeavy.rag_top_k();
        let agent_core = top_k.iter().find(|(d, _)| *d == "agent_core").unwrap().1;
        assert_eq!(agent_core, 4);
    }
}
