//! Keyword/regex intent classification.
//!
//! No ML dependency: classification is a fixed, ordered table of
//! regexes checked against the raw user message. The first pattern
//! family to match wins; an unmatched message is `General`.

use regex::RegexSet;
use std::sync::LazyLock;

/// The coarse intent bucket a user message falls into.
///
/// Consumed by the Planner to pick the Context Builder's adaptive
/// profile, and available to the Executor for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Asking about agent rules/policy (`agent_core` dataset territory).
    RulesQuery,
    /// Asking about a specific project.
    ProjectQuery,
    /// Asking the assistant to recall something from session history.
    MemoryQuery,
    /// Asking about an image or screenshot.
    VisionAnalysis,
    /// Asking about audio content.
    AudioProcessing,
    /// Anything else.
    General,
}

struct Family {
    intent: Intent,
    set: LazyLock<RegexSet>,
}

macro_rules! family {
    ($intent:expr, $($pattern:expr),+ $(,)?) => {
        Family {
            intent: $intent,
            set: LazyLock::new(|| RegexSet::new([$($pattern),+]).expect("valid regex set")),
        }
    };
}

static RULES: Family = family!(
    Intent::RulesQuery,
    r"(?i)\brègle",
    r"(?i)\brule",
    r"(?i)\bpolic(y|ies)",
    r"(?i)\bagent[_ ]?core",
);

static PROJECT: Family = family!(
    Intent::ProjectQuery,
    r"(?i)\bprojet",
    r"(?i)\bproject",
);

static MEMORY: Family = family!(
    Intent::MemoryQuery,
    r"(?i)\bsouviens",
    r"(?i)\bremember",
    r"(?i)\bm[ée]moire",
    r"(?i)\bhistoriqu",
    r"(?i)\bhistory",
);

static VISION: Family = family!(
    Intent::VisionAnalysis,
    r"(?i)\bimage",
    r"(?i)\bscreenshot",
    r"(?i)\bcapture",
    r"(?i)\bphoto",
    r"(?i)\bvision",
);

static AUDIO: Family = family!(
    Intent::AudioProcessing,
    r"(?i)\baudio",
    r"(?i)\btranscri",
    r"(?i)\bvoice",
    r"(?i)\bvocal",
);

/// Classify `message` into its coarse intent bucket, checked in a
/// fixed order: rules, project, memory, vision, audio, else general.
pub fn classify(message: &str) -> Intent {
    for family in [&RULES, &PROJECT, &MEMORY, &VISION, &AUDIO] {
        if family.set.is_match(message) {
            return family.intent;
        }
    }
    Intent::General
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_rules_query() {
        assert_eq!(classify("Quelles sont les règles de l'agent ?"), Intent::RulesQuery);
    }

    #[test]
    fn classifies_project_query() {
        assert_eq!(classify("Parle-moi du projet Acme"), Intent::ProjectQuery);
    }

    #[test]
    fn classifies_memory_query() {
        assert_eq!(classify("Tu te souviens de ce qu'on a dit hier ?"), Intent::MemoryQuery);
    }

    #[test]
    fn classifies_vision_analysis() {
        assert_eq!(classify("Analyse cette capture d'écran"), Intent::VisionAnalysis);
    }

    #[test]
    fn classifies_audio_processing() {
        assert_eq!(classify("Transcris ce fichier audio"), Intent::AudioProcessing);
    }

    #[test]
    fn falls_back_to_general() {
        assert_eq!(classify("Quel temps fait-il aujourd'hui ?"), Intent::General);
    }

    #[test]
    fn rules_checked_before_project_when_both_present() {
        assert_eq!(classify("règle du projet"), Intent::RulesQuery);
    }
}
