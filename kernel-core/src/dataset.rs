//! The fixed RAG dataset taxonomy.

use serde::{Deserialize, Serialize};

/// One of the fixed dataset buckets a Document lives in.
///
/// The taxonomy is closed by design: callers name a dataset (or a
/// `metadata.type`) and it canonicalizes onto one of these five, never
/// onto an arbitrary caller-chosen string. This keeps retention policy
/// and context-profile weighting a total function over datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    /// Permanent identity, rules, structural facts. Never expires.
    AgentCore,
    /// Rolling summaries, conversational distillate. 90-day retention.
    ContextFlow,
    /// Feedback and lessons learned. Never expires.
    AgentMemory,
    /// Code/docs of ongoing work. 180-day retention.
    Projects,
    /// Ephemeral notes. 7-day retention.
    Scratchpad,
}

impl Dataset {
    /// Retention window in days, or `None` if the dataset never expires.
    pub fn retention_days(self) -> Option<u32> {
        match self {
            Dataset::AgentCore | Dataset::AgentMemory => None,
            Dataset::ContextFlow => Some(90),
            Dataset::Projects => Some(180),
            Dataset::Scratchpad => Some(7),
        }
    }

    /// The canonical tag used on the wire and as the storage table key.
    pub fn as_str(self) -> &'static str {
        match self {
            Dataset::AgentCore => "agent_core",
            Dataset::ContextFlow => "context_flow",
            Dataset::AgentMemory => "agent_memory",
            Dataset::Projects => "projects",
            Dataset::Scratchpad => "scratchpad",
        }
    }

    /// Canonicalize a free-form dataset tag. Unknown tags route to
    /// [`Dataset::Scratchpad`] rather than being rejected — ingestion
    /// never fails merely because the caller used an unrecognized label.
    pub fn canonicalize(tag: &str) -> Dataset {
        match tag.trim().to_ascii_lowercase().as_str() {
            "agent_core" | "core" | "rules" | "identity" => Dataset::AgentCore,
            "context_flow" | "context" | "flow" | "summaries" => Dataset::ContextFlow,
            "agent_memory" | "memory" | "feedback" | "lessons" => Dataset::AgentMemory,
            "projects" | "project" | "code" => Dataset::Projects,
            _ => Dataset::Scratchpad,
        }
    }

    /// Route by a document's declared `metadata.type` against a fixed
    /// type→dataset table. Unknown types also route to scratchpad.
    pub fn from_metadata_type(doc_type: &str) -> Dataset {
        match doc_type.trim().to_ascii_lowercase().as_str() {
            "core_rule" => Dataset::AgentCore,
            "context_data" => Dataset::ContextFlow,
            "learning_data" => Dataset::AgentMemory,
            "project_doc" => Dataset::Projects,
            _ => Dataset::Scratchpad,
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_aliases_canonicalize() {
        assert_eq!(Dataset::canonicalize("rules"), Dataset::AgentCore);
        assert_eq!(Dataset::canonicalize("Project"), Dataset::Projects);
        assert_eq!(Dataset::canonicalize("temp"), Dataset::Scratchpad);
    }

    #[test]
    fn unknown_tag_routes_to_scratchpad() {
        assert_eq!(Dataset::canonicalize("whatever-this-is"), Dataset::Scratchpad);
    }

    #[test]
    fn retention_matches_spec_table() {
        assert_eq!(Dataset::AgentCore.retention_days(), None);
        assert_eq!(Dataset::Scratchpad.retention_days(), Some(7));
        assert_eq!(Dataset::Projects.retention_days(), Some(180));
        assert_eq!(Dataset::ContextFlow.retention_days(), Some(90));
    }
}
