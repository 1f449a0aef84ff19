//! Timeline modality tags.

use serde::{Deserialize, Serialize};

/// Which channel a Timeline event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// Plain text / conversational events. The default.
    Text,
    /// Audio transcription/synthesis events.
    Audio,
    /// Vision/image analysis events.
    Vision,
    /// Document generation/ingestion events.
    Documents,
    /// OS/system-level events.
    System,
}

impl Modality {
    /// Derive a modality from an event type string when the caller
    /// didn't supply one explicitly, by scanning for a few known
    /// substrings. Defaults to [`Modality::Text`].
    pub fn derive_from_event_type(event_type: &str) -> Modality {
        let lower = event_type.to_ascii_lowercase();
        if lower.contains("audio") {
            Modality::Audio
        } else if lower.contains("vision") || lower.contains("image") {
            Modality::Vision
        } else if lower.contains("document") {
            Modality::Documents
        } else if lower.contains("system") {
            Modality::System
        } else {
            Modality::Text
        }
    }
}

impl std::str::FromStr for Modality {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Modality::Text),
            "audio" => Ok(Modality::Audio),
            "vision" => Ok(Modality::Vision),
            "documents" => Ok(Modality::Documents),
            "system" => Ok(Modality::System),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Modality::Text => "text",
            Modality::Audio => "audio",
            Modality::Vision => "vision",
            Modality::Documents => "documents",
            Modality::System => "system",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_vision_from_image_token() {
        assert_eq!(
            Modality::derive_from_event_type("vision.analyze_image"),
            Modality::Vision
        );
        assert_eq!(Modality::derive_from_event_type("screenshot_image_taken"), Modality::Vision);
    }

    #[test]
    fn defaults_to_text() {
        assert_eq!(Modality::derive_from_event_type("step_start"), Modality::Text);
    }
}
