//! Boundary model for the lecture script handed in by the upstream script
//! generator. A [`Script`] is immutable once deserialized; the engine accepts
//! whatever scene structure it is given and never re-derives narration text.

use serde::{Deserialize, Serialize};

/// One of the two fixed speaker roles in a lecture dialogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    /// The lecturing figure (left, blue palette).
    Teacher,
    /// The questioning figure (right, red palette).
    Student,
}

impl Speaker {
    /// Human-readable role name used in on-screen labels.
    pub fn label(self) -> &'static str {
        match self {
            Speaker::Teacher => "Teacher",
            Speaker::Student => "Student",
        }
    }
}

/// A single dialogue line spoken by one role.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Line {
    /// Who speaks the line.
    #[serde(alias = "who")]
    pub speaker: Speaker,
    /// The spoken text, also shown in the speech bubble.
    #[serde(alias = "line")]
    pub text: String,
}

/// A titled scene with a key takeaway line and an ordered dialogue.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scene {
    /// Scene title shown on the info card.
    pub title: String,
    /// Condensed key point shown under the title.
    #[serde(default)]
    pub keyline: String,
    /// Ordered dialogue lines.
    #[serde(default)]
    pub dialogue: Vec<Line>,
}

/// An ordered sequence of scenes; the full input contract of the engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    /// Scenes in presentation order. May be empty (a placeholder utterance is
    /// synthesized during timeline allocation).
    pub scenes: Vec<Scene>,
}

impl Script {
    /// Total number of dialogue lines across all scenes.
    pub fn line_count(&self) -> usize {
        self.scenes.iter().map(|s| s.dialogue.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_upstream_json_shape() {
        // Field aliases accept the upstream generator's `who`/`line` names.
        let json = r#"[
            {
                "title": "Concept 1",
                "keyline": "Supply meets demand",
                "dialogue": [
                    {"who": "Teacher", "line": "Key idea 1."},
                    {"who": "Student", "line": "So we adjust pricing?"}
                ]
            }
        ]"#;
        let script: Script = serde_json::from_str(json).unwrap();
        assert_eq!(script.scenes.len(), 1);
        assert_eq!(script.line_count(), 2);
        assert_eq!(script.scenes[0].dialogue[0].speaker, Speaker::Teacher);
        assert_eq!(script.scenes[0].dialogue[1].text, "So we adjust pricing?");
    }

    #[test]
    fn missing_keyline_and_dialogue_default_to_empty() {
        let json = r#"[{"title": "Bare"}]"#;
        let script: Script = serde_json::from_str(json).unwrap();
        assert_eq!(script.scenes[0].keyline, "");
        assert!(script.scenes[0].dialogue.is_empty());
        assert_eq!(script.line_count(), 0);
    }
}
