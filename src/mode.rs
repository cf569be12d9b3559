use std::fmt;

use serde::{Deserialize, Serialize};

/// Writing persona selected by the user.
///
/// The mode has no structural effect on the document; it only changes how
/// prompts sent to the assist service are phrased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditorMode {
    Academic,
    Novel,
    General,
}

impl EditorMode {
    /// Persona string interpolated into assist prompts.
    pub fn persona(self) -> &'static str {
        match self {
            EditorMode::Academic => "strict academic",
            EditorMode::Novel => "creative writing",
            EditorMode::General => "professional",
        }
    }
}

impl fmt::Display for EditorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EditorMode::Academic => "ACADEMIC",
            EditorMode::Novel => "NOVEL",
            EditorMode::General => "GENERAL",
        })
    }
}

impl Default for EditorMode {
    fn default() -> Self {
        EditorMode::General
    }
}
