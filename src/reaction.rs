// src/reaction.rs

//! Structured messages a worker embeds in its output stream.

use serde::{Deserialize, Serialize};

use crate::script::Script;

/// One framed message from a running phase.
///
/// Serialized with the variant name as the only key:
///
/// ```json
/// { "error": { "className": "ValueError", "message": "bad frame", "lineNumber": 12,
///              "phase": "execute", "skipped": false } }
/// { "nextProcess": { "execute": [ { "language": "python" } ] } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Reaction {
    Error(ReactionError),
    NextProcess(Script),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReactionError {
    pub class_name: String,
    pub message: String,
    pub line_number: i64,
    pub phase: String,
    pub skipped: bool,
}

impl Reaction {
    /// Error reaction synthesized by the engine when a runner cannot start.
    pub fn spawn_failure(message: impl Into<String>) -> Self {
        Reaction::Error(ReactionError {
            class_name: "SpawnError".to_string(),
            message: message.into(),
            line_number: 0,
            phase: "launch".to_string(),
            skipped: false,
        })
    }

    pub fn as_error(&self) -> Option<&ReactionError> {
        match self {
            Reaction::Error(err) => Some(err),
            Reaction::NextProcess(_) => None,
        }
    }

    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str(contents)
    }
}
