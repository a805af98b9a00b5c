// src/envelope.rs

//! Byte envelopes for shipping scripts and reactions between nodes.
//!
//! The engine does not own any transport. A coordinator that runs phases on
//! separate workers can wrap an outbound continuation in a
//! [`ContinuationEnvelope`] (name + blob) and a finished reaction in a
//! [`ResultEnvelope`] (single blob), and move the bytes however it likes.

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::reaction::Reaction;
use crate::script::Script;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationEnvelope {
    pub name: String,
    pub payload: Vec<u8>,
}

impl ContinuationEnvelope {
    pub fn from_script(name: impl Into<String>, script: &Script) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            payload: serde_json::to_vec(script)?,
        })
    }

    pub fn into_script(self) -> Result<Script> {
        Ok(serde_json::from_slice(&self.payload)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub payload: Vec<u8>,
}

impl ResultEnvelope {
    pub fn from_reaction(reaction: &Reaction) -> Result<Self> {
        Ok(Self {
            payload: serde_json::to_vec(reaction)?,
        })
    }

    pub fn into_reaction(self) -> Result<Reaction> {
        Ok(serde_json::from_slice(&self.payload)?)
    }
}
