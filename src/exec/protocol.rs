// src/exec/protocol.rs

//! Framing of reactions inside a runner's otherwise free-form output.
//!
//! ```text
//! processing frame 12
//! ######## BEGIN ########
//! {"error": {"className": "ValueError", "message": "..."}}
//! ######## END ########
//! processing frame 13
//! ```
//!
//! Lines outside a frame are ordinary log lines. Both sentinels are matched by
//! line prefix.

use thiserror::Error;

use crate::reaction::Reaction;

pub const BEGIN_SENTINEL: &str = "######## BEGIN ########";
pub const END_SENTINEL: &str = "######## END ########";

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed reaction: {source}")]
    Malformed {
        payload: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("output ended inside a reaction frame ({buffered} buffered lines)")]
    Unterminated { buffered: usize },
}

/// Classification of one line of runner output.
#[derive(Debug, PartialEq)]
pub enum LineEvent<'a> {
    /// Ordinary output; goes to the task log verbatim.
    Plain(&'a str),
    /// Begin sentinel; a frame is now open.
    Begin,
    /// Content line appended to the open frame.
    Buffered,
    /// End sentinel; the frame decoded into a reaction.
    Reaction(Reaction),
}

/// Line-by-line frame parser. One instance per phase.
#[derive(Debug, Default)]
pub struct FrameParser {
    buffer: Option<Vec<String>>,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_frame(&self) -> bool {
        self.buffer.is_some()
    }

    /// Feed one line (without its trailing newline).
    pub fn feed<'a>(&mut self, line: &'a str) -> Result<LineEvent<'a>, ProtocolError> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        let Some(buffer) = self.buffer.as_mut() else {
            if line.starts_with(BEGIN_SENTINEL) {
                self.buffer = Some(Vec::new());
                return Ok(LineEvent::Begin);
            }
            return Ok(LineEvent::Plain(line));
        };

        if line.starts_with(END_SENTINEL) {
            let payload = self.buffer.take().unwrap_or_default().join("\n");
            return match Reaction::from_json(&payload) {
                Ok(reaction) => Ok(LineEvent::Reaction(reaction)),
                Err(source) => Err(ProtocolError::Malformed { payload, source }),
            };
        }

        buffer.push(line.to_string());
        Ok(LineEvent::Buffered)
    }

    /// Signal end of stream. An open frame at this point is an error.
    pub fn finish(&mut self) -> Result<(), ProtocolError> {
        match self.buffer.take() {
            Some(buffered) => Err(ProtocolError::Unterminated {
                buffered: buffered.len(),
            }),
            None => Ok(()),
        }
    }
}
