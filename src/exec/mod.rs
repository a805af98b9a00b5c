// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`launcher`] builds the runner command line and starts the process.
//! - [`env`] builds the environment exported to every runner.
//! - [`output`] reads the combined stdout/stderr pipe line by line.
//! - [`protocol`] recognises sentinel-framed reactions in that stream.
//! - [`dispatcher`] routes decoded reactions to the queue or to handlers.
//! - [`log_sink`] writes the task log with its header and footer.
//! - [`phase`] runs one spawn-drain-wait cycle using all of the above.

pub mod dispatcher;
pub mod env;
pub mod launcher;
pub mod log_sink;
pub mod output;
pub mod phase;
pub mod protocol;

pub use dispatcher::{LoggingHandler, ReactionDispatcher, ReactionHandler};
pub use launcher::{CommandSpec, ProcessHandle, build_command, launch};
pub use phase::{PhaseContext, run_phase};
pub use protocol::{BEGIN_SENTINEL, END_SENTINEL, FrameParser, LineEvent, ProtocolError};
