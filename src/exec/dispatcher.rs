// src/exec/dispatcher.rs

//! Routing of decoded reactions.
//!
//! - `NextProcess` reactions become continuation scripts on the task's queue.
//! - Everything else is handed to every registered [`ReactionHandler`].

use std::fmt::Debug;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::engine::queue::ContinuationQueue;
use crate::reaction::Reaction;
use crate::task::Task;

/// Consumer of reactions other than continuations (typically errors).
pub trait ReactionHandler: Send + Sync + Debug {
    fn handle(&self, task: &Task, reaction: &Reaction) -> anyhow::Result<()>;
}

/// Handler that records error reactions in the engine log.
#[derive(Debug, Default, Clone)]
pub struct LoggingHandler;

impl ReactionHandler for LoggingHandler {
    fn handle(&self, task: &Task, reaction: &Reaction) -> anyhow::Result<()> {
        if let Some(err) = reaction.as_error() {
            error!(
                task = %task.id,
                class = %err.class_name,
                phase = %err.phase,
                line = err.line_number,
                skipped = err.skipped,
                "{}",
                err.message
            );
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct ReactionDispatcher {
    handlers: Vec<Arc<dyn ReactionHandler>>,
}

impl ReactionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn ReactionHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Dispatch one reaction.
    ///
    /// A handler that fails or panics is logged and skipped; the remaining
    /// handlers still see the reaction.
    pub fn dispatch(&self, task: &Task, reaction: Reaction, queue: &mut ContinuationQueue) {
        let reaction = match reaction {
            Reaction::NextProcess(script) => {
                queue.push(script);
                info!(task = %task.id, queued = queue.len(), "queued continuation script");
                return;
            }
            other => other,
        };

        debug!(task = %task.id, handlers = self.handlers.len(), "dispatching reaction");
        for (idx, handler) in self.handlers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| handler.handle(task, &reaction))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(task = %task.id, handler = idx, error = %e, "reaction handler failed");
                }
                Err(_) => {
                    error!(task = %task.id, handler = idx, "reaction handler panicked");
                }
            }
        }
    }
}
