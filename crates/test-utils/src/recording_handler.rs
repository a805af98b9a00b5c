use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use zpsexec::exec::ReactionHandler;
use zpsexec::reaction::Reaction;
use zpsexec::task::Task;

/// Records every reaction it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    seen: Arc<Mutex<Vec<Reaction>>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<Reaction> {
        self.seen.lock().unwrap().clone()
    }
}

impl ReactionHandler for RecordingHandler {
    fn handle(&self, _task: &Task, reaction: &Reaction) -> anyhow::Result<()> {
        self.seen.lock().unwrap().push(reaction.clone());
        Ok(())
    }
}

/// Always returns an error.
#[derive(Debug, Clone, Default)]
pub struct FailingHandler;

impl ReactionHandler for FailingHandler {
    fn handle(&self, _task: &Task, _reaction: &Reaction) -> anyhow::Result<()> {
        Err(anyhow!("handler failure"))
    }
}

/// Always panics.
#[derive(Debug, Clone, Default)]
pub struct PanickingHandler;

impl ReactionHandler for PanickingHandler {
    fn handle(&self, _task: &Task, _reaction: &Reaction) -> anyhow::Result<()> {
        panic!("handler panic");
    }
}
