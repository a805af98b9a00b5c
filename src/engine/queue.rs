// src/engine/queue.rs

use std::collections::VecDeque;

use tracing::debug;

use crate::script::Script;

/// Continuation scripts waiting to run after the current phase.
///
/// Semantics:
/// - A single phase may push any number of scripts (fan-out).
/// - The executor pops exactly one per loop iteration and runs it as the next
///   phase, so continuations always run one at a time in FIFO order.
/// - A phase that is itself a continuation may push more; they queue behind
///   whatever is already waiting.
#[derive(Debug, Default)]
pub struct ContinuationQueue {
    pending: VecDeque<Script>,
}

impl ContinuationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, script: Script) {
        self.pending.push_back(script);
    }

    pub fn pop(&mut self) -> Option<Script> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Script> {
        self.pending.iter()
    }

    pub fn clear(&mut self) {
        if !self.pending.is_empty() {
            debug!(dropped = self.pending.len(), "clearing continuation queue");
        }
        self.pending.clear();
    }
}
