// src/engine/tracker.rs

//! State shared between the phase loop and the canceller.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

/// The runner process of the active phase, as seen from outside the loop.
///
/// The phase loop owns the actual child; `destroy` asks it to force-kill.
#[derive(Debug, Clone)]
pub struct TrackedProcess {
    pub pid: Option<u32>,
    kill: Arc<Notify>,
    destroyed: Arc<AtomicBool>,
}

impl TrackedProcess {
    pub fn new(pid: Option<u32>) -> Self {
        Self {
            pid,
            kill: Arc::new(Notify::new()),
            destroyed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signal the phase loop to kill its child. Stored as a permit if the loop
    /// is not waiting yet.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        self.kill.notify_one();
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub(crate) fn kill_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.kill)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrackedPhase {
    pub script_path: Option<PathBuf>,
    pub process: Option<TrackedProcess>,
}

/// Current script path and process, plus the cancellation flag.
///
/// Path and process are only read or replaced together under one lock, so the
/// canceller never pairs a new path with an old process.
#[derive(Debug, Default)]
pub struct PhaseTracker {
    canceled: AtomicBool,
    current: Mutex<TrackedPhase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TrackedPhase> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    /// Set the cancellation flag. Returns true only for the first caller.
    pub fn mark_canceled(&self) -> bool {
        self.canceled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn set_script(&self, path: PathBuf) {
        self.lock().script_path = Some(path);
    }

    /// Publish the phase's process.
    ///
    /// Returns false without publishing if the task was already canceled;
    /// the flag is checked under the lock so a concurrent cancel either sees
    /// this process or makes this call fail.
    pub fn begin_process(&self, process: TrackedProcess) -> bool {
        let mut current = self.lock();
        if self.is_canceled() {
            return false;
        }
        current.process = Some(process);
        true
    }

    pub fn end_process(&self) {
        self.lock().process = None;
    }

    pub fn snapshot(&self) -> TrackedPhase {
        self.lock().clone()
    }

    pub fn clear(&self) {
        *self.lock() = TrackedPhase::default();
    }
}
