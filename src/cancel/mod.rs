// src/cancel/mod.rs

//! Cancellation of a running task, including processes the engine never
//! spawned directly.
//!
//! On cancel the process table is walked for every process whose command
//! line mentions the current script path; those processes and all of their
//! descendants get SIGKILL. The tracked runner handle is destroyed afterwards
//! regardless of how the tree walk went.

pub mod platform;
pub mod tree;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::tracker::PhaseTracker;

pub use platform::{SysinfoEnumerator, UnsupportedEnumerator};
pub use tree::{ProcessEntry, ProcessTreeEnumerator, collect_tree, find_roots};

/// The enumerator for the host platform.
pub fn default_enumerator() -> Arc<dyn ProcessTreeEnumerator> {
    if cfg!(windows) {
        Arc::new(UnsupportedEnumerator)
    } else {
        Arc::new(SysinfoEnumerator)
    }
}

/// Cloneable handle that cancels one executor's task from any thread.
#[derive(Debug, Clone)]
pub struct Canceller {
    tracker: Arc<PhaseTracker>,
    enumerator: Arc<dyn ProcessTreeEnumerator>,
    wait: Duration,
}

impl Canceller {
    pub fn new(
        tracker: Arc<PhaseTracker>,
        enumerator: Arc<dyn ProcessTreeEnumerator>,
        wait: Duration,
    ) -> Self {
        Self {
            tracker,
            enumerator,
            wait,
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.tracker.is_canceled()
    }

    /// Cancel the task.
    ///
    /// Returns true only for the call that actually performed cancellation.
    /// Blocks while waiting for killed pids; from async code call it through
    /// `tokio::task::spawn_blocking`.
    pub fn cancel(&self) -> bool {
        if !self.tracker.mark_canceled() {
            debug!("cancel already requested");
            return false;
        }

        let phase = self.tracker.snapshot();
        let Some(process) = phase.process else {
            info!("task canceled before a runner was started");
            return true;
        };

        if self.enumerator.supported() {
            let script = phase
                .script_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            self.kill_tree(&script, process.pid);
        } else {
            debug!("process tree enumeration unsupported; killing runner only");
        }

        process.destroy();
        info!(pid = ?process.pid, "task canceled");
        true
    }

    fn kill_tree(&self, script: &str, tracked_pid: Option<u32>) {
        let table = match self.enumerator.snapshot() {
            Ok(table) => table,
            Err(e) => {
                warn!(error = %e, "cannot enumerate processes; killing runner only");
                return;
            }
        };

        let own_pid = std::process::id();
        let roots = find_roots(&table, script, tracked_pid, own_pid);
        let pids = collect_tree(&table, &roots);
        info!(script = %script, ?pids, "killing process tree");

        for pid in pids {
            if pid == own_pid {
                continue;
            }
            if let Err(e) = self.enumerator.kill(pid, self.wait) {
                debug!(pid, error = %e, "kill failed; continuing");
            }
        }
    }
}
