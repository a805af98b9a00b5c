use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use zpsexec::cancel::{ProcessEntry, ProcessTreeEnumerator};

/// A fake process table that:
/// - serves a fixed snapshot
/// - records every pid it was asked to kill
/// - can fail kills for selected pids or the whole snapshot.
#[derive(Debug, Clone, Default)]
pub struct FakeEnumerator {
    table: Vec<ProcessEntry>,
    unsupported: bool,
    fail_snapshot: bool,
    fail_pids: Vec<u32>,
    killed: Arc<Mutex<Vec<u32>>>,
    snapshots: Arc<Mutex<usize>>,
}

impl FakeEnumerator {
    pub fn new(table: Vec<ProcessEntry>) -> Self {
        Self {
            table,
            ..Self::default()
        }
    }

    pub fn unsupported(mut self) -> Self {
        self.unsupported = true;
        self
    }

    pub fn failing_snapshot(mut self) -> Self {
        self.fail_snapshot = true;
        self
    }

    pub fn failing_kill(mut self, pid: u32) -> Self {
        self.fail_pids.push(pid);
        self
    }

    pub fn killed(&self) -> Vec<u32> {
        self.killed.lock().unwrap().clone()
    }

    pub fn snapshot_count(&self) -> usize {
        *self.snapshots.lock().unwrap()
    }
}

impl ProcessTreeEnumerator for FakeEnumerator {
    fn supported(&self) -> bool {
        !self.unsupported
    }

    fn snapshot(&self) -> Result<Vec<ProcessEntry>> {
        *self.snapshots.lock().unwrap() += 1;
        if self.fail_snapshot {
            return Err(anyhow!("snapshot failed"));
        }
        Ok(self.table.clone())
    }

    fn kill(&self, pid: u32, _wait: Duration) -> Result<()> {
        self.killed.lock().unwrap().push(pid);
        if self.fail_pids.contains(&pid) {
            return Err(anyhow!("kill {pid} failed"));
        }
        Ok(())
    }
}
