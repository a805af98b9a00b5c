// src/cancel/platform.rs

//! Per-platform [`ProcessTreeEnumerator`] implementations.

use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use sysinfo::{Pid, ProcessStatus, Signal, System};

use super::tree::{ProcessEntry, ProcessTreeEnumerator};

const KILL_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Process table access through `sysinfo`, used on unix-like systems.
#[derive(Debug, Default, Clone)]
pub struct SysinfoEnumerator;

impl ProcessTreeEnumerator for SysinfoEnumerator {
    fn supported(&self) -> bool {
        sysinfo::IS_SUPPORTED_SYSTEM
    }

    fn snapshot(&self) -> Result<Vec<ProcessEntry>> {
        let mut sys = System::new();
        sys.refresh_processes();
        Ok(sys
            .processes()
            .iter()
            .map(|(pid, process)| ProcessEntry {
                pid: pid.as_u32(),
                parent: process.parent().map(|p| p.as_u32()),
                cmd: process.cmd().to_vec(),
            })
            .collect())
    }

    fn kill(&self, pid: u32, wait: Duration) -> Result<()> {
        let pid = Pid::from_u32(pid);
        let mut sys = System::new();
        if is_gone(&mut sys, pid) {
            return Ok(());
        }
        let process = sys
            .process(pid)
            .ok_or_else(|| anyhow!("process {pid} disappeared"))?;
        match process.kill_with(Signal::Kill) {
            Some(true) => {}
            Some(false) => return Err(anyhow!("kill signal to {pid} was not delivered")),
            None => return Err(anyhow!("SIGKILL not supported on this platform")),
        }

        let deadline = Instant::now() + wait;
        while Instant::now() < deadline {
            if is_gone(&mut sys, pid) {
                return Ok(());
            }
            std::thread::sleep(KILL_POLL_INTERVAL);
        }
        Err(anyhow!("process {pid} still alive after {wait:?}"))
    }
}

/// Exited or a zombie. The runner is our own child and stays a zombie until
/// the phase loop reaps it, so waiting for it to vanish would always time out.
fn is_gone(sys: &mut System, pid: Pid) -> bool {
    if !sys.refresh_process(pid) {
        return true;
    }
    sys.process(pid)
        .is_none_or(|process| process.status() == ProcessStatus::Zombie)
}

/// Used where no process-signal tooling is available (Windows).
#[derive(Debug, Default, Clone)]
pub struct UnsupportedEnumerator;

impl ProcessTreeEnumerator for UnsupportedEnumerator {
    fn supported(&self) -> bool {
        false
    }

    fn snapshot(&self) -> Result<Vec<ProcessEntry>> {
        Err(anyhow!("process tree enumeration is not supported on this platform"))
    }

    fn kill(&self, pid: u32, _wait: Duration) -> Result<()> {
        Err(anyhow!("cannot signal pid {pid} on this platform"))
    }
}
