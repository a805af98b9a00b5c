// src/cancel/tree.rs

//! Process-table snapshots and descendant collection.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;
use std::time::Duration;

use anyhow::Result;

/// One row of the OS process table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub parent: Option<u32>,
    pub cmd: Vec<String>,
}

impl ProcessEntry {
    pub fn new(pid: u32, parent: Option<u32>, cmd: &[&str]) -> Self {
        Self {
            pid,
            parent,
            cmd: cmd.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// True if `path` appears as a whole word anywhere on the command line.
    ///
    /// Arguments are split on whitespace so `sh -c "runner --script <path>"`
    /// matches too, while `<path>.2` does not match `<path>`.
    pub fn references(&self, path: &str) -> bool {
        !path.is_empty()
            && self
                .cmd
                .iter()
                .flat_map(|arg| arg.split_whitespace())
                .any(|word| word == path)
    }
}

/// Platform capability for listing and killing processes.
pub trait ProcessTreeEnumerator: Send + Sync + Debug {
    /// False on platforms where the table cannot be walked; cancellation then
    /// only destroys the directly tracked process.
    fn supported(&self) -> bool {
        true
    }

    fn snapshot(&self) -> Result<Vec<ProcessEntry>>;

    /// Forcefully kill `pid`, waiting up to `wait` for it to go away.
    fn kill(&self, pid: u32, wait: Duration) -> Result<()>;
}

/// Pids of every process whose command line references `script_path`, plus
/// `tracked_pid` when given. `exclude` (the host's own pid) is never a root.
pub fn find_roots(
    table: &[ProcessEntry],
    script_path: &str,
    tracked_pid: Option<u32>,
    exclude: u32,
) -> Vec<u32> {
    let mut roots: BTreeSet<u32> = table
        .iter()
        .filter(|entry| entry.pid != exclude && entry.references(script_path))
        .map(|entry| entry.pid)
        .collect();
    if let Some(pid) = tracked_pid {
        roots.insert(pid);
    }
    roots.into_iter().collect()
}

/// The roots and all their descendants, each pid exactly once.
///
/// Roots come first, followed by descendants in breadth-first order. Parent
/// cycles in a racy snapshot are tolerated.
pub fn collect_tree(table: &[ProcessEntry], roots: &[u32]) -> Vec<u32> {
    let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
    for entry in table {
        if let Some(parent) = entry.parent {
            children.entry(parent).or_default().push(entry.pid);
        }
    }

    let mut seen = BTreeSet::new();
    let mut ordered = Vec::new();
    let mut frontier: Vec<u32> = roots.to_vec();

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for pid in frontier {
            if !seen.insert(pid) {
                continue;
            }
            ordered.push(pid);
            if let Some(kids) = children.get(&pid) {
                next.extend(kids.iter().copied());
            }
        }
        frontier = next;
    }
    ordered
}
