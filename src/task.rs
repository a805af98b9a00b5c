// src/task.rs

//! Task descriptor: everything needed to run one pipeline job.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use uuid::Uuid;

/// One unit of work handed to [`crate::engine::TaskExecutor`].
///
/// All fields are fixed for the lifetime of an `execute()` call except
/// `current_script_path`, which the executor updates at the start of every
/// phase.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    pub script_path: PathBuf,

    /// Environment overrides exported to every phase. `None` values are
    /// reported and skipped.
    pub env: BTreeMap<String, Option<String>>,

    /// Arguments passed to the runner as `--global key=value`.
    pub args: BTreeMap<String, Value>,

    /// Task log file; `None` writes to the host's stdout.
    pub log_path: Option<PathBuf>,

    pub work_path: PathBuf,

    pub current_script_path: Option<PathBuf>,
}

impl Task {
    pub fn new(script_path: impl Into<PathBuf>, work_path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            script_path: script_path.into(),
            env: BTreeMap::new(),
            args: BTreeMap::new(),
            log_path: None,
            work_path: work_path.into(),
            current_script_path: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.env.insert(key.into(), value);
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.args.insert(key.into(), value);
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Path of the continuation script for `phase`: `<script_path>.<phase>`.
    pub fn continuation_path(&self, phase: usize) -> PathBuf {
        let mut name = self.script_path.clone().into_os_string();
        name.push(format!(".{phase}"));
        PathBuf::from(name)
    }

    /// Render the `--global` flags for every non-null argument.
    pub fn global_flags(&self) -> Vec<String> {
        self.args
            .iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some(format!("{key}={s}")),
                other => Some(format!("{key}={other}")),
            })
            .collect()
    }

    pub fn log_target(&self) -> &Path {
        self.log_path
            .as_deref()
            .unwrap_or_else(|| Path::new("<stdout>"))
    }
}
