use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use zpsexec::config::EngineConfig;
use zpsexec::script::Script;
use zpsexec::task::Task;

/// Shell preamble every fake runner starts with. It leaves the value of
/// `--script` in `$SCRIPT`.
const RUNNER_PREAMBLE: &str = r#"#!/bin/sh
SCRIPT=""
while [ $# -gt 0 ]; do
  case "$1" in
    --script) SCRIPT="$2"; shift 2 ;;
    *) shift ;;
  esac
done
"#;

/// A throwaway shared path with installable fake runners.
///
/// Layout under the temp root:
/// - `shared/plugins/lang-<id>/bin/<runner>`: fake runners
/// - `jobs/`: task scripts
/// - `work/`: task work dir
/// - `logs/task.log`: task log
pub struct SharedFixture {
    root: TempDir,
}

impl SharedFixture {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn shared_path(&self) -> PathBuf {
        self.root.path().join("shared")
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.path().join("logs").join("task.log")
    }

    pub fn config(&self) -> EngineConfig {
        EngineConfig::default().with_shared_path(self.shared_path())
    }

    /// Install `body` as the `zpsrun` runner of `runtime`.
    pub fn install_runner(&self, runtime: &str, body: &str) -> PathBuf {
        let bin = self
            .shared_path()
            .join("plugins")
            .join(format!("lang-{runtime}"))
            .join("bin");
        fs::create_dir_all(&bin).expect("create runner dir");
        let path = bin.join("zpsrun");
        fs::write(&path, format!("{RUNNER_PREAMBLE}{body}\n")).expect("write runner");
        make_executable(&path);
        path
    }

    pub fn write_script(&self, name: &str, script: &Script) -> PathBuf {
        let dir = self.root.path().join("jobs");
        fs::create_dir_all(&dir).expect("create jobs dir");
        let path = dir.join(name);
        fs::write(&path, script.to_json().expect("serialize script")).expect("write script");
        path
    }

    pub fn task(&self, script_path: &Path) -> Task {
        Task::new(script_path, self.root.path().join("work"))
            .with_id("test-task")
            .with_log_path(self.log_path())
    }

    pub fn read_log(&self) -> String {
        fs::read_to_string(self.log_path()).unwrap_or_default()
    }
}

impl Default for SharedFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path).expect("runner metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("chmod runner");
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}
