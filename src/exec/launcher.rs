// src/exec/launcher.rs

//! Command construction and process start for one phase.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use os_pipe::PipeReader;
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::errors::{Result, ZpsError};
use crate::exec::env::{EnvOverlay, build_env};
use crate::fs::FileSystem;
use crate::task::Task;

/// Fully resolved invocation of a runner.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: EnvOverlay,
    pub work_dir: PathBuf,
}

impl CommandSpec {
    /// Space-joined command line, as written to the task log header.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// `<shared>/plugins/lang-<runtime>/bin/<runner>`
pub fn runner_path(config: &EngineConfig, runtime_id: &str, runner: &str) -> PathBuf {
    config
        .plugins_path()
        .join(format!("lang-{runtime_id}"))
        .join("bin")
        .join(runner)
}

/// Build the command line and environment for running `script_path` under
/// `runtime_id`.
pub fn build_command(
    task: &Task,
    script_path: &Path,
    runtime_id: &str,
    config: &EngineConfig,
    fs: &dyn FileSystem,
) -> Result<CommandSpec> {
    let runtime = config
        .runtime(runtime_id)
        .ok_or_else(|| ZpsError::UnknownRuntime(runtime_id.to_string()))?;

    let mut args = vec![
        "--shared-path".to_string(),
        config.shared_path.display().to_string(),
        "--script".to_string(),
        script_path.display().to_string(),
    ];
    for flag in task.global_flags() {
        args.push("--global".to_string());
        args.push(flag);
    }

    let env = build_env(task, runtime, config, fs)?;

    Ok(CommandSpec {
        program: runner_path(config, runtime_id, &runtime.runner),
        args,
        env,
        work_dir: task.work_path.clone(),
    })
}

/// A live runner process. Exactly one exists per task at any instant.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    pid: Option<u32>,
    output: Option<PipeReader>,
}

impl ProcessHandle {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Read end of the pipe shared by the child's stdout and stderr.
    pub fn take_output(&mut self) -> Option<PipeReader> {
        self.output.take()
    }

    /// Send a kill signal without waiting for exit.
    pub fn start_kill(&mut self) {
        if let Err(e) = self.child.start_kill() {
            debug!(pid = ?self.pid, error = %e, "kill on already-exited process");
        }
    }

    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }
}

/// Start the runner described by `spec`.
///
/// The work directory is created if missing. Stdout and stderr share one
/// pipe, so the combined stream keeps the child's write order. The child is
/// killed if the handle is dropped.
pub fn launch(spec: &CommandSpec) -> Result<ProcessHandle> {
    std::fs::create_dir_all(&spec.work_dir)?;

    let (reader, writer) = os_pipe::pipe()?;
    let stderr_writer = writer.try_clone()?;

    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .current_dir(&spec.work_dir)
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(stderr_writer)
        .kill_on_drop(true);
    for (key, value) in spec.env.iter() {
        cmd.env(key, value);
    }

    let child = cmd.spawn().map_err(|source| ZpsError::Spawn {
        program: spec.program.clone(),
        source,
    })?;
    // Our copies of the write end must go before reading, or EOF never comes.
    drop(cmd);
    let pid = child.id();

    info!(pid = ?pid, program = %spec.program.display(), "runner process started");
    Ok(ProcessHandle {
        child,
        pid,
        output: Some(reader),
    })
}
