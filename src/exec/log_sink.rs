// src/exec/log_sink.rs

//! Task log: phase header, child output, phase footer.
//!
//! Every write is best-effort. Failures are reported through `tracing` and
//! never change a phase's exit code.

use std::path::Path;
use std::time::Duration;

use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;

use crate::exec::launcher::CommandSpec;
use crate::task::Task;
use crate::types::{ExitCode, SECRET_ENV_KEY};

const SEPARATOR: &str =
    "######################################################################";

pub struct PhaseLog {
    writer: Box<dyn AsyncWrite + Unpin + Send>,
    failed: bool,
}

impl PhaseLog {
    /// Open the task's log file for appending, or the host stdout when the
    /// task has no log path.
    pub async fn open(task: &Task) -> Self {
        let writer: Box<dyn AsyncWrite + Unpin + Send> = match task.log_path.as_deref() {
            Some(path) => match open_append(path).await {
                Ok(file) => Box::new(file),
                Err(e) => {
                    warn!(
                        task = %task.id,
                        path = %path.display(),
                        error = %e,
                        "cannot open task log; falling back to stdout"
                    );
                    Box::new(tokio::io::stdout())
                }
            },
            None => Box::new(tokio::io::stdout()),
        };
        Self::from_writer(writer)
    }

    pub fn from_writer(writer: Box<dyn AsyncWrite + Unpin + Send>) -> Self {
        Self {
            writer,
            failed: false,
        }
    }

    pub async fn line(&mut self, line: &str) {
        if self.failed {
            return;
        }
        let res = async {
            self.writer.write_all(line.as_bytes()).await?;
            self.writer.write_all(b"\n").await
        }
        .await;
        if let Err(e) = res {
            // One warning per phase; the child keeps running regardless.
            warn!(error = %e, "task log write failed; dropping further output");
            self.failed = true;
        }
    }

    pub async fn header(&mut self, task: &Task, spec: &CommandSpec) {
        self.line(SEPARATOR).await;
        self.line(&format!("Time: {}", chrono::Local::now().to_rfc3339()))
            .await;
        self.line(&format!("Command: {}", spec.command_line())).await;
        for (key, value) in task.env.iter() {
            if key == SECRET_ENV_KEY {
                continue;
            }
            if let Some(value) = value {
                self.line(&format!("ENV: {key}={value}")).await;
            }
        }
        self.line(SEPARATOR).await;
        self.flush().await;
    }

    pub async fn footer(&mut self, task: &Task, script_path: &Path, elapsed: Duration, exit_code: ExitCode) {
        self.line(SEPARATOR).await;
        self.line(&format!("Duration: {:.2} minutes", elapsed.as_secs_f64() / 60.0))
            .await;
        self.line(&format!("Log: {}", task.log_target().display()))
            .await;
        self.line(&format!("Script: {}", script_path.display())).await;
        self.line(&format!("Exit status: {exit_code}")).await;
        self.line(SEPARATOR).await;
        self.flush().await;
    }

    pub async fn flush(&mut self) {
        if self.failed {
            return;
        }
        if let Err(e) = self.writer.flush().await {
            warn!(error = %e, "task log flush failed");
            self.failed = true;
        }
    }
}

async fn open_append(path: &Path) -> std::io::Result<tokio::fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path).await
}
