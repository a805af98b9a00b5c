// src/lib.rs

pub mod cancel;
pub mod cli;
pub mod config;
pub mod engine;
pub mod envelope;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod reaction;
pub mod script;
pub mod task;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};

use crate::cancel::Canceller;
use crate::cli::CliArgs;
use crate::config::{EngineConfig, load_or_default};
use crate::engine::TaskExecutor;
use crate::exec::build_command;
use crate::fs::RealFileSystem;
use crate::script::{load_script, route};
use crate::task::Task;
use crate::types::ExitCode;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - task construction from the CLI
/// - the task executor
/// - Ctrl-C → cancellation
pub async fn run(args: CliArgs) -> Result<ExitCode> {
    let mut config = load_or_default(args.config.as_deref())?;
    if let Some(shared) = args.shared_path.clone() {
        config = config.with_shared_path(shared);
    }
    let config = Arc::new(config);
    let task = task_from_args(&args);

    if args.dry_run {
        print_dry_run(&task, &config)?;
        return Ok(0);
    }

    let mut executor = TaskExecutor::new(task, Arc::clone(&config));

    // Ctrl-C → cancel the whole process tree.
    {
        let canceller = executor.canceller();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received; canceling task");
            cancel_off_runtime(canceller).await;
        });
    }

    Ok(executor.execute().await)
}

/// Run the blocking `Canceller::cancel` on the blocking pool.
///
/// Returns true if this call performed the cancellation.
pub async fn cancel_off_runtime(canceller: Canceller) -> bool {
    match tokio::task::spawn_blocking(move || canceller.cancel()).await {
        Ok(true) => true,
        Ok(false) => {
            info!("task was already canceled");
            false
        }
        Err(e) => {
            warn!(error = %e, "cancel task failed");
            false
        }
    }
}

/// Task descriptor for the CLI arguments.
pub fn task_from_args(args: &CliArgs) -> Task {
    let mut task = Task::new(&args.script, &args.work);
    if let Some(id) = &args.id {
        task = task.with_id(id.clone());
    }
    if let Some(log) = &args.log {
        task = task.with_log_path(log.clone());
    }
    for (key, value) in &args.env {
        task = task.with_env(key.clone(), Some(value.clone()));
    }
    for (key, value) in &args.args {
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.clone()));
        task = task.with_arg(key.clone(), value);
    }
    task
}

/// Dry-run output: routed runtime and the first phase's command line.
fn print_dry_run(task: &Task, config: &EngineConfig) -> Result<()> {
    let fs = RealFileSystem;
    let script = load_script(&fs, &task.script_path)?;
    let runtime = route(&script, &config.default_language);
    let spec = build_command(task, &task.script_path, &runtime, config, &fs)
        .with_context(|| format!("building command for runtime '{runtime}'"))?;

    println!("zpsexec dry-run");
    println!("  task: {}", task.id);
    println!("  script: {}", task.script_path.display());
    println!(
        "  stages: {} generate, {} execute",
        script.generate.len(),
        script.execute.len()
    );
    println!("  runtime: {runtime}");
    println!("  command: {}", spec.command_line());
    println!("  work dir: {}", spec.work_dir.display());
    println!("  log: {}", task.log_target().display());
    Ok(())
}
