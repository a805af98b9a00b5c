// src/exec/phase.rs

//! One phase: start a runner, drain its output, wait for it to exit.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::engine::queue::ContinuationQueue;
use crate::engine::tracker::{PhaseTracker, TrackedProcess};
use crate::exec::dispatcher::ReactionDispatcher;
use crate::exec::launcher::{ProcessHandle, build_command, launch};
use crate::exec::log_sink::PhaseLog;
use crate::exec::output::read_lines;
use crate::exec::protocol::{FrameParser, LineEvent};
use crate::fs::FileSystem;
use crate::reaction::Reaction;
use crate::task::Task;
use crate::types::{EXIT_CANCELED, EXIT_FAILURE, EXIT_SIGNALED, ExitCode};

/// Everything a phase needs from the executor.
pub struct PhaseContext<'a> {
    pub task: &'a Task,
    pub config: &'a EngineConfig,
    pub fs: &'a dyn FileSystem,
    pub dispatcher: &'a ReactionDispatcher,
    pub queue: &'a mut ContinuationQueue,
    pub tracker: &'a PhaseTracker,
}

/// Why reading stopped before end-of-stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrainOutcome {
    Eof,
    ProtocolFailure,
    ReadFailure,
    Killed,
}

/// Run `script_path` under `runtime_id` as one phase and return its exit code.
pub async fn run_phase(ctx: PhaseContext<'_>, script_path: &Path, runtime_id: &str) -> ExitCode {
    let PhaseContext {
        task,
        config,
        fs,
        dispatcher,
        queue,
        tracker,
    } = ctx;

    let spec = match build_command(task, script_path, runtime_id, config, fs) {
        Ok(spec) => spec,
        Err(e) => {
            error!(task = %task.id, runtime = %runtime_id, error = %e, "cannot build runner command");
            dispatcher.dispatch(task, Reaction::spawn_failure(e.to_string()), queue);
            return EXIT_FAILURE;
        }
    };

    let mut handle = match launch(&spec) {
        Ok(handle) => handle,
        Err(e) => {
            // tokio does not hand out a child on spawn failure, so there is
            // nothing partial to destroy here.
            error!(task = %task.id, runtime = %runtime_id, error = %e, "cannot start runner");
            dispatcher.dispatch(task, Reaction::spawn_failure(e.to_string()), queue);
            return EXIT_FAILURE;
        }
    };

    let tracked = TrackedProcess::new(handle.pid());
    let kill_signal = tracked.kill_signal();
    if !tracker.begin_process(tracked) {
        info!(task = %task.id, "task canceled while starting runner; killing it");
        handle.start_kill();
        let _ = handle.wait().await;
        return EXIT_CANCELED;
    }

    let started = Instant::now();
    let mut log = PhaseLog::open(task).await;
    log.header(task, &spec).await;

    let outcome = drain(&mut handle, &mut log, task, dispatcher, queue, &kill_signal).await;
    if outcome != DrainOutcome::Eof {
        handle.start_kill();
    }

    // A runner may close its output and keep running, so a kill request can
    // still arrive while waiting.
    let status = tokio::select! {
        status = handle.wait() => status,
        _ = kill_signal.notified() => {
            info!(task = %task.id, "kill requested while waiting for runner");
            handle.start_kill();
            handle.wait().await
        }
    };
    let mut exit_code = match status {
        Ok(status) => status.code().unwrap_or(EXIT_SIGNALED),
        Err(e) => {
            warn!(task = %task.id, error = %e, "wait for runner exit failed");
            EXIT_FAILURE
        }
    };
    if matches!(outcome, DrainOutcome::ProtocolFailure | DrainOutcome::ReadFailure) {
        exit_code = EXIT_FAILURE;
    }
    tracker.end_process();

    log.footer(task, script_path, started.elapsed(), exit_code)
        .await;
    info!(
        task = %task.id,
        runtime = %runtime_id,
        exit_code,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "phase finished"
    );
    exit_code
}

async fn drain(
    handle: &mut ProcessHandle,
    log: &mut PhaseLog,
    task: &Task,
    dispatcher: &ReactionDispatcher,
    queue: &mut ContinuationQueue,
    kill_signal: &Arc<Notify>,
) -> DrainOutcome {
    let Some(output) = handle.take_output() else {
        error!(task = %task.id, "runner output already taken");
        return DrainOutcome::ReadFailure;
    };
    let mut lines = match read_lines(output) {
        Ok(lines) => lines,
        Err(e) => {
            error!(task = %task.id, error = %e, "cannot start output reader; killing runner");
            return DrainOutcome::ReadFailure;
        }
    };
    let mut parser = FrameParser::new();

    loop {
        let next = tokio::select! {
            next = lines.recv() => next,
            _ = kill_signal.notified() => {
                info!(task = %task.id, "kill requested; stopping output drain");
                return DrainOutcome::Killed;
            }
        };

        let Some(line) = next else {
            break;
        };

        match parser.feed(&line) {
            Ok(LineEvent::Plain(line)) => log.line(line).await,
            Ok(LineEvent::Begin) | Ok(LineEvent::Buffered) => {}
            Ok(LineEvent::Reaction(reaction)) => dispatcher.dispatch(task, reaction, queue),
            Err(e) => {
                error!(task = %task.id, error = %e, "invalid reaction frame; killing runner");
                return DrainOutcome::ProtocolFailure;
            }
        }
    }

    if let Err(e) = parser.finish() {
        error!(task = %task.id, error = %e, "invalid reaction frame; killing runner");
        return DrainOutcome::ProtocolFailure;
    }
    debug!(task = %task.id, "runner output closed");
    DrainOutcome::Eof
}
