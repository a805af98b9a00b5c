// src/engine/executor.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::cancel::{Canceller, ProcessTreeEnumerator, default_enumerator};
use crate::config::EngineConfig;
use crate::engine::queue::ContinuationQueue;
use crate::engine::tracker::PhaseTracker;
use crate::exec::{LoggingHandler, PhaseContext, ReactionDispatcher, ReactionHandler, run_phase};
use crate::fs::{FileSystem, RealFileSystem};
use crate::script::{Script, load_script, route, save_script};
use crate::task::Task;
use crate::types::{EXIT_CANCELED, EXIT_FAILURE, EXIT_SUCCESS, ExitCode};

/// Runs one task as a chain of phases.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use zpsexec::{config::EngineConfig, engine::TaskExecutor, task::Task};
/// # async fn demo() {
/// let task = Task::new("/jobs/42/script.json", "/jobs/42/work");
/// let mut executor = TaskExecutor::new(task, Arc::new(EngineConfig::default()));
/// let canceller = executor.canceller();
/// let code = executor.execute().await;
/// # let _ = (canceller, code);
/// # }
/// ```
#[derive(Debug)]
pub struct TaskExecutor {
    task: Task,
    config: Arc<EngineConfig>,
    fs: Arc<dyn FileSystem>,
    enumerator: Arc<dyn ProcessTreeEnumerator>,
    dispatcher: ReactionDispatcher,
    queue: ContinuationQueue,
    tracker: Arc<PhaseTracker>,
    phase: usize,
}

impl TaskExecutor {
    pub fn new(task: Task, config: Arc<EngineConfig>) -> Self {
        let mut dispatcher = ReactionDispatcher::new();
        dispatcher.register(Arc::new(LoggingHandler));
        Self {
            task,
            config,
            fs: Arc::new(RealFileSystem),
            enumerator: default_enumerator(),
            dispatcher,
            queue: ContinuationQueue::new(),
            tracker: Arc::new(PhaseTracker::new()),
            phase: 1,
        }
    }

    pub fn with_handler(mut self, handler: Arc<dyn ReactionHandler>) -> Self {
        self.dispatcher.register(handler);
        self
    }

    pub fn with_enumerator(mut self, enumerator: Arc<dyn ProcessTreeEnumerator>) -> Self {
        self.enumerator = enumerator;
        self
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Handle for canceling this task from another thread or task.
    pub fn canceller(&self) -> Canceller {
        Canceller::new(
            Arc::clone(&self.tracker),
            Arc::clone(&self.enumerator),
            self.config.cancel_wait,
        )
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    /// Current phase number; starts at 1.
    pub fn phase(&self) -> usize {
        self.phase
    }

    pub fn queue(&self) -> &ContinuationQueue {
        &self.queue
    }

    /// Run the task to completion and return its exit code.
    ///
    /// Never fails: every error becomes an exit code and is logged.
    pub async fn execute(&mut self) -> ExitCode {
        let started = Instant::now();
        self.phase = 1;
        info!(task = %self.task.id, script = %self.task.script_path.display(), "task started");

        let exit_code = self.run_phases().await;

        self.queue.clear();
        self.tracker.end_process();
        info!(
            task = %self.task.id,
            exit_code,
            phases = self.phase,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "task finished"
        );
        exit_code
    }

    async fn run_phases(&mut self) -> ExitCode {
        let mut script_path = self.task.script_path.clone();
        let mut script = match load_script(self.fs.as_ref(), &script_path) {
            Ok(script) => script,
            Err(e) => {
                error!(task = %self.task.id, error = %e, "cannot load task script");
                return EXIT_FAILURE;
            }
        };

        loop {
            if self.tracker.is_canceled() {
                info!(task = %self.task.id, phase = self.phase, "task canceled; not starting phase");
                return EXIT_CANCELED;
            }

            self.task.current_script_path = Some(script_path.clone());
            self.tracker.set_script(script_path.clone());

            let runtime = route(&script, &self.config.default_language);
            info!(
                task = %self.task.id,
                phase = self.phase,
                runtime = %runtime,
                script = %script_path.display(),
                "starting phase"
            );

            let ctx = PhaseContext {
                task: &self.task,
                config: &self.config,
                fs: self.fs.as_ref(),
                dispatcher: &self.dispatcher,
                queue: &mut self.queue,
                tracker: &self.tracker,
            };
            let exit_code = run_phase(ctx, &script_path, &runtime).await;
            if exit_code != EXIT_SUCCESS {
                return exit_code;
            }

            let Some(next) = self.queue.pop() else {
                debug!(task = %self.task.id, phase = self.phase, "no continuations left");
                return EXIT_SUCCESS;
            };

            match self.advance(&next) {
                Ok(path) => {
                    script_path = path;
                }
                Err(code) => return code,
            }

            // Reload from disk so each phase runs exactly what was persisted.
            script = match load_script(self.fs.as_ref(), &script_path) {
                Ok(script) => script,
                Err(e) => {
                    error!(task = %self.task.id, error = %e, "cannot reload continuation script");
                    return EXIT_FAILURE;
                }
            };
        }
    }

    /// Persist `next` as the script of the following phase and bump the
    /// phase counter.
    fn advance(&mut self, next: &Script) -> Result<PathBuf, ExitCode> {
        let path = self.task.continuation_path(self.phase + 1);
        if let Err(e) = save_script(self.fs.as_ref(), &path, next) {
            error!(task = %self.task.id, path = %path.display(), error = %e, "cannot write continuation script");
            return Err(EXIT_FAILURE);
        }
        self.phase += 1;
        info!(
            task = %self.task.id,
            phase = self.phase,
            pending = self.queue.len(),
            "advancing to continuation"
        );
        Ok(path)
    }
}
