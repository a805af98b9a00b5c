//! Shared scalar types and exit codes.

/// Process-style exit status returned by [`crate::engine::TaskExecutor::execute`].
pub type ExitCode = i32;

/// Every phase succeeded and the continuation queue is empty.
pub const EXIT_SUCCESS: ExitCode = 0;

/// Internal failure: bad script, malformed reaction, spawn failure, ...
pub const EXIT_FAILURE: ExitCode = 1;

/// Execution was attempted after the task had been canceled.
pub const EXIT_CANCELED: ExitCode = 13;

/// Reported when the child was terminated by a signal and has no exit code.
pub const EXIT_SIGNALED: ExitCode = -1;

/// Runtime used when a script declares no stages at all.
pub const DEFAULT_RUNTIME: &str = "python";

/// Identifier of a pipeline runtime (`python`, `java`, ...).
pub type RuntimeId = String;

/// Environment variable that carries the shared authentication secret.
///
/// Its value is exported to the child but never written to the task log.
pub const SECRET_ENV_KEY: &str = "ZPS_AUTH_SECRET";
