//! Shared helpers for the zpsexec integration tests.
//!
//! - [`fixture`]: temp shared path with installable fake runners
//! - [`builders`]: script and reaction builders
//! - [`recording_handler`]: reaction handlers that record, fail or panic
//! - [`fake_enumerator`]: scripted process table for cancellation tests

pub mod builders;
pub mod fake_enumerator;
pub mod fixture;
pub mod recording_handler;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Install a test-captured tracing subscriber once per test binary.
///
/// Output only shows for failing tests unless run with `--nocapture`.
/// `RUST_LOG=zpsexec=debug` raises verbosity.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("zpsexec=info"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `f`, failing the test after 20 seconds.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    with_timeout_of(DEFAULT_TEST_TIMEOUT, f).await
}

pub async fn with_timeout_of<F, T>(limit: Duration, f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, f)
        .await
        .unwrap_or_else(|_| panic!("test timed out after {limit:?}"))
}
