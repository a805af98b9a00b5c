// src/engine/mod.rs

//! Orchestration engine.
//!
//! - [`executor`] drives a task through its phase chain.
//! - [`queue`] holds continuation scripts discovered along the way.
//! - [`tracker`] is the state the canceller reads from another thread.

pub mod executor;
pub mod queue;
pub mod tracker;

pub use executor::TaskExecutor;
pub use queue::ContinuationQueue;
pub use tracker::{PhaseTracker, TrackedPhase, TrackedProcess};
