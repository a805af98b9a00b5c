// src/script/mod.rs

//! ZPS pipeline scripts.
//!
//! - [`model`] holds the on-disk data model and load/save helpers.
//! - [`router`] picks the runtime that must execute a loaded script.

pub mod model;
pub mod router;

pub use model::{Script, Stage, load_script, save_script};
pub use router::route;
