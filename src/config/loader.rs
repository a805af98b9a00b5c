// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{EngineConfig, RawEngineConfig};
use crate::errors::Result;

/// Load a configuration file and return the raw, unvalidated model.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawEngineConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: RawEngineConfig = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// This is the entry point the CLI uses; library callers can also build an
/// [`EngineConfig`] from `EngineConfig::default()` directly.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<EngineConfig> {
    let raw = load_from_path(&path)?;
    EngineConfig::try_from(raw)
}

/// Load `path` if given, otherwise fall back to the built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(p) => load_and_validate(p),
        None => EngineConfig::try_from(RawEngineConfig::default()),
    }
}
