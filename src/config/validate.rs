// src/config/validate.rs

use crate::config::model::{EngineConfig, RawEngineConfig};
use crate::errors::{Result, ZpsError};

impl TryFrom<RawEngineConfig> for EngineConfig {
    type Error = ZpsError;

    fn try_from(raw: RawEngineConfig) -> std::result::Result<Self, Self::Error> {
        validate_engine_section(&raw)?;
        let config = EngineConfig::new_unchecked(raw);
        validate_runtimes(&config)?;
        Ok(config)
    }
}

fn validate_engine_section(cfg: &RawEngineConfig) -> Result<()> {
    if cfg.engine.shared_path.as_os_str().is_empty() {
        return Err(ZpsError::Config(
            "[engine].shared_path must not be empty".to_string(),
        ));
    }
    if cfg.engine.default_language.trim().is_empty() {
        return Err(ZpsError::Config(
            "[engine].default_language must not be empty".to_string(),
        ));
    }
    Ok(())
}

// Runs on the merged table so built-in runtimes count toward the default.
fn validate_runtimes(cfg: &EngineConfig) -> Result<()> {
    for (id, runtime) in cfg.runtimes() {
        if runtime.runner.trim().is_empty() {
            return Err(ZpsError::Config(format!(
                "[runtime.{id}].runner must not be empty"
            )));
        }
        if runtime.module_path_var.trim().is_empty() {
            return Err(ZpsError::Config(format!(
                "[runtime.{id}].module_path_var must not be empty"
            )));
        }
    }

    if cfg.runtime(&cfg.default_language).is_none() {
        return Err(ZpsError::Config(format!(
            "default_language '{}' has no [runtime.{}] section",
            cfg.default_language, cfg.default_language
        )));
    }
    Ok(())
}
