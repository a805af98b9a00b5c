// src/script/model.rs

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{Result, ZpsError};
use crate::fs::FileSystem;

/// A pipeline definition as stored on disk.
///
/// ```json
/// {
///   "generate": [ { "language": "python", "className": "..." } ],
///   "execute":  [ { "language": "python", "className": "..." } ]
/// }
/// ```
///
/// Either array may be empty, absent or `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub generate: Vec<Stage>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub execute: Vec<Stage>,
}

/// One generate or execute stage.
///
/// Only `language` is interpreted by the engine; every other field is kept
/// verbatim in `extra` so that a continuation written back to disk is
/// identical to the one the worker produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub language: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Stage {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            extra: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

impl Script {
    pub fn is_empty(&self) -> bool {
        self.generate.is_empty() && self.execute.is_empty()
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Stage>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Stage>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read and parse the script at `path`.
///
/// Both I/O and JSON failures are reported as [`ZpsError::ScriptLoad`] so the
/// executor can treat them uniformly.
pub fn load_script(fs: &dyn FileSystem, path: &Path) -> Result<Script> {
    let contents = fs
        .read_to_string(path)
        .map_err(|e| ZpsError::ScriptLoad {
            path: path.to_path_buf(),
            reason: format!("{e:#}"),
        })?;

    let script = Script::from_json(&contents).map_err(|e| ZpsError::ScriptLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    debug!(
        path = %path.display(),
        generate = script.generate.len(),
        execute = script.execute.len(),
        "loaded script"
    );
    Ok(script)
}

/// Write `script` to `path`, removing whatever stale file is already there.
pub fn save_script(fs: &dyn FileSystem, path: &Path, script: &Script) -> Result<()> {
    if fs.exists(path) {
        fs.remove_file(path)?;
    }
    let json = script.to_json()?;
    fs.write(path, json.as_bytes())?;
    debug!(path = %path.display(), "wrote continuation script");
    Ok(())
}
