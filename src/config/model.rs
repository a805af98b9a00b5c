// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::DEFAULT_RUNTIME;

/// Engine configuration as read from a TOML file.
///
/// ```toml
/// [engine]
/// shared_path = "/opt/zps/shared"
/// default_language = "python"
/// cancel_wait_ms = 500
///
/// [runtime.python]
/// runner = "zpsrun"
/// module_path_var = "PYTHONPATH"
/// ```
///
/// Every section is optional. A built-in `python` runtime is always present
/// unless the file overrides it.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawEngineConfig {
    #[serde(default)]
    pub engine: EngineSection,

    /// Runtime table keyed by language id.
    #[serde(default)]
    pub runtime: BTreeMap<String, RuntimeConfig>,
}

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// Root holding plugins, certs, the object file store and models.
    #[serde(default = "default_shared_path")]
    pub shared_path: PathBuf,

    /// Runtime for scripts that declare no stages.
    #[serde(default = "default_language")]
    pub default_language: String,

    /// How long cancellation waits for each killed pid to disappear.
    #[serde(default = "default_cancel_wait_ms")]
    pub cancel_wait_ms: u64,
}

fn default_shared_path() -> PathBuf {
    PathBuf::from("/opt/zps/shared")
}

fn default_language() -> String {
    DEFAULT_RUNTIME.to_string()
}

fn default_cancel_wait_ms() -> u64 {
    500
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            shared_path: default_shared_path(),
            default_language: default_language(),
            cancel_wait_ms: default_cancel_wait_ms(),
        }
    }
}

/// `[runtime.<id>]` section: how to start a runner for one language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuntimeConfig {
    /// Executable name under `<shared>/plugins/lang-<id>/bin/`.
    pub runner: String,

    /// Variable receiving the joined `site-packages` directories.
    #[serde(default = "default_module_path_var")]
    pub module_path_var: String,
}

fn default_module_path_var() -> String {
    "PYTHONPATH".to_string()
}

impl RuntimeConfig {
    pub fn new(runner: impl Into<String>, module_path_var: impl Into<String>) -> Self {
        Self {
            runner: runner.into(),
            module_path_var: module_path_var.into(),
        }
    }
}

fn builtin_runtimes() -> BTreeMap<String, RuntimeConfig> {
    let mut runtimes = BTreeMap::new();
    runtimes.insert(
        DEFAULT_RUNTIME.to_string(),
        RuntimeConfig::new("zpsrun", "PYTHONPATH"),
    );
    runtimes
}

/// Validated engine configuration.
///
/// Only constructed through `TryFrom<RawEngineConfig>` (see `validate.rs`) or
/// [`EngineConfig::default`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub shared_path: PathBuf,
    pub default_language: String,
    pub cancel_wait: Duration,
    runtimes: BTreeMap<String, RuntimeConfig>,
}

impl EngineConfig {
    pub(crate) fn new_unchecked(raw: RawEngineConfig) -> Self {
        let mut runtimes = builtin_runtimes();
        runtimes.extend(raw.runtime);
        Self {
            shared_path: raw.engine.shared_path,
            default_language: raw.engine.default_language,
            cancel_wait: Duration::from_millis(raw.engine.cancel_wait_ms),
            runtimes,
        }
    }

    /// Look up the runtime strategy for `id`.
    pub fn runtime(&self, id: &str) -> Option<&RuntimeConfig> {
        self.runtimes.get(id)
    }

    pub fn runtimes(&self) -> impl Iterator<Item = (&str, &RuntimeConfig)> {
        self.runtimes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn with_shared_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.shared_path = path.into();
        self
    }

    pub fn with_runtime(mut self, id: impl Into<String>, runtime: RuntimeConfig) -> Self {
        self.runtimes.insert(id.into(), runtime);
        self
    }

    pub fn plugins_path(&self) -> PathBuf {
        self.shared_path.join("plugins")
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new_unchecked(RawEngineConfig::default())
    }
}
