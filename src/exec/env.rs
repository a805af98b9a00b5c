// src/exec/env.rs

//! Environment exported to every runner process.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{EngineConfig, RuntimeConfig};
use crate::errors::{Result, ZpsError};
use crate::fs::FileSystem;
use crate::task::Task;

pub const SHARED_PATH_VAR: &str = "ZPS_SHARED_PATH";
pub const CERTS_PATH_VAR: &str = "ZPS_CERTS_PATH";
pub const OFS_PATH_VAR: &str = "ZPS_OFS_PATH";
pub const PLUGIN_PATH_VAR: &str = "ZPS_PLUGIN_PATH";
pub const MODEL_PATH_VAR: &str = "ZPS_MODEL_PATH";

const SITE_PACKAGES: &str = "site-packages";

// Deep enough for `lang-python/lib/python3.x/site-packages`.
const SITE_PACKAGES_MAX_DEPTH: usize = 4;

/// Variables layered on top of the inherited host environment.
///
/// Only the overlay is stored; the child inherits everything else from the
/// host process when it is spawned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    vars: BTreeMap<String, OsString>,
}

impl EnvOverlay {
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<OsString>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&OsString> {
        self.vars.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OsString)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Build the overlay for one phase.
///
/// Order matters: cluster paths first, then the module search path and
/// `PATH`, and the task's own overrides last so they win.
pub fn build_env(
    task: &Task,
    runtime: &RuntimeConfig,
    config: &EngineConfig,
    fs: &dyn FileSystem,
) -> Result<EnvOverlay> {
    let shared = &config.shared_path;
    let mut env = EnvOverlay::default();

    env.set(SHARED_PATH_VAR, shared.as_os_str());
    env.set(CERTS_PATH_VAR, shared.join("certs").into_os_string());
    env.set(OFS_PATH_VAR, shared.join("ofs").into_os_string());
    env.set(PLUGIN_PATH_VAR, config.plugins_path().into_os_string());
    env.set(MODEL_PATH_VAR, shared.join("models").into_os_string());

    let site_packages = discover_site_packages(fs, &config.plugins_path());
    if !site_packages.is_empty() {
        let inherited = std::env::var_os(&runtime.module_path_var);
        let module_path = join_with_inherited(site_packages, inherited, &runtime.module_path_var)?;
        env.set(runtime.module_path_var.clone(), module_path);
    }

    let inherited_path = std::env::var_os("PATH");
    let mut path_entries: Vec<PathBuf> = inherited_path
        .as_ref()
        .map(|p| std::env::split_paths(p).collect())
        .unwrap_or_default();
    path_entries.push(shared.join("bin"));
    let path = std::env::join_paths(path_entries)
        .map_err(|e| ZpsError::Config(format!("cannot build PATH: {e}")))?;
    env.set("PATH", path);

    for (key, value) in task.env.iter() {
        match value {
            Some(v) => env.set(key.clone(), v.clone()),
            None => warn!(task = %task.id, key = %key, "null environment override; skipping"),
        }
    }

    Ok(env)
}

fn join_with_inherited(
    mut entries: Vec<PathBuf>,
    inherited: Option<OsString>,
    var: &str,
) -> Result<OsString> {
    if let Some(existing) = inherited {
        entries.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(entries).map_err(|e| ZpsError::Config(format!("cannot build {var}: {e}")))
}

/// Find every `site-packages` directory below each installed plugin.
///
/// Plugins are the immediate children of `plugins_root`. Missing or unreadable
/// directories are skipped.
pub fn discover_site_packages(fs: &dyn FileSystem, plugins_root: &Path) -> Vec<PathBuf> {
    let plugins = match fs.read_dir(plugins_root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(root = %plugins_root.display(), error = %e, "no plugins directory");
            return Vec::new();
        }
    };

    let mut found = Vec::new();
    for plugin in plugins.into_iter().filter(|p| fs.is_dir(p)) {
        walk_site_packages(fs, &plugin, 0, &mut found);
    }
    debug!(count = found.len(), "discovered site-packages directories");
    found
}

fn walk_site_packages(fs: &dyn FileSystem, dir: &Path, depth: usize, found: &mut Vec<PathBuf>) {
    if depth > SITE_PACKAGES_MAX_DEPTH {
        return;
    }
    let Ok(children) = fs.read_dir(dir) else {
        return;
    };
    for child in children.into_iter().filter(|c| fs.is_dir(c)) {
        if child.file_name().is_some_and(|n| n == SITE_PACKAGES) {
            found.push(child);
        } else {
            walk_site_packages(fs, &child, depth + 1, found);
        }
    }
}
