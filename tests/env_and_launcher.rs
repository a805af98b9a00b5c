// tests/env_and_launcher.rs

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde_json::json;
use zpsexec::config::{EngineConfig, RuntimeConfig};
use zpsexec::errors::ZpsError;
use zpsexec::exec::build_command;
use zpsexec::exec::env::{
    CERTS_PATH_VAR, MODEL_PATH_VAR, OFS_PATH_VAR, PLUGIN_PATH_VAR, SHARED_PATH_VAR, build_env,
    discover_site_packages,
};
use zpsexec::fs::mock::MockFileSystem;
use zpsexec::task::Task;

fn config() -> EngineConfig {
    EngineConfig::default().with_shared_path("/shared")
}

fn plugin_fs() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_dir("/shared/plugins/lang-python/lib/python3.11/site-packages");
    fs.add_dir("/shared/plugins/zps-analysis/site-packages");
    fs.add_dir("/shared/plugins/zps-analysis/site-packages/nested/site-packages");
    fs.add_dir("/shared/plugins/empty-plugin/bin");
    fs.add_file("/shared/plugins/README", b"not a plugin".to_vec());
    fs
}

#[test]
fn discovers_site_packages_under_every_plugin() {
    let found = discover_site_packages(&plugin_fs(), Path::new("/shared/plugins"));
    assert_eq!(
        found,
        vec![
            PathBuf::from("/shared/plugins/lang-python/lib/python3.11/site-packages"),
            PathBuf::from("/shared/plugins/zps-analysis/site-packages"),
        ]
    );
}

#[test]
fn missing_plugins_root_yields_nothing() {
    let fs = MockFileSystem::new();
    assert!(discover_site_packages(&fs, Path::new("/nowhere/plugins")).is_empty());
}

#[test]
fn env_contains_cluster_paths_module_path_and_bin() {
    let task = Task::new("/jobs/s.json", "/jobs/work");
    let cfg = config();
    let runtime = cfg.runtime("python").unwrap().clone();
    let env = build_env(&task, &runtime, &cfg, &plugin_fs()).unwrap();

    assert_eq!(env.get(SHARED_PATH_VAR), Some(&OsString::from("/shared")));
    assert_eq!(env.get(CERTS_PATH_VAR), Some(&OsString::from("/shared/certs")));
    assert_eq!(env.get(OFS_PATH_VAR), Some(&OsString::from("/shared/ofs")));
    assert_eq!(env.get(PLUGIN_PATH_VAR), Some(&OsString::from("/shared/plugins")));
    assert_eq!(env.get(MODEL_PATH_VAR), Some(&OsString::from("/shared/models")));

    let module_path: Vec<PathBuf> = std::env::split_paths(env.get("PYTHONPATH").unwrap()).collect();
    assert_eq!(
        &module_path[..2],
        &[
            PathBuf::from("/shared/plugins/lang-python/lib/python3.11/site-packages"),
            PathBuf::from("/shared/plugins/zps-analysis/site-packages"),
        ]
    );

    let path: Vec<PathBuf> = std::env::split_paths(env.get("PATH").unwrap()).collect();
    assert_eq!(path.last(), Some(&PathBuf::from("/shared/bin")));
}

#[test]
fn module_path_variable_follows_the_runtime() {
    let task = Task::new("/jobs/s.json", "/jobs/work");
    let cfg = config().with_runtime("node", RuntimeConfig::new("zpsnode", "NODE_PATH"));
    let runtime = cfg.runtime("node").unwrap().clone();
    let env = build_env(&task, &runtime, &cfg, &plugin_fs()).unwrap();

    assert!(env.get("NODE_PATH").is_some());
}

#[test]
fn task_overrides_win_and_null_overrides_are_skipped() {
    let task = Task::new("/jobs/s.json", "/jobs/work")
        .with_env("ZPS_OFS_PATH", Some("/custom/ofs".to_string()))
        .with_env("ZPS_PROJECT", Some("p-1".to_string()))
        .with_env("ZPS_UNSET", None);
    let cfg = config();
    let runtime = cfg.runtime("python").unwrap().clone();
    let env = build_env(&task, &runtime, &cfg, &MockFileSystem::new()).unwrap();

    assert_eq!(env.get(OFS_PATH_VAR), Some(&OsString::from("/custom/ofs")));
    assert_eq!(env.get("ZPS_PROJECT"), Some(&OsString::from("p-1")));
    assert_eq!(env.get("ZPS_UNSET"), None);
}

#[test]
fn command_line_has_runner_shared_path_script_and_globals() {
    let task = Task::new("/jobs/s.json", "/jobs/work")
        .with_arg("media", json!("/data/a.mov"))
        .with_arg("dropped", json!(null));
    let spec = build_command(&task, Path::new("/jobs/s.json.3"), "python", &config(), &MockFileSystem::new())
        .unwrap();

    assert_eq!(
        spec.program,
        PathBuf::from("/shared/plugins/lang-python/bin/zpsrun")
    );
    assert_eq!(
        spec.args,
        vec![
            "--shared-path",
            "/shared",
            "--script",
            "/jobs/s.json.3",
            "--global",
            "media=/data/a.mov",
        ]
    );
    assert_eq!(spec.work_dir, PathBuf::from("/jobs/work"));
    assert_eq!(
        spec.command_line(),
        "/shared/plugins/lang-python/bin/zpsrun --shared-path /shared --script /jobs/s.json.3 --global media=/data/a.mov"
    );
}

#[test]
fn unknown_runtime_is_a_construction_error() {
    let task = Task::new("/jobs/s.json", "/jobs/work");
    let err = build_command(&task, Path::new("/jobs/s.json"), "cobol", &config(), &MockFileSystem::new())
        .unwrap_err();
    assert!(matches!(err, ZpsError::UnknownRuntime(ref id) if id == "cobol"));
}
