// tests/config.rs

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::NamedTempFile;
use zpsexec::config::{EngineConfig, RuntimeConfig, load_and_validate, load_or_default};
use zpsexec::errors::ZpsError;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_without_a_file() {
    let config = load_or_default(None).unwrap();
    assert_eq!(config.shared_path, PathBuf::from("/opt/zps/shared"));
    assert_eq!(config.default_language, "python");
    assert_eq!(config.cancel_wait, Duration::from_millis(500));
    assert_eq!(
        config.runtime("python"),
        Some(&RuntimeConfig::new("zpsrun", "PYTHONPATH"))
    );
    assert_eq!(config.plugins_path(), Path::new("/opt/zps/shared/plugins"));
}

#[test]
fn file_values_override_defaults_and_extend_runtimes() {
    let file = write_config(
        r#"
[engine]
shared_path = "/srv/zps"
cancel_wait_ms = 50

[runtime.node]
runner = "zpsnode"
module_path_var = "NODE_PATH"
"#,
    );
    let config = load_and_validate(file.path()).unwrap();

    assert_eq!(config.shared_path, PathBuf::from("/srv/zps"));
    assert_eq!(config.cancel_wait, Duration::from_millis(50));
    assert!(config.runtime("python").is_some());
    assert_eq!(
        config.runtime("node"),
        Some(&RuntimeConfig::new("zpsnode", "NODE_PATH"))
    );
    let ids: Vec<&str> = config.runtimes().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["node", "python"]);
}

#[test]
fn file_can_replace_the_builtin_python_runner() {
    let file = write_config(
        r#"
[runtime.python]
runner = "zpsrun3"
"#,
    );
    let config = load_and_validate(file.path()).unwrap();
    assert_eq!(
        config.runtime("python"),
        Some(&RuntimeConfig::new("zpsrun3", "PYTHONPATH"))
    );
}

#[test]
fn empty_runner_is_rejected() {
    let file = write_config(
        r#"
[runtime.node]
runner = "  "
"#,
    );
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(
        matches!(err, ZpsError::Config(ref msg) if msg.contains("runtime.node")),
        "unexpected error: {err}"
    );
}

#[test]
fn default_language_must_have_a_runtime() {
    let file = write_config(
        r#"
[engine]
default_language = "ruby"
"#,
    );
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(
        matches!(err, ZpsError::Config(ref msg) if msg.contains("ruby")),
        "unexpected error: {err}"
    );
}

#[test]
fn empty_shared_path_is_rejected() {
    let file = write_config(
        r#"
[engine]
shared_path = ""
"#,
    );
    assert!(matches!(
        load_and_validate(file.path()),
        Err(ZpsError::Config(_))
    ));
}

#[test]
fn invalid_toml_is_a_toml_error() {
    let file = write_config("[engine\nshared_path = ");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(ZpsError::Toml(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        load_or_default(Some(Path::new("/definitely/not/here.toml"))),
        Err(ZpsError::Io(_))
    ));
}

#[test]
fn builder_overrides_apply_after_loading() {
    let config = EngineConfig::default()
        .with_shared_path("/tmp/shared")
        .with_runtime("node", RuntimeConfig::new("zpsnode", "NODE_PATH"));
    assert_eq!(config.plugins_path(), Path::new("/tmp/shared/plugins"));
    assert!(config.runtime("node").is_some());
}
