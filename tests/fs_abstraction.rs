// tests/fs_abstraction.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use zpsexec::config::EngineConfig;
use zpsexec::engine::TaskExecutor;
use zpsexec::fs::FileSystem;
use zpsexec::fs::mock::MockFileSystem;
use zpsexec::task::Task;
use zpsexec::types::EXIT_FAILURE;

#[test]
fn mock_read_dir_lists_direct_children_sorted() {
    let fs = MockFileSystem::new();
    fs.add_file("/a/z.txt", "z");
    fs.add_file("/a/b/c.txt", "c");
    fs.add_dir("/a/m");

    let children = fs.read_dir(Path::new("/a")).unwrap();
    assert_eq!(
        children,
        vec![
            PathBuf::from("/a/b"),
            PathBuf::from("/a/m"),
            PathBuf::from("/a/z.txt"),
        ]
    );
    assert!(fs.is_dir(Path::new("/a/b")));
    assert!(!fs.is_dir(Path::new("/a/z.txt")));
}

#[test]
fn mock_write_then_remove() {
    let fs = MockFileSystem::new();
    let path = Path::new("/jobs/script.json.2");
    fs.write(path, b"{}").unwrap();
    assert_eq!(fs.read_to_string(path).unwrap(), "{}");

    fs.remove_file(path).unwrap();
    assert!(!fs.exists(path));
    assert!(fs.remove_file(path).is_err());
    assert!(fs.remove_file(Path::new("/jobs")).is_err());
}

#[tokio::test]
async fn executor_reads_scripts_through_the_injected_fs() {
    let fs = MockFileSystem::new();
    fs.add_file("/jobs/script.json", "{ not json");

    let task = Task::new("/jobs/script.json", "/nonexistent/work");
    let mut executor =
        TaskExecutor::new(task, Arc::new(EngineConfig::default())).with_fs(Arc::new(fs));

    assert_eq!(executor.execute().await, EXIT_FAILURE);
    assert_eq!(executor.phase(), 1);
}
