// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use fs2::FileExt;
use tempfile::tempdir;

use super::{cleanup_on_failure, startup};
use crate::lifecycle::{Config, LifecycleError};

fn test_config(dir: &std::path::Path) -> Config {
    Config {
        state_dir: dir.to_owned(),
        socket_path: dir.join("agentd.sock"),
        lock_path: dir.join("agentd.pid"),
        log_path: dir.join("agentd.log"),
    }
}

#[tokio::test]
async fn startup_binds_socket_and_writes_pid() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let result = startup(config.clone()).await.unwrap();

    assert!(config.socket_path.exists());
    let pid = std::fs::read_to_string(&config.lock_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
    drop(result);
}

#[tokio::test]
async fn startup_lock_failed_does_not_remove_existing_files() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.state_dir).unwrap();
    std::fs::write(&config.socket_path, b"").unwrap();

    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)
        .unwrap();
    lock_file.lock_exclusive().unwrap();
    std::fs::write(&config.lock_path, b"12345").unwrap();

    match startup(config.clone()).await {
        Err(LifecycleError::LockFailed(_)) => {}
        Err(e) => panic!("expected LockFailed, got: {e}"),
        Ok(_) => panic!("expected LockFailed, but startup succeeded"),
    }

    assert!(config.socket_path.exists(), "socket must not be deleted on LockFailed");
    assert!(config.lock_path.exists(), "lock file must not be deleted on LockFailed");
}

#[test]
fn lock_file_not_truncated_before_lock_acquired() {
    let dir = tempdir().unwrap();
    let lock_path = dir.path().join("test.lock");

    let running_lock = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .unwrap();
    running_lock.lock_exclusive().unwrap();
    let mut f = &running_lock;
    writeln!(f, "99999").unwrap();

    let _second = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .unwrap();

    let content = std::fs::read_to_string(&lock_path).unwrap();
    assert_eq!(content.trim(), "99999", "opening for locking must not truncate");
}

#[test]
fn cleanup_on_failure_removes_created_files() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.state_dir).unwrap();
    std::fs::write(&config.socket_path, b"").unwrap();
    std::fs::write(&config.lock_path, b"12345").unwrap();

    cleanup_on_failure(&config);

    assert!(!config.socket_path.exists());
    assert!(!config.lock_path.exists());
}
