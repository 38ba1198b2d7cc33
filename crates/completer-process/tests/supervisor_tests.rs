//! Supervisor lifecycle against shell-script engines
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use completer_process::{
    BinarySource, ProcessError, ProcessState, ProcessSupervisor, StateSnapshot, SupervisorConfig,
};
use serial_test::serial;
use tokio::sync::watch;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn supervisor(binary: PathBuf) -> ProcessSupervisor {
    ProcessSupervisor::new(SupervisorConfig::new(BinarySource::Explicit(binary))).unwrap()
}

async fn wait_for_state(rx: &mut watch::Receiver<StateSnapshot>, state: ProcessState) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while rx.borrow_and_update().state != state {
            rx.changed().await.unwrap();
        }
    })
    .await
    .unwrap();
}

const ECHO: &str = r#"while IFS= read -r line; do printf '%s\n' "$line"; done"#;

#[tokio::test]
#[serial]
async fn test_channel_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut supervisor = supervisor(write_script(dir.path(), "engine", ECHO));

    let channel = supervisor.ensure_alive().await.unwrap();
    channel.send_line(r#"{"ping":1}"#).await.unwrap();
    assert_eq!(channel.read_line().await.unwrap().as_deref(), Some(r#"{"ping":1}"#));

    assert_eq!(supervisor.state(), ProcessState::Alive);
    assert!(supervisor.pid().is_some());
    assert_eq!(supervisor.restart_count(), 1);
}

#[tokio::test]
#[serial]
async fn test_client_argument_is_passed() {
    let dir = tempfile::tempdir().unwrap();
    let engine = write_script(
        dir.path(),
        "engine",
        r#"read -r line; printf '{"arg":"%s"}\n' "$1""#,
    );
    let config = SupervisorConfig::new(BinarySource::Explicit(engine)).client_name("vim");
    let mut supervisor = ProcessSupervisor::new(config).unwrap();

    let channel = supervisor.ensure_alive().await.unwrap();
    channel.send_line("{}").await.unwrap();
    assert_eq!(
        channel.read_line().await.unwrap().as_deref(),
        Some(r#"{"arg":"--client=vim"}"#)
    );
}

#[tokio::test]
#[serial]
async fn test_exit_is_observed_and_process_restarted() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("started-once");
    let body = format!(
        "if [ -e {m} ]; then {ECHO}; else touch {m}; exit 3; fi",
        m = marker.display()
    );
    let mut supervisor = supervisor(write_script(dir.path(), "engine", &body));
    let mut rx = supervisor.subscribe();

    supervisor.ensure_alive().await.unwrap();
    wait_for_state(&mut rx, ProcessState::Dead).await;
    assert_eq!(supervisor.state(), ProcessState::Dead);

    let channel = supervisor.ensure_alive().await.unwrap();
    channel.send_line("again").await.unwrap();
    assert_eq!(channel.read_line().await.unwrap().as_deref(), Some("again"));
    assert_eq!(supervisor.restart_count(), 2);
    assert_eq!(supervisor.state(), ProcessState::Alive);
}

#[tokio::test]
#[serial]
async fn test_replaced_process_exit_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let mut supervisor = supervisor(write_script(dir.path(), "engine", ECHO));

    supervisor.ensure_alive().await.unwrap();
    let first = supervisor.pid();
    supervisor.respawn().await.unwrap();
    let second = supervisor.pid();
    assert_ne!(first, second);

    // give the old watcher time to report the kill
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(supervisor.state(), ProcessState::Alive);

    let channel = supervisor.ensure_alive().await.unwrap();
    channel.send_line("still here").await.unwrap();
    assert_eq!(channel.read_line().await.unwrap().as_deref(), Some("still here"));
    assert_eq!(supervisor.restart_count(), 2);
}

#[tokio::test]
#[serial]
async fn test_mark_dead_forces_fresh_process() {
    let dir = tempfile::tempdir().unwrap();
    let mut supervisor = supervisor(write_script(dir.path(), "engine", ECHO));

    supervisor.ensure_alive().await.unwrap();
    let generation = supervisor.subscribe().borrow().generation;
    supervisor.mark_dead();
    assert_eq!(supervisor.state(), ProcessState::Dead);

    supervisor.ensure_alive().await.unwrap();
    assert_eq!(supervisor.subscribe().borrow().generation, generation + 1);
}

#[tokio::test]
#[serial]
async fn test_end_of_stream_when_engine_quits() {
    let dir = tempfile::tempdir().unwrap();
    let mut supervisor = supervisor(write_script(dir.path(), "engine", "read -r line; exit 0"));

    let channel = supervisor.ensure_alive().await.unwrap();
    channel.send_line("bye").await.unwrap();
    assert_eq!(channel.read_line().await.unwrap(), None);
}

#[tokio::test]
#[serial]
async fn test_budget_spent_on_crashing_engine() {
    let dir = tempfile::tempdir().unwrap();
    let engine = write_script(dir.path(), "engine", "exit 1");
    let config = SupervisorConfig::new(BinarySource::Explicit(engine)).max_restarts(2);
    let mut supervisor = ProcessSupervisor::new(config).unwrap();
    let mut rx = supervisor.subscribe();

    for _ in 0..2 {
        supervisor.ensure_alive().await.unwrap();
        wait_for_state(&mut rx, ProcessState::Dead).await;
    }

    let err = supervisor.ensure_alive().await.err().unwrap();
    assert!(matches!(err, ProcessError::Unavailable { restarts: 2 }));
    assert_eq!(supervisor.restart_count(), 2);
}

#[tokio::test]
#[serial]
async fn test_shutdown_returns_to_no_process() {
    let dir = tempfile::tempdir().unwrap();
    let mut supervisor = supervisor(write_script(dir.path(), "engine", ECHO));

    supervisor.ensure_alive().await.unwrap();
    supervisor.shutdown();
    assert_eq!(supervisor.state(), ProcessState::NoProcess);
    assert_eq!(supervisor.pid(), None);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(supervisor.state(), ProcessState::NoProcess);
}

#[tokio::test]
#[serial]
async fn test_monitor_kill_ends_blocked_read() {
    let dir = tempfile::tempdir().unwrap();
    let silent = write_script(dir.path(), "engine", "while IFS= read -r line; do :; done");
    let mut supervisor = supervisor(silent);
    let monitor = supervisor.monitor();

    let channel = supervisor.ensure_alive().await.unwrap();
    channel.send_line("{}").await.unwrap();
    let killer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        monitor.kill_current()
    });

    let line = tokio::time::timeout(Duration::from_secs(5), channel.read_line())
        .await
        .unwrap();
    assert!(matches!(line, Ok(None)));
    assert!(killer.await.unwrap());
    assert_eq!(supervisor.state(), ProcessState::Dead);

    supervisor.ensure_alive().await.unwrap();
    assert_eq!(supervisor.restart_count(), 2);
    assert_eq!(supervisor.monitor().restart_count(), 2);
    assert_eq!(supervisor.monitor().state(), ProcessState::Alive);
}
