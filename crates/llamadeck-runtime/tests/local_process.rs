//! Supervisor driving real child processes.

#![cfg(unix)]

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{Fixture, lister_with, probe_sequence};
use llamadeck_core::{ServerStatus, SupervisorSettings};
use llamadeck_runtime::{LocalProcessManager, ServerSupervisor, SupervisorError};

fn settings() -> SupervisorSettings {
    SupervisorSettings::default()
        .with_startup_attempts(20)
        .with_probe_interval(Duration::from_millis(50))
        .with_shutdown_grace(Duration::from_millis(300))
}

fn local_supervisor(
    fixture: &Fixture,
    processes: &Arc<LocalProcessManager>,
    probes: Vec<bool>,
) -> ServerSupervisor {
    let (probe, _) = probe_sequence(probes);
    ServerSupervisor::new(
        fixture.config(),
        settings(),
        Arc::clone(processes) as Arc<dyn llamadeck_core::ProcessManagerPort>,
        Arc::new(probe),
        Arc::new(lister_with(Vec::new())),
    )
}

#[tokio::test]
async fn stop_terminates_spawned_child() {
    let fixture = Fixture::new();
    let processes = Arc::new(LocalProcessManager::new());
    let sup = local_supervisor(&fixture, &processes, vec![false, false, true]);

    sup.start().await.unwrap();
    let pid = sup.state().pid.expect("spawned child has a pid");
    assert!(processes.is_tracked(pid));

    let began = Instant::now();
    sup.stop().await;

    assert!(began.elapsed() < Duration::from_millis(300));
    assert!(!processes.is_tracked(pid));
    assert_eq!(sup.state().status, ServerStatus::Initial);
}

#[tokio::test]
async fn stop_kills_child_ignoring_sigterm() {
    let fixture = Fixture::with_script("trap '' TERM\nsleep 30");
    let processes = Arc::new(LocalProcessManager::new());
    let sup = local_supervisor(&fixture, &processes, vec![false, true]);

    sup.start().await.unwrap();
    let pid = sup.state().pid.unwrap();

    let began = Instant::now();
    sup.stop().await;

    assert!(began.elapsed() >= Duration::from_millis(300));
    assert!(!processes.is_tracked(pid));
    assert_eq!(sup.state().status, ServerStatus::Initial);
}

#[tokio::test]
async fn child_exit_during_startup_is_reported() {
    let fixture = Fixture::with_script("echo 'error: model not found' >&2\nexit 3");
    let processes = Arc::new(LocalProcessManager::new());
    let sup = local_supervisor(&fixture, &processes, vec![false]);

    let err = sup.start().await.unwrap_err();

    assert!(matches!(err, SupervisorError::ExitedDuringStartup(_)));
    let state = sup.state();
    assert_eq!(state.status, ServerStatus::Error);
    assert!(state.last_error.unwrap().contains("exit code 3"));

    let logs = processes.logs();
    let captured = || {
        logs.snapshot()
            .iter()
            .any(|entry| entry.stream == "stderr" && entry.line.contains("model not found"))
    };
    for _ in 0..50 {
        if captured() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(captured());
}
