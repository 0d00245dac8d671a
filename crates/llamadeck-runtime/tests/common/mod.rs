//! Shared test doubles for supervisor tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use llamadeck_core::{
    DiscoveryError, ModelLister, ModelRecord, ProcessError, ProcessEvent, ProcessExit,
    ProcessHandle, ProcessManagerPort, ProcessSignal, ReadinessProbe, ServerConfig,
    SpawnedProcess, SupervisorSettings,
};
use llamadeck_runtime::ServerSupervisor;
use mockall::mock;
use tempfile::TempDir;
use tokio::sync::oneshot;

mock! {
    pub Probe {}

    #[async_trait]
    impl ReadinessProbe for Probe {
        async fn probe(&self, host: &str, port: u16) -> bool;
    }
}

mock! {
    pub Lister {}

    #[async_trait]
    impl ModelLister for Lister {
        async fn list_models(&self, host: &str, port: u16) -> Result<Vec<ModelRecord>, DiscoveryError>;
    }
}

/// Probe answering `results` in order, repeating the last one forever.
/// Returns the probe and a counter of calls made.
pub fn probe_sequence(results: Vec<bool>) -> (MockProbe, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let last = results.last().copied().unwrap_or(false);

    let mut probe = MockProbe::new();
    probe.expect_probe().returning(move |_, _| {
        let i = counter.fetch_add(1, Ordering::SeqCst);
        results.get(i).copied().unwrap_or(last)
    });
    (probe, calls)
}

pub fn sample_models() -> Vec<ModelRecord> {
    vec![
        ModelRecord::new("qwen2.5-7b.gguf", "qwen2.5-7b", "gguf", Utc::now()).with_size(4_000),
        ModelRecord::new("llama-3-8b.gguf", "llama-3-8b", "gguf", Utc::now()),
    ]
}

pub fn lister_with(models: Vec<ModelRecord>) -> MockLister {
    let mut lister = MockLister::new();
    lister
        .expect_list_models()
        .returning(move |_, _| Ok(models.clone()));
    lister
}

pub fn failing_lister() -> MockLister {
    let mut lister = MockLister::new();
    lister
        .expect_list_models()
        .returning(|_, _| Err(DiscoveryError::Request("connection refused".to_string())));
    lister
}

#[derive(Default)]
struct FakeState {
    next_pid: u32,
    spawns: Vec<(PathBuf, Vec<String>)>,
    signals: Vec<(u32, ProcessSignal)>,
    live: HashMap<u32, oneshot::Sender<ProcessEvent>>,
}

/// In-memory process manager.
///
/// Spawns nothing; records every call and lets the test decide when (and
/// whether) a "process" exits.
pub struct FakeProcessManager {
    state: Mutex<FakeState>,
    exit_on_terminate: bool,
    exit_on_kill: bool,
    spawn_error: Option<String>,
}

impl FakeProcessManager {
    /// Processes that exit as soon as they receive SIGTERM.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_pid: 4242,
                ..FakeState::default()
            }),
            exit_on_terminate: true,
            exit_on_kill: true,
            spawn_error: None,
        }
    }

    /// Processes that ignore SIGTERM and only die on SIGKILL.
    pub fn ignoring_terminate() -> Self {
        Self {
            exit_on_terminate: false,
            ..Self::new()
        }
    }

    /// Processes that never report an exit, whatever they are sent.
    pub fn unkillable() -> Self {
        Self {
            exit_on_terminate: false,
            exit_on_kill: false,
            ..Self::new()
        }
    }

    /// Every spawn fails with `reason`.
    pub fn failing_spawn(reason: &str) -> Self {
        Self {
            spawn_error: Some(reason.to_string()),
            ..Self::new()
        }
    }

    pub fn spawn_count(&self) -> usize {
        self.state.lock().unwrap().spawns.len()
    }

    pub fn last_args(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .spawns
            .last()
            .map(|(_, args)| args.clone())
            .unwrap_or_default()
    }

    pub fn signals(&self) -> Vec<ProcessSignal> {
        self.state
            .lock()
            .unwrap()
            .signals
            .iter()
            .map(|(_, signal)| *signal)
            .collect()
    }

    pub fn last_pid(&self) -> Option<u32> {
        let state = self.state.lock().unwrap();
        state.spawns.last().map(|_| state.next_pid - 1)
    }

    /// Simulate the process exiting on its own.
    pub fn exit(&self, pid: u32, code: i32) {
        let sender = self.state.lock().unwrap().live.remove(&pid);
        if let Some(sender) = sender {
            let _ = sender.send(ProcessEvent::Exited(ProcessExit {
                code: Some(code),
                signal: None,
            }));
        }
    }
}

impl ProcessManagerPort for FakeProcessManager {
    fn spawn(&self, binary: &Path, args: &[String]) -> Result<SpawnedProcess, ProcessError> {
        let mut state = self.state.lock().unwrap();
        state.spawns.push((binary.to_path_buf(), args.to_vec()));
        if let Some(reason) = &self.spawn_error {
            return Err(ProcessError::SpawnFailed(reason.clone()));
        }

        let pid = state.next_pid;
        state.next_pid += 1;
        let (tx, rx) = oneshot::channel();
        state.live.insert(pid, tx);

        Ok(SpawnedProcess {
            handle: ProcessHandle::new(pid),
            events: rx,
        })
    }

    fn signal(&self, handle: &ProcessHandle, signal: ProcessSignal) -> Result<(), ProcessError> {
        let mut state = self.state.lock().unwrap();
        state.signals.push((handle.pid, signal));

        let exits = match signal {
            ProcessSignal::Terminate => self.exit_on_terminate,
            ProcessSignal::Kill => self.exit_on_kill,
        };
        if exits {
            if let Some(sender) = state.live.remove(&handle.pid) {
                let number = match signal {
                    ProcessSignal::Terminate => 15,
                    ProcessSignal::Kill => 9,
                };
                let _ = sender.send(ProcessEvent::Exited(ProcessExit {
                    code: None,
                    signal: Some(number),
                }));
            }
        }
        Ok(())
    }
}

/// Temp directory holding an executable fake binary and a model file.
pub struct Fixture {
    pub dir: TempDir,
    pub binary: PathBuf,
    pub model: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_script("exec sleep 30")
    }

    /// Fixture whose binary is a shell script running `body`.
    pub fn with_script(body: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("llama-server");
        std::fs::write(&binary, format!("#!/bin/sh\n{body}\n")).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        let model = dir.path().join("m.gguf");
        std::fs::write(&model, b"GGUF").unwrap();
        Self { dir, binary, model }
    }

    pub fn config(&self) -> ServerConfig {
        ServerConfig::new("localhost", 8080)
            .with_binary(&self.binary)
            .with_model_path(&self.model)
    }
}

pub fn fast_settings(attempts: u32) -> SupervisorSettings {
    SupervisorSettings::default().with_startup_attempts(attempts)
}

pub fn supervisor(
    config: ServerConfig,
    settings: SupervisorSettings,
    processes: &Arc<FakeProcessManager>,
    probe: MockProbe,
    lister: MockLister,
) -> ServerSupervisor {
    ServerSupervisor::new(
        config,
        settings,
        Arc::clone(processes) as Arc<dyn ProcessManagerPort>,
        Arc::new(probe),
        Arc::new(lister),
    )
}

/// True when `needle` appears as a contiguous run in `haystack`.
pub fn contains_run(haystack: &[String], needle: &[&str]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window.iter().zip(needle).all(|(a, b)| a == b))
}
