//! Local llama-server process management.
//!
//! `LocalProcessManager` implements [`ProcessManagerPort`] on top of
//! `tokio::process`. Each spawned child gets:
//!
//! - its own process group, so signals reach any helpers it forks
//! - stdout/stderr readers feeding the shared [`ServerLogBuffer`]
//! - a watcher task that owns the `Child`, reaps it and reports the exit
//!   exactly once through a `oneshot`
//!
//! The child is never killed on drop: if the host application dies without
//! calling `stop()`, llama-server keeps running and is picked up as an
//! external server on the next start.

use std::collections::HashMap;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};

use llamadeck_core::{
    ProcessError, ProcessEvent, ProcessExit, ProcessHandle, ProcessManagerPort, ProcessSignal,
    SpawnedProcess,
};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::logs::ServerLogBuffer;
use super::stream::spawn_stream_reader;

/// Channel used to ask a watcher task to kill its child directly.
type KillSwitch = mpsc::UnboundedSender<()>;

/// Spawns and signals llama-server processes on the local machine.
#[derive(Clone)]
pub struct LocalProcessManager {
    /// Live children keyed by pid
    children: Arc<Mutex<HashMap<u32, KillSwitch>>>,
    logs: Arc<ServerLogBuffer>,
}

impl LocalProcessManager {
    pub fn new() -> Self {
        Self::with_log_buffer(Arc::new(ServerLogBuffer::new()))
    }

    /// Manager whose captured output goes to `logs`.
    pub fn with_log_buffer(logs: Arc<ServerLogBuffer>) -> Self {
        Self {
            children: Arc::new(Mutex::new(HashMap::new())),
            logs,
        }
    }

    /// Captured output of every child spawned by this manager.
    pub fn logs(&self) -> Arc<ServerLogBuffer> {
        Arc::clone(&self.logs)
    }

    /// Whether `pid` is a child this manager spawned and has not yet reaped.
    pub fn is_tracked(&self, pid: u32) -> bool {
        self.children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&pid)
    }

    fn kill_switch(&self, pid: u32) -> Option<KillSwitch> {
        self.children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&pid)
            .cloned()
    }

    fn spawn_watcher(
        &self,
        mut child: Child,
        pid: u32,
        mut kill_rx: mpsc::UnboundedReceiver<()>,
        events_tx: oneshot::Sender<ProcessEvent>,
    ) {
        let children = Arc::clone(&self.children);

        tokio::spawn(async move {
            let mut kill_channel_open = true;
            let status = loop {
                let request = tokio::select! {
                    status = child.wait() => break status,
                    request = kill_rx.recv(), if kill_channel_open => request,
                };
                match request {
                    Some(()) => {
                        if let Err(e) = child.start_kill() {
                            debug!(pid, error = %e, "start_kill failed; child probably exited");
                        }
                    }
                    None => kill_channel_open = false,
                }
            };

            children
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&pid);

            let event = match status {
                Ok(status) => {
                    let exit = exit_from_status(status);
                    info!(pid, %exit, "llama-server exited");
                    ProcessEvent::Exited(exit)
                }
                Err(e) => {
                    warn!(pid, error = %e, "Failed to wait on llama-server");
                    ProcessEvent::Failed(e.to_string())
                }
            };

            // Receiver may have been dropped
            let _ = events_tx.send(event);
        });
    }
}

impl Default for LocalProcessManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessManagerPort for LocalProcessManager {
    fn spawn(&self, binary: &Path, args: &[String]) -> Result<SpawnedProcess, ProcessError> {
        let mut cmd = Command::new(binary);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);

        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProcessError::BinaryNotFound(binary.display().to_string())
            } else {
                ProcessError::SpawnFailed(e.to_string())
            }
        })?;

        let Some(pid) = child.id() else {
            // Already reaped; nothing to track
            return Err(ProcessError::SpawnFailed(
                "process exited before its pid could be read".to_string(),
            ));
        };

        if let Some(stdout) = child.stdout.take() {
            spawn_stream_reader(stdout, pid, "stdout", Arc::clone(&self.logs));
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_stream_reader(stderr, pid, "stderr", Arc::clone(&self.logs));
        }

        let (kill_tx, kill_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = oneshot::channel();
        self.children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pid, kill_tx);
        self.spawn_watcher(child, pid, kill_rx, events_tx);

        info!(pid, binary = %binary.display(), "Spawned llama-server");
        Ok(SpawnedProcess {
            handle: ProcessHandle::new(pid),
            events: events_rx,
        })
    }

    fn signal(&self, handle: &ProcessHandle, signal: ProcessSignal) -> Result<(), ProcessError> {
        let pid = handle.pid;
        let Some(kill_switch) = self.kill_switch(pid) else {
            debug!(pid, %signal, "Process not tracked; nothing to signal");
            return Ok(());
        };

        debug!(pid, %signal, "Signalling llama-server");

        #[cfg(unix)]
        {
            let _ = kill_switch;
            super::signal::signal_group(pid, signal)
        }

        #[cfg(not(unix))]
        {
            // No graceful termination available; any signal is a kill
            let _ = signal;
            kill_switch
                .send(())
                .map_err(|_| ProcessError::SignalFailed {
                    pid,
                    reason: "process watcher is gone".to_string(),
                })
        }
    }
}

fn exit_from_status(status: ExitStatus) -> ProcessExit {
    #[cfg(unix)]
    let signal = {
        use std::os::unix::process::ExitStatusExt;
        status.signal()
    };
    #[cfg(not(unix))]
    let signal = None;

    ProcessExit {
        code: status.code(),
        signal,
    }
}
