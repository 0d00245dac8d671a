//! Supervisor for the llama-server process lifecycle.
//!
//! The `ServerSupervisor` drives the readiness probe, the process manager and
//! the model lister, and is the only writer of [`ServerState`]. Adapters
//! (CLI, HTTP routes) hold a clone of the supervisor and call its methods;
//! they never touch the process or the state directly.
//!
//! Key design decisions:
//! - **Single flight**: an async mutex serializes `start()`/`stop()`; the
//!   "already starting/ready" check runs before and after taking it
//! - **Adopt, don't spawn**: a server that already answers `/health` is
//!   marked ready as external and never signalled by `stop()`
//! - **Cancellable start**: `stop()` cancels an in-flight `start()` before
//!   queueing on the mutex
//! - **Exit watcher**: every spawned child has a task that turns an
//!   unexpected exit into `error`
//! - **No kill on drop**: dropping the supervisor leaves llama-server running

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use llamadeck_core::{
    ModelLister, ProcessError, ProcessEvent, ProcessHandle, ProcessManagerPort, ProcessSignal,
    ReadinessProbe, ServerConfig, ServerState, ServerStatus, SpawnedProcess, SupervisorSettings,
};
use tokio::sync::watch;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::discovery::{DirectoryModelLister, HttpModelLister};
use crate::health::HttpReadinessProbe;
use crate::llama::{build_args, resolve_binary, validate_model_source};
use crate::process::LocalProcessManager;
use crate::state::StateManager;

/// Error from supervisor operations.
///
/// Every error returned by [`ServerSupervisor::start`] has already been
/// recorded in the state as `error` with a matching `last_error`.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    /// The binary, model or configuration is unusable.
    #[error("{0}")]
    Configuration(String),

    /// The OS refused to create the process.
    #[error(transparent)]
    Spawn(#[from] ProcessError),

    /// The health endpoint never answered within the retry budget.
    #[error("llama-server did not respond after {attempts} health checks")]
    ReadinessTimeout { attempts: u32 },

    /// The process died before it became ready.
    #[error("{0}")]
    ExitedDuringStartup(String),
}

/// A child we spawned and have not yet seen exit.
#[derive(Clone)]
struct TrackedProcess {
    handle: ProcessHandle,
    /// `Some` once the process has exited.
    exited: watch::Receiver<Option<ProcessEvent>>,
}

/// How a startup attempt ended without error.
enum Startup {
    Ready,
    Cancelled,
}

struct Inner {
    config: ServerConfig,
    settings: SupervisorSettings,
    processes: Arc<dyn ProcessManagerPort>,
    probe: Arc<dyn ReadinessProbe>,
    lister: Arc<dyn ModelLister>,
    state: StateManager,
    tracked: Mutex<Option<TrackedProcess>>,
    /// Serializes start/stop critical sections.
    command_lock: tokio::sync::Mutex<()>,
    /// Token of the start currently in flight.
    start_cancel: Mutex<Option<CancellationToken>>,
}

/// Supervisor for a single llama-server instance.
///
/// Cheap to clone; clones share the same process and state.
///
/// # Example
///
/// ```ignore
/// let supervisor = ServerSupervisor::local(config, SupervisorSettings::default())?;
/// supervisor.start().await?;
/// println!("Status: {}", supervisor.state().status);
/// supervisor.stop().await;
/// ```
#[derive(Clone)]
pub struct ServerSupervisor {
    inner: Arc<Inner>,
}

impl ServerSupervisor {
    /// Create a supervisor over the given collaborators.
    pub fn new(
        config: ServerConfig,
        settings: SupervisorSettings,
        processes: Arc<dyn ProcessManagerPort>,
        probe: Arc<dyn ReadinessProbe>,
        lister: Arc<dyn ModelLister>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                settings,
                processes,
                probe,
                lister,
                state: StateManager::new(),
                tracked: Mutex::new(None),
                command_lock: tokio::sync::Mutex::new(()),
                start_cancel: Mutex::new(None),
            }),
        }
    }

    /// Create a supervisor wired to the local OS and HTTP adapters.
    ///
    /// Model listing falls back to scanning `models_dir` when configured.
    pub fn local(
        config: ServerConfig,
        settings: SupervisorSettings,
    ) -> Result<Self, SupervisorError> {
        Self::local_with_processes(config, settings, Arc::new(LocalProcessManager::new()))
    }

    /// Like [`ServerSupervisor::local`] with a caller-provided process manager.
    pub fn local_with_processes(
        config: ServerConfig,
        settings: SupervisorSettings,
        processes: Arc<LocalProcessManager>,
    ) -> Result<Self, SupervisorError> {
        let probe = HttpReadinessProbe::new(settings.effective_probe_timeout())
            .map_err(|e| SupervisorError::Configuration(format!("HTTP client: {e}")))?;
        let mut lister = HttpModelLister::new(settings.effective_listing_timeout())
            .map_err(|e| SupervisorError::Configuration(format!("HTTP client: {e}")))?;
        if let Some(dir) = &config.models_dir {
            lister = lister.with_fallback(DirectoryModelLister::new(dir));
        }

        Ok(Self::new(
            config,
            settings,
            processes,
            Arc::new(probe),
            Arc::new(lister),
        ))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Snapshot of the current state. Never performs I/O.
    pub fn state(&self) -> ServerState {
        self.inner.state.snapshot()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.inner.state.subscribe()
    }

    /// Bring llama-server up, or adopt one that is already answering.
    ///
    /// Returns immediately when a start is in flight or the server is ready.
    /// A start cancelled by [`ServerSupervisor::stop`] returns `Ok(())`.
    pub async fn start(&self) -> Result<(), SupervisorError> {
        let inner = &self.inner;
        if inner.state.status().is_active() {
            debug!(status = %inner.state.status(), "Start ignored; already active");
            return Ok(());
        }

        let _guard = inner.command_lock.lock().await;
        if inner.state.status().is_active() {
            debug!(status = %inner.state.status(), "Start ignored; already active");
            return Ok(());
        }

        let cancel = CancellationToken::new();
        *lock(&inner.start_cancel) = Some(cancel.clone());
        inner.state.set_status(ServerStatus::Starting);
        info!(host = %inner.config.host, port = inner.config.port, "Starting llama-server");

        let result = self.run_startup(&cancel).await;
        lock(&inner.start_cancel).take();

        match result {
            Ok(Startup::Ready) => Ok(()),
            Ok(Startup::Cancelled) => {
                info!("Start cancelled by stop request");
                if self.current_process().is_none() {
                    inner.state.reset();
                }
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "llama-server failed to start");
                Err(e)
            }
        }
    }

    /// Shut down the process we spawned, escalating to SIGKILL after the
    /// grace period.
    ///
    /// Resolves once the process has exited. A no-op when nothing was
    /// spawned by this supervisor, including an adopted external server.
    pub async fn stop(&self) {
        let inner = &self.inner;
        if let Some(token) = lock(&inner.start_cancel).as_ref() {
            token.cancel();
        }

        let _guard = inner.command_lock.lock().await;
        let Some(tracked) = self.current_process() else {
            debug!("No llama-server process tracked; nothing to stop");
            return;
        };

        let pid = tracked.handle.pid;
        let grace = inner.settings.effective_shutdown_grace();
        let mut exited = tracked.exited.clone();

        inner.state.set_status(ServerStatus::Stopping);
        info!(pid, "Stopping llama-server");

        if let Err(e) = inner
            .processes
            .signal(&tracked.handle, ProcessSignal::Terminate)
        {
            warn!(pid, error = %e, "Failed to send SIGTERM");
        }

        match timeout(grace, wait_for_exit(&mut exited)).await {
            Ok(event) => {
                debug!(pid, event = ?event, "llama-server exited after SIGTERM");
            }
            Err(_) => {
                warn!(
                    pid,
                    grace_ms = grace.as_millis(),
                    "llama-server did not exit in time; sending SIGKILL"
                );
                self.kill_and_wait(&tracked, &mut exited, grace).await;
            }
        }

        self.clear_process(pid);
        inner.state.reset();
        info!(pid, "llama-server stopped");
    }

    /// `stop()` followed by `start()`.
    pub async fn restart(&self) -> Result<(), SupervisorError> {
        self.stop().await;
        self.start().await
    }

    async fn run_startup(&self, cancel: &CancellationToken) -> Result<Startup, SupervisorError> {
        let inner = &self.inner;
        let host = inner.config.host.as_str();
        let port = inner.config.port;

        let already_running = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(Startup::Cancelled),
            healthy = inner.probe.probe(host, port) => healthy,
        };
        if already_running {
            info!(host, port, "llama-server already running; adopting it");
            return self.finish_ready(cancel, true).await;
        }

        let binary = self.validate_launch()?;
        let args = build_args(&inner.config);
        debug!(binary = %binary.display(), ?args, "Launching llama-server");

        let spawned = inner.processes.spawn(&binary, &args).map_err(|e| {
            let e = SupervisorError::Spawn(e);
            inner.state.mark_error(e.to_string());
            e
        })?;
        self.track(spawned);

        let attempts = inner.settings.effective_startup_attempts();
        let interval = inner.settings.effective_probe_interval();

        for attempt in 1..=attempts {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(Startup::Cancelled),
                () = sleep(interval) => {}
            }

            if inner.state.status() != ServerStatus::Starting {
                return Err(self.startup_exit_error());
            }

            let healthy = tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(Startup::Cancelled),
                healthy = inner.probe.probe(host, port) => healthy,
            };
            if healthy {
                info!(host, port, attempt, "llama-server is ready");
                return self.finish_ready(cancel, false).await;
            }
            debug!(attempt, attempts, "llama-server not ready yet");
        }

        let e = SupervisorError::ReadinessTimeout { attempts };
        if inner.state.status() != ServerStatus::Starting {
            return Err(self.startup_exit_error());
        }
        inner.state.mark_error(e.to_string());
        self.kill_current().await;
        Err(e)
    }

    /// Check binary and model paths, returning the binary to launch.
    fn validate_launch(&self) -> Result<PathBuf, SupervisorError> {
        let config = &self.inner.config;
        let checked = config
            .validate()
            .map_err(|e| e.to_string())
            .and_then(|()| validate_model_source(config).map_err(|e| e.to_string()))
            .and_then(|()| resolve_binary(&config.binary_path).map_err(|e| e.to_string()));

        checked.map_err(|message| {
            self.inner.state.mark_error(message.clone());
            SupervisorError::Configuration(message)
        })
    }

    /// Discover models and enter `ready`.
    async fn finish_ready(
        &self,
        cancel: &CancellationToken,
        external: bool,
    ) -> Result<Startup, SupervisorError> {
        let inner = &self.inner;
        let listing = inner
            .lister
            .list_models(&inner.config.host, inner.config.port);

        let models = match timeout(inner.settings.effective_listing_timeout(), listing).await {
            Ok(Ok(models)) => models,
            Ok(Err(e)) => {
                warn!(error = %e, "Model discovery failed; continuing with no models");
                Vec::new()
            }
            Err(_) => {
                warn!("Model discovery timed out; continuing with no models");
                Vec::new()
            }
        };

        if cancel.is_cancelled() {
            return Ok(Startup::Cancelled);
        }
        if inner.state.mark_ready(models, external) {
            Ok(Startup::Ready)
        } else {
            Err(self.startup_exit_error())
        }
    }

    fn startup_exit_error(&self) -> SupervisorError {
        let message = self
            .inner
            .state
            .snapshot()
            .last_error
            .unwrap_or_else(|| "llama-server exited during startup".to_string());
        SupervisorError::ExitedDuringStartup(message)
    }

    /// Remember a freshly spawned child and watch for its exit.
    fn track(&self, spawned: SpawnedProcess) {
        let SpawnedProcess { handle, events } = spawned;
        let pid = handle.pid;
        let (exit_tx, exit_rx) = watch::channel(None);

        *lock(&self.inner.tracked) = Some(TrackedProcess {
            handle,
            exited: exit_rx,
        });
        self.inner.state.set_process(Some(pid));

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let event = events
                .await
                .unwrap_or_else(|_| ProcessEvent::Failed("exit notification lost".to_string()));
            exit_tx.send_replace(Some(event.clone()));

            if let Some(inner) = weak.upgrade() {
                handle_exit(&inner, pid, &event);
            }
        });
    }

    fn current_process(&self) -> Option<TrackedProcess> {
        lock(&self.inner.tracked).clone()
    }

    fn clear_process(&self, pid: u32) {
        let mut tracked = lock(&self.inner.tracked);
        if tracked.as_ref().is_some_and(|t| t.handle.pid == pid) {
            *tracked = None;
        }
    }

    /// Kill whatever is tracked, used when startup gives up.
    async fn kill_current(&self) {
        let Some(tracked) = self.current_process() else {
            return;
        };
        let mut exited = tracked.exited.clone();
        let grace = self.inner.settings.effective_shutdown_grace();
        self.kill_and_wait(&tracked, &mut exited, grace).await;
        self.clear_process(tracked.handle.pid);
        self.inner.state.set_process(None);
    }

    async fn kill_and_wait(
        &self,
        tracked: &TrackedProcess,
        exited: &mut watch::Receiver<Option<ProcessEvent>>,
        wait: Duration,
    ) {
        let pid = tracked.handle.pid;
        if let Err(e) = self
            .inner
            .processes
            .signal(&tracked.handle, ProcessSignal::Kill)
        {
            error!(pid, error = %e, "Failed to send SIGKILL");
            return;
        }
        if timeout(wait, wait_for_exit(exited)).await.is_err() {
            error!(pid, "llama-server did not report exit after SIGKILL");
        }
    }
}

/// Exit watcher callback.
///
/// Exits during `stopping` belong to `stop()`. Otherwise the handle is
/// dropped and an active server becomes `error`.
fn handle_exit(inner: &Inner, pid: u32, event: &ProcessEvent) {
    if inner.state.status() == ServerStatus::Stopping {
        debug!(pid, %event, "llama-server exited during shutdown");
        return;
    }

    {
        let mut tracked = lock(&inner.tracked);
        if !tracked.as_ref().is_some_and(|t| t.handle.pid == pid) {
            return;
        }
        *tracked = None;
    }

    let starting = inner.state.status() == ServerStatus::Starting;
    let message = if starting {
        format!("llama-server {event} during startup")
    } else {
        format!("llama-server {event} unexpectedly")
    };
    if inner.state.mark_crashed(message) {
        error!(pid, %event, starting, "llama-server exited unexpectedly");
    } else {
        inner.state.set_process(None);
        debug!(pid, %event, "llama-server exited");
    }
}

/// Wait until the exit watcher has published an event.
async fn wait_for_exit(
    exited: &mut watch::Receiver<Option<ProcessEvent>>,
) -> Option<ProcessEvent> {
    exited
        .wait_for(Option::is_some)
        .await
        .ok()
        .and_then(|event| event.clone())
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl std::fmt::Debug for ServerSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerSupervisor")
            .field("host", &self.inner.config.host)
            .field("port", &self.inner.config.port)
            .field("status", &self.inner.state.status())
            .finish_non_exhaustive()
    }
}

