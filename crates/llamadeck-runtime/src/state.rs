//! State manager for the supervised server.
//!
//! Holds the authoritative [`ServerState`] inside a `watch` channel so that
//! every mutation is published to subscribers. Reads are snapshots and never
//! touch the network or the OS.

use chrono::Utc;
use llamadeck_core::{ModelRecord, ServerState, ServerStatus};
use tokio::sync::watch;
use tracing::info;

#[derive(Debug)]
pub struct StateManager {
    tx: watch::Sender<ServerState>,
}

impl StateManager {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ServerState::default());
        Self { tx }
    }

    /// Cloned copy of the current state.
    pub fn snapshot(&self) -> ServerState {
        self.tx.borrow().clone()
    }

    pub fn status(&self) -> ServerStatus {
        self.tx.borrow().status
    }

    /// Receiver that observes every subsequent change.
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.tx.subscribe()
    }

    /// Move to `status`. Leaving `ready` drops the model list.
    pub fn set_status(&self, status: ServerStatus) {
        self.tx.send_modify(|state| {
            if state.status != status {
                info!(from = %state.status, to = %status, "Server status changed");
            }
            state.status = status;
            if status != ServerStatus::Ready {
                state.models.clear();
            }
        });
    }

    /// Record the spawned child's pid.
    pub fn set_process(&self, pid: Option<u32>) {
        self.tx.send_modify(|state| state.pid = pid);
    }

    /// Enter `ready` with a freshly discovered model list.
    ///
    /// Only applies while `starting`; returns `false` when the state has
    /// already moved on (crash or shutdown).
    pub fn mark_ready(&self, models: Vec<ModelRecord>, external: bool) -> bool {
        self.tx.send_if_modified(|state| {
            if state.status != ServerStatus::Starting {
                return false;
            }
            info!(
                from = %state.status,
                to = %ServerStatus::Ready,
                models = models.len(),
                external,
                "Server status changed"
            );
            state.status = ServerStatus::Ready;
            state.models = models;
            state.last_error = None;
            state.external = external;
            state.started_at = Some(Utc::now());
            true
        })
    }

    /// Record an unexpected process exit.
    ///
    /// Only applies while `starting` or `ready`; returns whether it did.
    pub fn mark_crashed(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        self.tx.send_if_modified(|state| {
            if !state.status.is_active() {
                return false;
            }
            info!(from = %state.status, to = %ServerStatus::Error, "Server status changed");
            state.status = ServerStatus::Error;
            state.models.clear();
            state.last_error = Some(message);
            state.pid = None;
            state.external = false;
            state.started_at = None;
            true
        })
    }

    /// Enter `error` with a description of what went wrong.
    pub fn mark_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_modify(|state| {
            info!(from = %state.status, to = %ServerStatus::Error, "Server status changed");
            state.status = ServerStatus::Error;
            state.models.clear();
            state.last_error = Some(message);
            state.external = false;
            state.started_at = None;
        });
    }

    /// Back to `initial`. `last_error` is kept for inspection.
    pub fn reset(&self) {
        self.tx.send_modify(|state| {
            if state.status != ServerStatus::Initial {
                info!(from = %state.status, to = %ServerStatus::Initial, "Server status changed");
            }
            state.status = ServerStatus::Initial;
            state.models.clear();
            state.pid = None;
            state.external = false;
            state.started_at = None;
        });
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn model(id: &str) -> ModelRecord {
        ModelRecord::new(id, id, "gguf", DateTime::UNIX_EPOCH)
    }

    #[test]
    fn test_starts_initial() {
        let manager = StateManager::new();
        assert_eq!(manager.status(), ServerStatus::Initial);
        assert_eq!(manager.snapshot(), ServerState::default());
    }

    #[test]
    fn test_ready_clears_last_error() {
        let manager = StateManager::new();
        manager.mark_error("boom");
        assert_eq!(manager.snapshot().last_error.as_deref(), Some("boom"));

        manager.set_status(ServerStatus::Starting);
        assert!(manager.mark_ready(vec![model("a")], false));

        let state = manager.snapshot();
        assert_eq!(state.status, ServerStatus::Ready);
        assert!(state.last_error.is_none());
        assert_eq!(state.models.len(), 1);
        assert!(state.started_at.is_some());
    }

    #[test]
    fn test_models_only_while_ready() {
        let manager = StateManager::new();
        manager.set_status(ServerStatus::Starting);
        manager.mark_ready(vec![model("a"), model("b")], true);
        assert!(manager.snapshot().external);

        manager.set_status(ServerStatus::Stopping);
        assert!(manager.snapshot().models.is_empty());

        manager.set_status(ServerStatus::Starting);
        manager.mark_ready(vec![model("a")], false);
        manager.mark_error("crashed");
        let state = manager.snapshot();
        assert!(state.models.is_empty());
        assert!(state.started_at.is_none());
    }

    #[test]
    fn test_ready_only_from_starting() {
        let manager = StateManager::new();
        assert!(!manager.mark_ready(vec![model("a")], false));
        assert_eq!(manager.status(), ServerStatus::Initial);

        manager.mark_error("spawn failed");
        assert!(!manager.mark_ready(vec![model("a")], false));
        assert_eq!(manager.status(), ServerStatus::Error);
    }

    #[test]
    fn test_crash_only_when_active() {
        let manager = StateManager::new();
        assert!(!manager.mark_crashed("exited"));
        assert_eq!(manager.status(), ServerStatus::Initial);

        manager.set_status(ServerStatus::Stopping);
        assert!(!manager.mark_crashed("exited"));
        assert_eq!(manager.status(), ServerStatus::Stopping);

        manager.set_status(ServerStatus::Starting);
        manager.set_process(Some(7));
        manager.mark_ready(vec![model("a")], false);
        assert!(manager.mark_crashed("llama-server exited unexpectedly"));
        let state = manager.snapshot();
        assert_eq!(state.status, ServerStatus::Error);
        assert!(state.pid.is_none());
        assert!(state.models.is_empty());
        assert_eq!(state.last_error.as_deref(), Some("llama-server exited unexpectedly"));
    }

    #[test]
    fn test_reset_clears_process() {
        let manager = StateManager::new();
        manager.set_process(Some(42));
        manager.set_status(ServerStatus::Starting);
        manager.mark_ready(vec![model("a")], false);
        manager.reset();

        let state = manager.snapshot();
        assert_eq!(state.status, ServerStatus::Initial);
        assert!(state.pid.is_none());
        assert!(state.models.is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let manager = StateManager::new();
        let mut rx = manager.subscribe();

        manager.set_status(ServerStatus::Starting);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().status, ServerStatus::Starting);

        assert!(manager.mark_ready(Vec::new(), false));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().status, ServerStatus::Ready);
    }
}
