//! Supervisor lifecycle state.
//!
//! `ServerState` is the single source of truth for the supervised server.
//! Consumers only ever see cloned snapshots of it.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ModelRecord;

/// Server lifecycle status.
///
/// Transitions: `initial → starting → ready`, `ready → stopping → initial`,
/// any state `→ error`, and `error → starting` on retry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    /// Nothing running, nothing tracked.
    #[default]
    Initial,
    /// A start is in flight.
    Starting,
    /// The server answers its health endpoint.
    Ready,
    /// Shutdown has been requested and is in progress.
    Stopping,
    /// The last start failed or the process died unexpectedly.
    Error,
}

impl ServerStatus {
    /// Whether a `start()` call should short-circuit.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Ready)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Stopping => "stopping",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the supervised server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerState {
    /// Current lifecycle status.
    pub status: ServerStatus,
    /// Models discovered on the last transition to `ready`.
    pub models: Vec<ModelRecord>,
    /// Description of the last failure, cleared on `ready`.
    pub last_error: Option<String>,
    /// Process ID of the child we spawned, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// True when the server was already running and we did not spawn it.
    pub external: bool,
    /// When the server became ready.
    pub started_at: Option<DateTime<Utc>>,
}

impl ServerState {
    /// Time since the server became ready, zero when not running.
    pub fn uptime(&self, now: DateTime<Utc>) -> Duration {
        self.started_at
            .and_then(|started| (now - started).to_std().ok())
            .unwrap_or_default()
    }
}
