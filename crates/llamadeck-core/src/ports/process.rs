//! Process manager port.
//!
//! This port owns every OS-level operation on the llama-server child. The
//! supervisor keeps only the [`ProcessHandle`] and the exit receiver returned
//! from [`ProcessManagerPort::spawn`].

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use super::ProcessError;

/// Identifies a process spawned by a [`ProcessManagerPort`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessHandle {
    /// OS process ID.
    pub pid: u32,
    /// When the process was created.
    pub started_at: DateTime<Utc>,
}

impl ProcessHandle {
    /// Create a handle stamped with the current time.
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            started_at: Utc::now(),
        }
    }
}

/// Signals the supervisor may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessSignal {
    /// Ask the process to shut down (SIGTERM).
    Terminate,
    /// Force the process down (SIGKILL).
    Kill,
}

impl fmt::Display for ProcessSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminate => f.write_str("SIGTERM"),
            Self::Kill => f.write_str("SIGKILL"),
        }
    }
}

/// How a process ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Terminating signal number, if it was killed by one.
    pub signal: Option<i32>,
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {code}"),
            (None, Some(signal)) => write!(f, "signal {signal}"),
            (None, None) => f.write_str("unknown status"),
        }
    }
}

/// Asynchronous notification delivered exactly once per spawned process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// The process ended.
    Exited(ProcessExit),
    /// The process could not be waited on (it is gone from our point of view).
    Failed(String),
}

impl fmt::Display for ProcessEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(exit) => write!(f, "exited with {exit}"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Result of a successful spawn.
#[derive(Debug)]
pub struct SpawnedProcess {
    pub handle: ProcessHandle,
    /// Fires once when the process exits.
    pub events: oneshot::Receiver<ProcessEvent>,
}

/// Owns OS process handles: spawn, signal, exit detection.
pub trait ProcessManagerPort: Send + Sync {
    /// Start `binary` with `args`, stdout/stderr captured and stdin discarded.
    ///
    /// Returns as soon as the OS has created the process. The child must not
    /// be tied to the caller's lifetime. Errors here are synchronous spawn
    /// failures only; anything after creation arrives on `events`.
    fn spawn(&self, binary: &Path, args: &[String]) -> Result<SpawnedProcess, ProcessError>;

    /// Send `signal` to the process (group) behind `handle`.
    ///
    /// A handle that is no longer tracked is a no-op, not an error.
    fn signal(&self, handle: &ProcessHandle, signal: ProcessSignal) -> Result<(), ProcessError>;
}
