//! Process runtime and OS-level concerns for llamadeck.
//!
//! Adapters for the ports defined in `llamadeck-core` plus the pieces that
//! drive them:
//!
//! - [`llama`] - argument building and binary resolution
//! - [`process`] - spawning, signalling and log capture for llama-server
//! - [`health`] - HTTP readiness probe
//! - [`discovery`] - model listing over HTTP with a directory fallback
//! - [`state`] - the state manager behind every snapshot
//! - [`supervisor`] - the start/stop state machine

#![deny(unsafe_code)]

pub mod discovery;
mod health;
pub mod llama;
pub mod process;
pub mod state;
pub mod supervisor;

pub use discovery::{DirectoryModelLister, HttpModelLister};
pub use health::HttpReadinessProbe;
pub use llama::{build_args, resolve_binary};
pub use process::{LocalProcessManager, ServerLogBuffer, ServerLogEntry};
pub use state::StateManager;
pub use supervisor::{ServerSupervisor, SupervisorError};
