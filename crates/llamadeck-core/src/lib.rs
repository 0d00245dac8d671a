//! Core domain types and ports for llamadeck.
//!
//! This crate is the shared vocabulary between the supervisor runtime and
//! the adapters around it. It performs no I/O beyond reading a config file.
//!
//! # Modules
//!
//! - [`domain`] - server configuration, lifecycle state and model records
//! - [`ports`] - trait abstractions for the process manager, readiness
//!   prober and model lister
//! - [`settings`] - supervisor timing and retry policy

#![deny(unsafe_code)]

pub mod domain;
pub mod ports;
pub mod settings;

pub use domain::{ConfigError, FlashAttention, ModelRecord, ServerConfig, ServerState, ServerStatus};
pub use ports::{
    DiscoveryError, ModelLister, ProcessError, ProcessEvent, ProcessExit, ProcessHandle,
    ProcessManagerPort, ProcessSignal, ReadinessProbe, SpawnedProcess,
};
pub use settings::SupervisorSettings;
