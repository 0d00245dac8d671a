//! Port definitions (trait abstractions) for external systems.
//!
//! The supervisor drives three collaborators: the OS process primitive, the
//! server's health endpoint and its model-listing endpoint. Each one sits
//! behind a trait here so that the runtime adapters can be swapped for
//! fakes in tests.
//!
//! # Design Rules
//!
//! - No reqwest/nix/tokio-process types in any signature
//! - Probing and listing make no retry decisions; the supervisor owns policy

pub mod model_lister;
pub mod process;
pub mod readiness;

use thiserror::Error;

pub use model_lister::ModelLister;
pub use process::{
    ProcessEvent, ProcessExit, ProcessHandle, ProcessManagerPort, ProcessSignal, SpawnedProcess,
};
pub use readiness::ReadinessProbe;

/// Errors from process manager operations.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The binary could not be located.
    #[error("llama-server binary not found: {0}")]
    BinaryNotFound(String),

    /// The configured model file or directory does not exist.
    #[error("Model path not found: {0}")]
    ModelNotFound(String),

    /// The OS refused to create the process.
    #[error("Failed to spawn llama-server: {0}")]
    SpawnFailed(String),

    /// A signal could not be delivered.
    #[error("Failed to signal process {pid}: {reason}")]
    SignalFailed { pid: u32, reason: String },

    /// Internal process error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors from model discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The request never produced a response.
    #[error("Failed to fetch models from server: {0}")]
    Request(String),

    /// The response body could not be decoded.
    #[error("Invalid model list response: {0}")]
    Decode(String),

    /// The models directory could not be read.
    #[error("Failed to scan models directory: {0}")]
    Io(#[from] std::io::Error),
}
