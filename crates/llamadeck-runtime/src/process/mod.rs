//! llama-server process management.
//!
//! - `manager` - [`LocalProcessManager`], the `ProcessManagerPort` adapter
//! - `logs` - ring buffer and broadcast of captured output
//! - `stream` - lossy line readers for the child's pipes
//! - `signal` - process-group signalling (Unix)

mod logs;
mod manager;
#[cfg(unix)]
mod signal;
mod stream;

pub use logs::{MAX_LOG_LINES, ServerLogBuffer, ServerLogEntry};
pub use manager::LocalProcessManager;
