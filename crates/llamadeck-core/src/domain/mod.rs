//! Domain types for the supervised inference server.

mod config;
mod model;
mod state;

pub use config::{
    ConfigError, DEFAULT_BINARY, DEFAULT_HOST, DEFAULT_PORT, FlashAttention, ServerConfig,
};
pub use model::ModelRecord;
pub use state::{ServerState, ServerStatus};
