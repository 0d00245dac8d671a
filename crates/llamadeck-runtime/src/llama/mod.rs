//! Helpers for building llama-server invocations.

pub mod args;
pub mod resolve;

pub use args::build_args;
pub use resolve::{resolve_binary, validate_model_source};
