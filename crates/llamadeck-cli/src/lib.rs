#![deny(unsafe_code)]

//! Command-line front end for the llama-server supervisor.

pub mod bootstrap;
pub mod commands;
pub mod handlers;
pub mod parser;

pub use bootstrap::{CliConfig, bootstrap, init_tracing};
pub use commands::Commands;
pub use parser::Cli;
