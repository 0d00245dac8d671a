//! Main CLI parser and top-level argument handling.
//!
//! Global options override fields of the JSON config file. Every override can
//! also come from the environment (or a `.env` file).

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Supervise a local llama-server process.
#[derive(Parser)]
#[command(name = "llamadeck")]
#[command(about = "Start, supervise and stop a local llama-server")]
#[command(version)]
pub struct Cli {
    /// JSON file with the server configuration
    #[arg(long, global = true, env = "LLAMADECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address llama-server binds to
    #[arg(long, global = true, env = "LLAMA_SERVER_HOST")]
    pub host: Option<String>,

    /// Port llama-server listens on
    #[arg(long, global = true, env = "LLAMA_SERVER_PORT")]
    pub port: Option<u16>,

    /// llama-server binary (name on PATH or a file path)
    #[arg(long, global = true, env = "LLAMA_SERVER_BINARY")]
    pub binary: Option<PathBuf>,

    /// Single model file to load
    #[arg(short = 'm', long = "model", global = true, env = "LLAMA_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Directory of models, used when no model file is given
    #[arg(long = "models-dir", global = true, env = "LLAMA_MODELS_DIR")]
    pub models_dir: Option<PathBuf>,

    /// Context size
    #[arg(long = "ctx-size", global = true)]
    pub ctx_size: Option<u32>,

    /// Layers to offload to the GPU (-1 lets llama-server decide)
    #[arg(long = "gpu-layers", global = true, allow_negative_numbers = true)]
    pub gpu_layers: Option<i32>,

    /// Health checks before giving up on startup
    #[arg(long = "startup-attempts", global = true, env = "LLAMADECK_STARTUP_ATTEMPTS")]
    pub startup_attempts: Option<u32>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
