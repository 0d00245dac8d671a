//! Launch configuration for llama-server.
//!
//! `ServerConfig` is an immutable input owned by the caller. The supervisor
//! only reads it: to build the argument list, to validate paths before a
//! spawn, and to know where to probe.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default bind address for llama-server.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default llama-server port.
pub const DEFAULT_PORT: u16 = 8134;

/// Default binary name, resolved through `PATH`.
pub const DEFAULT_BINARY: &str = "llama-server";

/// Errors raised while loading or validating a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON for `ServerConfig`.
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The configuration is structurally valid but unusable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Flash attention mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashAttention {
    On,
    Off,
    /// Let llama-server decide; no flag is emitted.
    #[default]
    Auto,
}

/// Configuration for launching (or locating) a llama-server instance.
///
/// Optional fields that are `None` are never turned into arguments. For
/// `threads`, `gpu_layers`, `n_predict` and `seed` the value `-1` also means
/// "let the binary decide".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address llama-server binds to and the supervisor probes.
    pub host: String,
    /// Port llama-server listens on.
    pub port: u16,
    /// Path to the llama-server binary. A bare name is looked up in `PATH`.
    #[serde(alias = "serverPath")]
    pub binary_path: PathBuf,
    /// Single model to load. Takes precedence over `models_dir`.
    #[serde(alias = "modelPath")]
    pub model_path: Option<PathBuf>,
    /// Directory llama-server scans for models when no model path is set.
    #[serde(alias = "basePath")]
    pub models_dir: Option<PathBuf>,

    // Resource limits
    pub ctx_size: Option<u32>,
    pub batch_size: Option<u32>,
    pub ubatch_size: Option<u32>,
    pub threads: Option<i32>,
    pub threads_batch: Option<i32>,
    pub gpu_layers: Option<i32>,
    pub main_gpu: Option<u32>,
    pub flash_attn: Option<FlashAttention>,

    // Sampling defaults
    pub temperature: Option<f64>,
    pub top_k: Option<i32>,
    pub top_p: Option<f64>,
    pub repeat_penalty: Option<f64>,
    pub n_predict: Option<i32>,
    pub seed: Option<i64>,

    // KV cache
    pub cache_type_k: Option<String>,
    pub cache_type_v: Option<String>,

    // Bare flags
    pub embedding: Option<bool>,
    pub verbose: Option<bool>,
    pub penalize_nl: Option<bool>,
    pub ignore_eos: Option<bool>,
    pub mlock: Option<bool>,
    pub numa: Option<bool>,
    /// `Some(false)` disables memory mapping (`--no-mmap`).
    pub use_mmap: Option<bool>,

    /// Raw arguments appended verbatim after everything else.
    #[serde(alias = "serverArgs")]
    pub extra_args: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            binary_path: PathBuf::from(DEFAULT_BINARY),
            model_path: None,
            models_dir: None,
            ctx_size: None,
            batch_size: None,
            ubatch_size: None,
            threads: None,
            threads_batch: None,
            gpu_layers: None,
            main_gpu: None,
            flash_attn: None,
            temperature: None,
            top_k: None,
            top_p: None,
            repeat_penalty: None,
            n_predict: None,
            seed: None,
            cache_type_k: None,
            cache_type_v: None,
            embedding: None,
            verbose: None,
            penalize_nl: None,
            ignore_eos: None,
            mlock: None,
            numa: None,
            use_mmap: None,
            extra_args: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Create a configuration bound to `host:port` with everything else default.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the fields that no launch could succeed without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be non-zero".to_string()));
        }
        if self.binary_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "binary_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Base URL of the server's HTTP surface.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Set the binary path.
    #[must_use]
    pub fn with_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = path.into();
        self
    }

    /// Set a single model file to load.
    #[must_use]
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    /// Set the models directory used when no model path is given.
    #[must_use]
    pub fn with_models_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.models_dir = Some(path.into());
        self
    }

    /// Set the context size.
    #[must_use]
    pub const fn with_ctx_size(mut self, size: u32) -> Self {
        self.ctx_size = Some(size);
        self
    }

    /// Set the number of GPU layers.
    #[must_use]
    pub const fn with_gpu_layers(mut self, layers: i32) -> Self {
        self.gpu_layers = Some(layers);
        self
    }

    /// Set the raw extra arguments.
    #[must_use]
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }
}
