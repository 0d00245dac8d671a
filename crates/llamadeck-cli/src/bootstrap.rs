//! CLI bootstrap - the composition root.
//!
//! Resolves the effective server configuration (config file, then
//! environment and flags) and sets up logging. Handlers receive the result
//! and never read arguments themselves.

use anyhow::{Context, Result};
use llamadeck_core::{ServerConfig, SupervisorSettings};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::parser::Cli;

/// Fully resolved configuration for one invocation.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub server: ServerConfig,
    pub settings: SupervisorSettings,
}

/// Build the [`CliConfig`] for `cli`.
pub fn bootstrap(cli: &Cli) -> Result<CliConfig> {
    let mut server = match &cli.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ServerConfig::default(),
    };
    apply_overrides(&mut server, cli);
    server.validate()?;

    let mut settings = SupervisorSettings::with_defaults();
    if let Some(attempts) = cli.startup_attempts {
        settings = settings.with_startup_attempts(attempts);
    }

    debug!(
        host = %server.host,
        port = server.port,
        binary = %server.binary_path.display(),
        "Resolved server configuration"
    );
    Ok(CliConfig { server, settings })
}

fn apply_overrides(server: &mut ServerConfig, cli: &Cli) {
    if let Some(host) = &cli.host {
        server.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        server.port = port;
    }
    if let Some(binary) = &cli.binary {
        server.binary_path.clone_from(binary);
    }
    if let Some(model) = &cli.model_path {
        server.model_path = Some(model.clone());
    }
    if let Some(dir) = &cli.models_dir {
        server.models_dir = Some(dir.clone());
    }
    if cli.ctx_size.is_some() {
        server.ctx_size = cli.ctx_size;
    }
    if cli.gpu_layers.is_some() {
        server.gpu_layers = cli.gpu_layers;
    }
    server
        .extra_args
        .extend(cli.command.extra_args().iter().cloned());
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`. Output
/// goes to stderr so command output on stdout stays parseable.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init()
        .ok();
}
