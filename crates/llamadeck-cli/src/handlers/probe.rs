//! Probe command handler.

use anyhow::{Context, Result, bail};
use llamadeck_core::{ReadinessProbe, ServerConfig, SupervisorSettings};
use llamadeck_runtime::HttpReadinessProbe;

/// Send a single health check; fails when the server is not ready.
pub async fn execute(config: &ServerConfig, settings: &SupervisorSettings) -> Result<()> {
    let probe = HttpReadinessProbe::new(settings.effective_probe_timeout())
        .context("Failed to build HTTP client")?;

    if probe.probe(&config.host, config.port).await {
        println!("llama-server is ready at {}", config.base_url());
        Ok(())
    } else {
        bail!("No ready llama-server at {}", config.base_url())
    }
}
