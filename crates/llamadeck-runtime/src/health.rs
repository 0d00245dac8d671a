//! HTTP readiness probe for llama-server.
//!
//! A single `GET /health` with a short timeout. No retries here; the
//! supervisor decides how often to ask.

use std::time::Duration;

use async_trait::async_trait;
use llamadeck_core::ReadinessProbe;
use reqwest::Client;
use tracing::debug;

/// [`ReadinessProbe`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpReadinessProbe {
    client: Client,
}

impl HttpReadinessProbe {
    /// Probe whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).no_proxy().build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReadinessProbe for HttpReadinessProbe {
    async fn probe(&self, host: &str, port: u16) -> bool {
        let health_url = format!("http://{host}:{port}/health");

        match self.client.get(&health_url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(host, port, status = %response.status(), "Health check not ready");
                false
            }
            Err(e) => {
                debug!(host, port, error = %e, "Health check failed");
                false
            }
        }
    }
}
