//! Readiness probe port.

use async_trait::async_trait;

/// Single-attempt health check against the server's own status endpoint.
///
/// Implementations must be stateless and bounded by a short timeout. Retry
/// and backoff are the caller's business.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Returns `true` if the server at `host:port` reports itself healthy.
    async fn probe(&self, host: &str, port: u16) -> bool;
}
