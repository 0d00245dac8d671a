//! Supervisor timing settings.
//!
//! These govern how the supervisor waits on llama-server, not how
//! llama-server itself runs. Every field is optional in the serialized form;
//! missing values fall back to the defaults below via the `effective_*`
//! accessors.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of readiness probes before a start is abandoned.
pub const DEFAULT_STARTUP_ATTEMPTS: u32 = 60;

/// Default delay between readiness probes, in milliseconds.
pub const DEFAULT_PROBE_INTERVAL_MS: u64 = 1_000;

/// Default per-probe HTTP timeout, in milliseconds.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2_000;

/// Default wait after SIGTERM before escalating to SIGKILL, in milliseconds.
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 5_000;

/// Default timeout for the model listing request, in milliseconds.
pub const DEFAULT_LISTING_TIMEOUT_MS: u64 = 5_000;

/// Timing knobs for the supervisor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorSettings {
    /// Readiness probes after spawning before giving up.
    pub startup_attempts: Option<u32>,
    /// Delay before each readiness probe.
    pub probe_interval_ms: Option<u64>,
    /// HTTP timeout for a single probe.
    pub probe_timeout_ms: Option<u64>,
    /// Grace period between SIGTERM and SIGKILL.
    pub shutdown_grace_ms: Option<u64>,
    /// HTTP timeout for `/v1/models`.
    pub listing_timeout_ms: Option<u64>,
}

impl SupervisorSettings {
    /// Settings with every value explicitly set to its default.
    pub const fn with_defaults() -> Self {
        Self {
            startup_attempts: Some(DEFAULT_STARTUP_ATTEMPTS),
            probe_interval_ms: Some(DEFAULT_PROBE_INTERVAL_MS),
            probe_timeout_ms: Some(DEFAULT_PROBE_TIMEOUT_MS),
            shutdown_grace_ms: Some(DEFAULT_SHUTDOWN_GRACE_MS),
            listing_timeout_ms: Some(DEFAULT_LISTING_TIMEOUT_MS),
        }
    }

    /// Number of readiness probes, at least one.
    pub fn effective_startup_attempts(&self) -> u32 {
        self.startup_attempts
            .unwrap_or(DEFAULT_STARTUP_ATTEMPTS)
            .max(1)
    }

    pub fn effective_probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms.unwrap_or(DEFAULT_PROBE_INTERVAL_MS))
    }

    pub fn effective_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms.unwrap_or(DEFAULT_PROBE_TIMEOUT_MS))
    }

    pub fn effective_shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms.unwrap_or(DEFAULT_SHUTDOWN_GRACE_MS))
    }

    pub fn effective_listing_timeout(&self) -> Duration {
        Duration::from_millis(
            self.listing_timeout_ms
                .unwrap_or(DEFAULT_LISTING_TIMEOUT_MS),
        )
    }

    /// Override the number of readiness probes.
    #[must_use]
    pub const fn with_startup_attempts(mut self, attempts: u32) -> Self {
        self.startup_attempts = Some(attempts);
        self
    }

    /// Override the probe interval.
    #[must_use]
    pub const fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval_ms = Some(interval.as_millis() as u64);
        self
    }

    /// Override the shutdown grace period.
    #[must_use]
    pub const fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace_ms = Some(grace.as_millis() as u64);
        self
    }
}
