//! Normalized model records reported by a running server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A model the inference server reports as available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    /// Unique key within a model list.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Model format or owner (e.g. `gguf`), `unknown` when not reported.
    #[serde(rename = "type")]
    pub model_type: String,
    /// Size in bytes, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Location on disk, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Last modification time; discovery time when not reported.
    pub modified_at: DateTime<Utc>,
}

impl ModelRecord {
    /// Create a record with no size information.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        model_type: impl Into<String>,
        modified_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            model_type: model_type.into(),
            size: None,
            path: None,
            modified_at,
        }
    }

    /// Attach a size in bytes.
    #[must_use]
    pub const fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Attach the on-disk location.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}
