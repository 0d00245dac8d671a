//! Model listing through llama-server's OpenAI-compatible endpoint.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use llamadeck_core::{DiscoveryError, ModelLister, ModelRecord};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::DirectoryModelLister;

/// [`ModelLister`] that queries `GET /v1/models`.
///
/// When a fallback directory is configured and the request fails, the
/// directory is scanned instead.
#[derive(Debug, Clone)]
pub struct HttpModelLister {
    client: Client,
    fallback: Option<DirectoryModelLister>,
}

impl HttpModelLister {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).no_proxy().build()?;
        Ok(Self {
            client,
            fallback: None,
        })
    }

    /// Scan `fallback` when the server cannot be queried.
    #[must_use]
    pub fn with_fallback(mut self, fallback: DirectoryModelLister) -> Self {
        self.fallback = Some(fallback);
        self
    }

    async fn fetch(&self, host: &str, port: u16) -> Result<Vec<ModelRecord>, DiscoveryError> {
        let url = format!("http://{host}:{port}/v1/models");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DiscoveryError::Request(e.to_string()))?;

        if !response.status().is_success() {
            debug!(host, port, status = %response.status(), "Model listing returned non-success status");
            return Ok(Vec::new());
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| DiscoveryError::Decode(e.to_string()))?;
        Ok(normalize_models(&body, Utc::now()))
    }
}

#[async_trait]
impl ModelLister for HttpModelLister {
    async fn list_models(
        &self,
        host: &str,
        port: u16,
    ) -> Result<Vec<ModelRecord>, DiscoveryError> {
        match self.fetch(host, port).await {
            Ok(models) => Ok(models),
            Err(e) => match &self.fallback {
                Some(fallback) => {
                    warn!(
                        error = %e,
                        dir = %fallback.dir().display(),
                        "Model listing failed, scanning models directory"
                    );
                    fallback.scan().await
                }
                None => Err(e),
            },
        }
    }
}

/// Normalize a `/v1/models` payload into model records.
///
/// Accepts a bare array or an object with a `data` array; anything else is
/// an empty list. Entries without `id` or `name` are dropped, duplicate ids
/// keep their first occurrence, and `now` stands in for missing timestamps.
pub fn normalize_models(body: &Value, now: DateTime<Utc>) -> Vec<ModelRecord> {
    let entries = match body {
        Value::Array(entries) => entries,
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(entries)) => entries,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    let mut seen = HashSet::new();
    entries
        .iter()
        .filter_map(|entry| normalize_entry(entry, now))
        .filter(|model| seen.insert(model.id.clone()))
        .collect()
}

fn normalize_entry(entry: &Value, now: DateTime<Utc>) -> Option<ModelRecord> {
    let id = non_empty_str(entry, "id");
    let name = non_empty_str(entry, "name");
    let id = id.or(name)?.to_string();
    let name = name.map_or_else(|| id.clone(), str::to_string);

    let model_type = non_empty_str(entry, "type")
        .or_else(|| non_empty_str(entry, "owned_by"))
        .unwrap_or("unknown")
        .to_string();

    let size = entry
        .get("size")
        .and_then(Value::as_u64)
        .or_else(|| entry.pointer("/meta/size").and_then(Value::as_u64));

    let modified_at = entry
        .get("modified_at")
        .and_then(parse_timestamp)
        .or_else(|| entry.get("created").and_then(parse_timestamp))
        .unwrap_or(now);

    let mut record = ModelRecord::new(id, name, model_type, modified_at);
    record.size = size;
    record.path = non_empty_str(entry, "path").map(str::to_string);
    Some(record)
}

fn non_empty_str<'a>(entry: &'a Value, key: &str) -> Option<&'a str> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Unix seconds or an RFC 3339 string.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}
