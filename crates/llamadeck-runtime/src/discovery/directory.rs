//! Models directory scan.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use llamadeck_core::{DiscoveryError, ModelLister, ModelRecord};
use tracing::debug;

/// File extensions reported as models.
const MODEL_EXTENSIONS: &[&str] = &["gguf", "bin"];

/// Lists model files found directly inside a directory.
///
/// Used as a fallback when the server's listing endpoint is unreachable.
#[derive(Debug, Clone)]
pub struct DirectoryModelLister {
    dir: PathBuf,
}

impl DirectoryModelLister {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Scan the directory, sorted by file name.
    ///
    /// A missing directory yields an empty list. Entries whose metadata
    /// cannot be read are skipped.
    pub async fn scan(&self) -> Result<Vec<ModelRecord>, DiscoveryError> {
        if !tokio::fs::try_exists(&self.dir).await.unwrap_or(false) {
            debug!(dir = %self.dir.display(), "Models directory does not exist");
            return Ok(Vec::new());
        }

        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut models = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(extension) = model_extension(&path) else {
                continue;
            };
            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping unreadable model file");
                    continue;
                }
            };

            let id = entry.file_name().to_string_lossy().into_owned();
            let name = path
                .file_stem()
                .map_or_else(|| id.clone(), |stem| stem.to_string_lossy().into_owned());
            let modified_at = metadata
                .modified()
                .map_or_else(|_| Utc::now(), DateTime::<Utc>::from);

            models.push(
                ModelRecord::new(id, name, extension, modified_at)
                    .with_size(metadata.len())
                    .with_path(path.display().to_string()),
            );
        }

        models.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(models)
    }
}

fn model_extension(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    MODEL_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

#[async_trait]
impl ModelLister for DirectoryModelLister {
    async fn list_models(
        &self,
        _host: &str,
        _port: u16,
    ) -> Result<Vec<ModelRecord>, DiscoveryError> {
        self.scan().await
    }
}
