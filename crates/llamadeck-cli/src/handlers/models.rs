//! Models command handler.

use anyhow::{Context, Result};
use llamadeck_core::{ModelLister, ModelRecord, ServerConfig, SupervisorSettings};
use llamadeck_runtime::{DirectoryModelLister, HttpModelLister};

/// List models from a running server, or from `models_dir` when it is down.
pub async fn execute(config: &ServerConfig, settings: &SupervisorSettings, json: bool) -> Result<()> {
    let mut lister = HttpModelLister::new(settings.effective_listing_timeout())
        .context("Failed to build HTTP client")?;
    if let Some(dir) = &config.models_dir {
        lister = lister.with_fallback(DirectoryModelLister::new(dir));
    }

    let models = lister
        .list_models(&config.host, config.port)
        .await
        .with_context(|| format!("Failed to list models at {}", config.base_url()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&models)?);
    } else {
        print_table(&models);
    }
    Ok(())
}

fn print_table(models: &[ModelRecord]) {
    if models.is_empty() {
        println!("No models found.");
        return;
    }

    let width = models.iter().map(|m| m.id.len()).max().unwrap_or(0).max(2);
    println!("{:<width$}  {:<8}  {:>12}  MODIFIED", "ID", "TYPE", "SIZE");
    for model in models {
        let size = model
            .size
            .map_or_else(|| "-".to_string(), |bytes| bytes.to_string());
        println!(
            "{:<width$}  {:<8}  {:>12}  {}",
            model.id,
            model.model_type,
            size,
            model.modified_at.format("%Y-%m-%d %H:%M")
        );
    }
}
