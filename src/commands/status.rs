//! Status command implementation

use crate::config::Config;
use crate::error::Result;
use crate::memory::Memory;
use crate::store::{FsBlobStore, StoreStats};
use serde::Serialize;
use tracing::info;

/// Status information
#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub db_path: String,
    pub blob_dir: String,
    pub embedding_url: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub generation_model: Option<String>,
    pub relationship_sync: String,
    pub blob_files: usize,
    pub stats: StoreStats,
}

/// Get system status
pub async fn cmd_status(config: &Config, memory: &Memory) -> Result<StatusInfo> {
    info!("Getting status");

    let stats = memory.stats().await?;
    let blob_files = FsBlobStore::new(&config.paths.blob_dir)?.count()?;

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        db_path: config.paths.db_file.display().to_string(),
        blob_dir: config.paths.blob_dir.display().to_string(),
        embedding_url: config.embedding.backend_url.clone(),
        embedding_model: memory.embedder().model_name().to_string(),
        embedding_dimension: memory.embedder().dimension(),
        generation_model: config
            .generation
            .enabled
            .then(|| config.generation.model.clone()),
        relationship_sync: format!("{:?}", config.relationships.sync).to_lowercase(),
        blob_files,
        stats,
    })
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 memvault Status\n");
    println!("Configuration: {}", status.config_path);
    println!("Database: {}", status.db_path);
    println!("Blobs: {} ({} files)", status.blob_dir, status.blob_files);

    println!("\nEmbedding:");
    println!("  URL: {}", status.embedding_url);
    println!(
        "  Model: {} ({} dimensions)",
        status.embedding_model, status.embedding_dimension
    );
    if let Some(stored) = status.stats.dimension {
        if stored != status.embedding_dimension {
            println!(
                "  ⚠ Stored documents use {} dimensions; searches will skip them",
                stored
            );
        }
    }

    match &status.generation_model {
        Some(model) => println!("\nAnalysis model: {}", model),
        None => println!("\nAnalysis: disabled"),
    }

    println!("\nDocuments: {}", status.stats.document_count);
    for (doc_type, count) in &status.stats.by_type {
        println!("  {}: {}", doc_type, count);
    }
    println!("  Relocated: {}", status.stats.relocated_count);
    println!("\nRelationship sync: {}", status.relationship_sync);
}
