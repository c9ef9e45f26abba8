//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::{FsBlobStore, SqliteStore};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    pub base_dir: PathBuf,
    pub config_file: PathBuf,
    pub db_file: PathBuf,
    pub blob_dir: PathBuf,
    pub overwritten: bool,
}

/// Write a default config and create the document database and blob directory
pub async fn cmd_init(base_dir: Option<PathBuf>, force: bool) -> Result<InitReport> {
    let mut config = Config::default();
    config.init_paths(base_dir);

    let overwritten = config.paths.config_file.exists();
    if overwritten && !force {
        return Err(Error::AlreadyInitialized(
            config.paths.config_file.display().to_string(),
        ));
    }

    config.validate()?;
    config.save()?;

    SqliteStore::connect(&config).await?;
    info!("Created database at {:?}", config.paths.db_file);

    FsBlobStore::new(&config.paths.blob_dir)?;
    info!("Created blob directory at {:?}", config.paths.blob_dir);

    Ok(InitReport {
        base_dir: config.paths.base_dir,
        config_file: config.paths.config_file,
        db_file: config.paths.db_file,
        blob_dir: config.paths.blob_dir,
        overwritten,
    })
}

pub fn print_init(report: &InitReport) {
    println!("✓ Initialized memvault at {}", report.base_dir.display());
    println!("\nConfiguration: {}", report.config_file.display());
    println!("Database: {}", report.db_file.display());
    println!("Blobs: {}", report.blob_dir.display());
    println!("\nNext steps:");
    println!("  memvault index ./src --type code          # Index a codebase");
    println!("  memvault store notes.md --type architecture");
    println!("  memvault search \"booking retries\"         # Search the memory");
}
