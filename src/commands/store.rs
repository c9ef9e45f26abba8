//! Store command implementation

use crate::error::{Error, Result};
use crate::memory::{Memory, StoreRequest};
use crate::store::{Document, DocumentType};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

/// Where the content of a `store` call comes from
#[derive(Debug, Clone)]
pub enum StoreSource {
    File(PathBuf),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub id: Option<String>,
    pub doc_type: DocumentType,
    pub tags: Vec<String>,
    pub related: Vec<String>,
}

/// What was stored, for CLI display
#[derive(Debug, Clone, Serialize)]
pub struct StoredSummary {
    pub id: String,
    pub doc_type: DocumentType,
    pub quality_score: f32,
    pub relocated: bool,
    pub language: Option<String>,
    pub tags: Vec<String>,
    pub relationships: Vec<String>,
    pub summary: String,
}

impl From<&Document> for StoredSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            doc_type: doc.metadata.doc_type,
            quality_score: doc.quality_score,
            relocated: doc.is_relocated(),
            language: doc.metadata.language.clone(),
            tags: doc.metadata.tags.iter().cloned().collect(),
            relationships: doc.metadata.relationships.iter().cloned().collect(),
            summary: doc.summary.clone(),
        }
    }
}

/// Store a single document
pub async fn cmd_store(
    memory: &Memory,
    source: StoreSource,
    options: StoreOptions,
) -> Result<StoredSummary> {
    let mut request = match source {
        StoreSource::File(path) => {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| Error::InvalidPath(format!("{}: {}", path.display(), e)))?;
            let canonical = path.canonicalize().unwrap_or(path);
            info!("Storing {}", canonical.display());
            StoreRequest::new(content, options.doc_type)
                .with_source_path(canonical.display().to_string())
        }
        StoreSource::Text(text) => StoreRequest::new(text, options.doc_type),
    };

    if request.content.trim().is_empty() {
        return Err(Error::Other("Refusing to store empty content".to_string()));
    }

    request.id = options.id;
    let request = request
        .with_tags(options.tags)
        .with_relationships(options.related);

    let stored = memory.store(request).await?;

    // Deferred edges live only in this process
    let report = memory.flush_relationships().await;
    if !report.is_clean() {
        warn!("Relationship sync incomplete: {:?}", report);
    }

    Ok(StoredSummary::from(&stored))
}

pub fn print_stored(summary: &StoredSummary) {
    println!("✓ Stored {} [{}]", summary.id, summary.doc_type);
    println!("  Quality: {:.2}", summary.quality_score);
    if let Some(language) = &summary.language {
        println!("  Language: {}", language);
    }
    if summary.relocated {
        println!("  Content relocated to blob storage");
    }
    if !summary.tags.is_empty() {
        println!("  Tags: {}", summary.tags.join(", "));
    }
    if !summary.relationships.is_empty() {
        println!("  Related: {}", summary.relationships.join(", "));
    }
    if !summary.summary.is_empty() {
        println!("\n{}", summary.summary);
    }
}
