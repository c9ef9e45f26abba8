//! Index command implementation

use crate::analysis::{detect_language, is_binary_content, should_skip_file};
use crate::error::{Error, Result};
use crate::memory::{Memory, StoreRequest};
use crate::progress::{advance_progress, finish_progress, start_progress_bar};
use crate::relations::SyncReport;
use crate::store::{content_hash, normalize_tag, DocumentType};
use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    /// Type for every file; inferred per file when unset
    pub doc_type: Option<DocumentType>,
    pub tags: Vec<String>,
}

/// Index statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStats {
    pub files_found: usize,
    pub stored: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub relocated: usize,
    pub errors: Vec<String>,
    pub relationships: SyncReport,
}

enum FileOutcome {
    Stored { relocated: bool },
    Unchanged,
    Skipped,
}

/// Stable document id for a file path
pub fn document_id_for(path: &Path) -> String {
    let key = format!("file://{}", path.display());
    Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes()).to_string()
}

/// Guess a document type from a path relative to the indexed root
pub fn infer_doc_type(path: &Path) -> DocumentType {
    match detect_language(path) {
        Some("markdown") | Some("html") | None => {}
        Some(_) => return DocumentType::Code,
    }
    let lower = path.display().to_string().to_lowercase();
    if ["architecture", "adr/", "design"].iter().any(|m| lower.contains(m)) {
        DocumentType::Architecture
    } else {
        DocumentType::Documentation
    }
}

/// Index every text file under a directory
pub async fn cmd_index(memory: &Memory, root: &Path, options: IndexOptions) -> Result<IndexStats> {
    let canonical_root = root
        .canonicalize()
        .map_err(|e| Error::InvalidPath(format!("{}: {}", root.display(), e)))?;
    info!("Indexing directory: {}", canonical_root.display());

    let mut stats = IndexStats::default();

    let mut files: Vec<PathBuf> = Vec::new();
    let walker = WalkBuilder::new(&canonical_root)
        .hidden(true)
        .git_ignore(true)
        .git_exclude(true)
        .build();

    for entry in walker {
        match entry {
            Ok(e) if e.file_type().map(|t| t.is_file()).unwrap_or(false) => {
                stats.files_found += 1;
                let path = e.path().to_path_buf();
                if should_skip_file(&path) {
                    stats.skipped += 1;
                } else {
                    files.push(path);
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Walk error: {}", e);
                stats.errors.push(e.to_string());
            }
        }
    }

    info!("Found {} files to index", files.len());
    let progress = start_progress_bar(files.len(), "Indexing files");

    for path in files {
        let relative = path.strip_prefix(&canonical_root).unwrap_or(&path);
        let doc_type = options.doc_type.unwrap_or_else(|| infer_doc_type(relative));
        let display = relative.display().to_string();

        match index_file(memory, &path, doc_type, &options.tags).await {
            Ok(FileOutcome::Stored { relocated }) => {
                stats.stored += 1;
                if relocated {
                    stats.relocated += 1;
                }
            }
            Ok(FileOutcome::Unchanged) => stats.unchanged += 1,
            Ok(FileOutcome::Skipped) => stats.skipped += 1,
            Err(e) => {
                let error_msg = format!("{}: {}", path.display(), e);
                warn!("{}", error_msg);
                stats.errors.push(error_msg);
            }
        }

        advance_progress(&progress, &display);
    }

    finish_progress(progress, "Files indexed");

    stats.relationships = memory.flush_relationships().await;

    info!(
        "Indexing complete: {} stored, {} unchanged, {} skipped, {} errors",
        stats.stored,
        stats.unchanged,
        stats.skipped,
        stats.errors.len()
    );

    Ok(stats)
}

async fn index_file(
    memory: &Memory,
    path: &Path,
    doc_type: DocumentType,
    tags: &[String],
) -> Result<FileOutcome> {
    let bytes = tokio::fs::read(path).await?;
    if is_binary_content(&bytes) {
        debug!("Skipping binary file: {}", path.display());
        return Ok(FileOutcome::Skipped);
    }
    let Ok(text) = String::from_utf8(bytes) else {
        debug!("Skipping non-UTF-8 file: {}", path.display());
        return Ok(FileOutcome::Skipped);
    };
    if text.trim().is_empty() {
        return Ok(FileOutcome::Skipped);
    }

    let id = document_id_for(path);
    if let Some(existing) = memory.get(&id).await? {
        let same_tags = tags
            .iter()
            .filter_map(|t| normalize_tag(t))
            .all(|t| existing.metadata.tags.contains(&t));
        if existing.content_hash == content_hash(&text)
            && existing.metadata.doc_type == doc_type
            && same_tags
        {
            debug!("File unchanged: {}", path.display());
            return Ok(FileOutcome::Unchanged);
        }
    }

    let mut request = StoreRequest::new(text, doc_type)
        .with_id(id)
        .with_source_path(path.display().to_string())
        .with_tags(tags.iter().cloned());
    request.last_modified = tokio::fs::metadata(path)
        .await
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from);

    let stored = memory.store(request).await?;
    Ok(FileOutcome::Stored {
        relocated: stored.is_relocated(),
    })
}

pub fn print_index_stats(stats: &IndexStats) {
    println!("\n✓ Indexing complete\n");
    println!("  Files found: {}", stats.files_found);
    println!("  Stored: {}", stats.stored);
    println!("  Unchanged: {}", stats.unchanged);
    println!("  Skipped: {}", stats.skipped);
    if stats.relocated > 0 {
        println!("  Relocated to blob storage: {}", stats.relocated);
    }
    if !stats.errors.is_empty() {
        println!("\n  Errors ({}):", stats.errors.len());
        for error in stats.errors.iter().take(10) {
            println!("    {}", error);
        }
        if stats.errors.len() > 10 {
            println!("    ... and {} more", stats.errors.len() - 10);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::{Embedder, EmbeddingMode};
    use crate::memory::MemorySettings;
    use crate::store::{MemoryBlobStore, MemoryStore};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct LengthEmbedder;

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed(&self, texts: Vec<String>, _mode: EmbeddingMode) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "length"
        }
    }

    fn memory() -> Memory {
        Memory::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(LengthEmbedder),
            None,
            MemorySettings::default(),
        )
    }

    #[test]
    fn test_document_id_is_stable() {
        let a = document_id_for(Path::new("/repo/src/lib.rs"));
        assert_eq!(a, document_id_for(Path::new("/repo/src/lib.rs")));
        assert_ne!(a, document_id_for(Path::new("/repo/src/main.rs")));
    }

    #[test]
    fn test_infer_doc_type() {
        assert_eq!(infer_doc_type(Path::new("src/booking.rs")), DocumentType::Code);
        assert_eq!(infer_doc_type(Path::new("README.md")), DocumentType::Documentation);
        assert_eq!(
            infer_doc_type(Path::new("docs/architecture/overview.md")),
            DocumentType::Architecture
        );
        assert_eq!(infer_doc_type(Path::new("docs/adr/0001-blobs.md")), DocumentType::Architecture);
        assert_eq!(infer_doc_type(Path::new("src/design_tokens.ts")), DocumentType::Code);
        assert_eq!(infer_doc_type(Path::new("LICENSE")), DocumentType::Documentation);
    }

    #[tokio::test]
    async fn test_index_directory_and_reindex() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("src")).unwrap();
        std::fs::write(tmp.path().join("src/quote.rs"), "fn quote() -> u32 { 42 }").unwrap();
        std::fs::write(tmp.path().join("README.md"), "# Quotes\nHow pricing works.").unwrap();
        std::fs::write(tmp.path().join("logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
        std::fs::write(tmp.path().join("data.dat"), b"abc\0def").unwrap();
        std::fs::write(tmp.path().join("empty.txt"), "   ").unwrap();

        let memory = memory();
        let stats = cmd_index(&memory, tmp.path(), IndexOptions::default())
            .await
            .unwrap();
        assert_eq!(stats.files_found, 5);
        assert_eq!(stats.stored, 2);
        assert_eq!(stats.skipped, 3);
        assert!(stats.errors.is_empty());

        let code_path = tmp.path().join("src/quote.rs").canonicalize().unwrap();
        let doc = memory
            .get(&document_id_for(&code_path))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.metadata.doc_type, DocumentType::Code);
        assert_eq!(doc.metadata.language.as_deref(), Some("rust"));

        let again = cmd_index(&memory, tmp.path(), IndexOptions::default())
            .await
            .unwrap();
        assert_eq!(again.stored, 0);
        assert_eq!(again.unchanged, 2);
    }

    #[tokio::test]
    async fn test_reindex_applies_new_type_and_tags() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("notes.md"), "Roofing crews start at 7am.").unwrap();

        let memory = memory();
        cmd_index(&memory, tmp.path(), IndexOptions::default())
            .await
            .unwrap();

        let retyped = IndexOptions {
            doc_type: Some(DocumentType::Conversation),
            tags: vec!["Roofing".to_string()],
        };
        let stats = cmd_index(&memory, tmp.path(), retyped.clone()).await.unwrap();
        assert_eq!(stats.stored, 1);
        assert_eq!(stats.unchanged, 0);

        let path = tmp.path().join("notes.md").canonicalize().unwrap();
        let doc = memory.get(&document_id_for(&path)).await.unwrap().unwrap();
        assert_eq!(doc.metadata.doc_type, DocumentType::Conversation);
        assert!(doc.metadata.tags.contains("roofing"));

        let again = cmd_index(&memory, tmp.path(), retyped).await.unwrap();
        assert_eq!(again.unchanged, 1);
    }

    #[tokio::test]
    async fn test_missing_directory_is_invalid_path() {
        let memory = memory();
        let result = cmd_index(
            &memory,
            Path::new("/definitely/not/here"),
            IndexOptions::default(),
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidPath(_))));
    }
}
