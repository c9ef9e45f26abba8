//! Semantic memory service
//!
//! `Memory` wires the store, blob store, embedder and optional generator
//! together. Every collaborator is injected, so the same service runs over
//! SQLite and the filesystem in the CLI and over in-memory doubles in tests.

use crate::analysis::{detect_framework, detect_language, AnalysisDefaults, Analyzer, QualityWeights};
use crate::config::{Config, RelationshipSync};
use crate::embed::{create_embedder, embed_one, truncate_chars, Embedder, EmbeddingMode};
use crate::error::{Error, Result};
use crate::generate::{create_generator, TextGenerator};
use crate::rank::{HitOrigin, Ranker, SearchHit};
use crate::relations::{expand_one_hop, RelationshipEdge, RelationshipOutbox, SyncReport};
use crate::store::{
    blob_key, content_hash, normalize_tag, placeholder, BlobStore, Document, DocumentMetadata,
    DocumentQuery, DocumentStore, DocumentType, Filter, FsBlobStore, SqliteStore, StoreStats,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Tunables for the memory service
#[derive(Debug, Clone)]
pub struct MemorySettings {
    pub content_threshold_chars: usize,
    pub fetch_cap: usize,
    pub max_input_chars: usize,
    pub max_prompt_chars: usize,
    pub default_k: usize,
    pub min_score: f32,
    pub expand_relationships: bool,
    pub relationship_sync: RelationshipSync,
    pub relationship_max_attempts: u32,
    pub quality: QualityWeights,
    pub analysis_defaults: AnalysisDefaults,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for MemorySettings {
    fn from(config: &Config) -> Self {
        Self {
            content_threshold_chars: config.store.content_threshold_chars,
            fetch_cap: config.store.fetch_cap,
            max_input_chars: config.embedding.max_input_chars,
            max_prompt_chars: config.generation.max_prompt_chars,
            default_k: config.search.default_k,
            min_score: config.search.min_score,
            expand_relationships: config.search.expand_relationships,
            relationship_sync: config.relationships.sync,
            relationship_max_attempts: config.relationships.max_attempts,
            quality: QualityWeights::from(&config.quality),
            analysis_defaults: AnalysisDefaults::from(&config.quality),
        }
    }
}

/// A document to store
#[derive(Debug, Clone)]
pub struct StoreRequest {
    /// Generated when absent
    pub id: Option<String>,
    pub content: String,
    pub doc_type: DocumentType,
    pub source_path: Option<String>,
    /// Detected from `source_path` when absent
    pub language: Option<String>,
    /// Detected from the content when absent
    pub framework: Option<String>,
    pub tags: Vec<String>,
    pub relationships: Vec<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl StoreRequest {
    pub fn new(content: impl Into<String>, doc_type: DocumentType) -> Self {
        Self {
            id: None,
            content: content.into(),
            doc_type,
            source_path: None,
            language: None,
            framework: None,
            tags: Vec::new(),
            relationships: Vec::new(),
            last_modified: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_source_path(mut self, path: impl Into<String>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_relationships(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.relationships.extend(ids.into_iter().map(Into::into));
        self
    }
}

/// Search options; unset fields fall back to the configured defaults
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub k: Option<usize>,
    pub doc_type: Option<DocumentType>,
    pub min_quality: Option<f32>,
    pub language: Option<String>,
    pub min_score: Option<f32>,
    pub expand: Option<bool>,
}

pub struct Memory {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    embedder: Arc<dyn Embedder>,
    analyzer: Analyzer,
    outbox: RelationshipOutbox,
    ranker: Ranker,
    settings: MemorySettings,
}

impl Memory {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        embedder: Arc<dyn Embedder>,
        generator: Option<Arc<dyn TextGenerator>>,
        settings: MemorySettings,
    ) -> Self {
        Self {
            store,
            blobs,
            embedder,
            analyzer: Analyzer::new(generator, settings.max_prompt_chars),
            outbox: RelationshipOutbox::new(settings.relationship_max_attempts),
            ranker: Ranker::new(),
            settings,
        }
    }

    /// Open the SQLite store and blob directory named by the config
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = SqliteStore::connect(config).await?;
        let blobs = FsBlobStore::new(&config.paths.blob_dir)?;
        let embedder: Arc<dyn Embedder> = Arc::from(create_embedder(&config.embedding)?);
        let generator: Option<Arc<dyn TextGenerator>> =
            create_generator(&config.generation)?.map(Arc::from);

        Ok(Self::new(
            Arc::new(store),
            Arc::new(blobs),
            embedder,
            generator,
            MemorySettings::from(config),
        ))
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Analyze, score, embed and persist a document
    pub async fn store(&self, request: StoreRequest) -> Result<Document> {
        let id = request
            .id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let language = request.language.or_else(|| {
            request
                .source_path
                .as_deref()
                .and_then(|p| detect_language(std::path::Path::new(p)))
                .map(str::to_string)
        });
        let framework = request
            .framework
            .or_else(|| detect_framework(&request.content).map(str::to_string));

        let outcome = self
            .analyzer
            .analyze(&request.content, request.doc_type, language.as_deref())
            .await?;
        let analysis = outcome.effective(self.settings.analysis_defaults);
        let quality_score = self
            .settings
            .quality
            .score(&analysis, self.settings.analysis_defaults);

        let tags: BTreeSet<String> = request
            .tags
            .iter()
            .chain(analysis.tags.iter())
            .filter_map(|t| normalize_tag(t))
            .collect();
        let relationships: BTreeSet<String> = request
            .relationships
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty() && *r != id)
            .collect();

        let input = embedding_input(&request.content, &analysis.summary, &tags);
        let embedding = embed_one(
            self.embedder.as_ref(),
            truncate_chars(&input, self.settings.max_input_chars),
            EmbeddingMode::Document,
        )
        .await?;

        let hash = content_hash(&request.content);
        let (content, content_ref) = self.spill_if_oversized(&id, request.content).await?;

        let metadata = DocumentMetadata {
            doc_type: request.doc_type,
            source_path: request.source_path,
            language,
            framework,
            complexity: finite_or(analysis.complexity, self.settings.analysis_defaults.complexity),
            maintainability: finite_or(
                analysis.maintainability,
                self.settings.analysis_defaults.maintainability,
            ),
            last_modified: request.last_modified.unwrap_or_else(Utc::now),
            tags,
            relationships,
        };

        let stored = self
            .store
            .put(Document {
                id,
                content,
                content_ref,
                content_hash: hash,
                embedding,
                metadata,
                summary: analysis.summary,
                insights: analysis.insights,
                patterns: analysis.patterns,
                quality_score,
                created_at: None,
                updated_at: None,
            })
            .await?;

        info!(
            "Stored {} document {} (quality {:.2}{})",
            stored.metadata.doc_type,
            stored.id,
            stored.quality_score,
            if stored.is_relocated() { ", relocated" } else { "" }
        );

        self.outbox
            .enqueue(&stored.id, &stored.metadata.relationships)
            .await;
        if self.settings.relationship_sync == RelationshipSync::Inline {
            let report = self.outbox.drain(self.store.as_ref()).await;
            if !report.is_clean() {
                warn!(
                    "Relationship sync for {} incomplete: {:?}",
                    stored.id, report
                );
            }
        }

        Ok(stored)
    }

    /// Move content above the threshold to blob storage
    async fn spill_if_oversized(
        &self,
        id: &str,
        content: String,
    ) -> Result<(String, Option<String>)> {
        let chars = content.chars().count();
        if chars <= self.settings.content_threshold_chars {
            return Ok((content, None));
        }

        let key = blob_key(id);
        debug!("Relocating {} chars of {} to blob {}", chars, id, key);
        self.blobs.put(&key, content.into_bytes()).await?;
        Ok((placeholder(&key, chars), Some(key)))
    }

    pub async fn get(&self, id: &str) -> Result<Option<Document>> {
        self.store.get(id).await
    }

    /// Fetch a document with relocated content resolved
    pub async fn get_with_content(&self, id: &str) -> Result<Option<Document>> {
        let Some(mut document) = self.store.get(id).await? else {
            return Ok(None);
        };
        if document.is_relocated() {
            document.content = self.load_content(&document).await?;
        }
        Ok(Some(document))
    }

    /// The full content of a document, reading blob storage when relocated
    pub async fn load_content(&self, document: &Document) -> Result<String> {
        let Some(key) = &document.content_ref else {
            return Ok(document.content.clone());
        };
        let bytes = self
            .blobs
            .get(key)
            .await?
            .ok_or_else(|| Error::Blob(format!("Blob '{}' for {} is missing", key, document.id)))?;
        String::from_utf8(bytes)
            .map_err(|e| Error::Blob(format!("Blob '{}' is not valid UTF-8: {}", key, e)))
    }

    /// Rank stored documents against a query
    pub async fn search(&self, query: &str, options: SearchOptions) -> Result<Vec<SearchHit>> {
        let k = options.k.unwrap_or(self.settings.default_k);
        let min_score = options.min_score.unwrap_or(self.settings.min_score);
        let expand = options.expand.unwrap_or(self.settings.expand_relationships);

        let vector = embed_one(self.embedder.as_ref(), query, EmbeddingMode::Query).await?;

        let mut filters = DocumentQuery::new(self.settings.fetch_cap);
        if let Some(doc_type) = options.doc_type {
            filters = filters.with(Filter::doc_type(doc_type));
        }
        if let Some(min_quality) = options.min_quality {
            filters = filters.with(Filter::min_quality(min_quality));
        }
        if let Some(language) = options.language {
            filters = filters.with(Filter::eq("metadata.language", language));
        }

        let candidates = self.store.query(&filters).await?;
        if candidates.len() >= self.settings.fetch_cap {
            warn!(
                "Search candidates hit the fetch cap of {}; the most recently added documents were not considered",
                self.settings.fetch_cap
            );
        }

        let total = candidates.len();
        let ranked = self.ranker.rank(&vector, candidates, total);
        let mut hits = self.ranker.filter_by_score(ranked, min_score);
        hits.truncate(k);

        if expand {
            hits = expand_one_hop(self.store.as_ref(), hits).await?;
        }

        info!("Search returned {} results from {} candidates", hits.len(), total);
        Ok(hits)
    }

    /// Documents most similar to a stored document, excluding itself
    pub async fn find_similar(&self, id: &str, k: usize) -> Result<Vec<SearchHit>> {
        let source = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::DocumentNotFound(id.to_string()))?;

        let candidates: Vec<Document> = self
            .store
            .query(&DocumentQuery::new(self.settings.fetch_cap))
            .await?
            .into_iter()
            .filter(|d| d.id != source.id)
            .collect();

        Ok(self.ranker.rank(&source.embedding, candidates, k))
    }

    /// The documents a stored document links to
    pub async fn related(&self, id: &str) -> Result<Vec<SearchHit>> {
        let document = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::DocumentNotFound(id.to_string()))?;

        let seed = SearchHit {
            document,
            score: None,
            origin: HitOrigin::Ranked,
        };
        let mut expanded = expand_one_hop(self.store.as_ref(), vec![seed]).await?;
        expanded.remove(0);
        Ok(expanded)
    }

    /// Apply queued reverse-edge writes
    pub async fn flush_relationships(&self) -> SyncReport {
        self.outbox.drain(self.store.as_ref()).await
    }

    pub async fn pending_relationships(&self) -> Vec<RelationshipEdge> {
        self.outbox.pending().await
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        self.store.stats().await
    }
}

/// Non-finite numbers serialise to `null` and could not be read back
fn finite_or(value: Option<f32>, default: f32) -> f32 {
    value.filter(|v| v.is_finite()).unwrap_or(default)
}

/// Text embedded for a document: its content enriched with the summary and tags
fn embedding_input(content: &str, summary: &str, tags: &BTreeSet<String>) -> String {
    let mut input = content.to_string();
    if !summary.is_empty() {
        input.push_str("\n\nSummary: ");
        input.push_str(summary);
    }
    if !tags.is_empty() {
        input.push_str("\n\nTags: ");
        input.push_str(&tags.iter().cloned().collect::<Vec<_>>().join(", "));
    }
    input
}
