//! In-process document store
//!
//! Same semantics as the SQLite store: filters run against the JSON text
//! form of each document, and query results keep first-insertion order.

use super::{check_embedding, Document, DocumentQuery, DocumentStore, StoreStats};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    order: Vec<String>,
    documents: HashMap<String, Document>,
    dimension: Option<usize>,
}

/// Document store held entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn as_stored_json(document: &Document) -> Result<Value> {
    let text = serde_json::to_string(document)?;
    Ok(serde_json::from_str(&text)?)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put(&self, mut document: Document) -> Result<Document> {
        let mut inner = self.inner.write().await;
        check_embedding(inner.dimension, document.embedding.len())?;
        inner.dimension.get_or_insert(document.embedding.len());

        let now = Utc::now();
        let created_at = inner
            .documents
            .get(&document.id)
            .and_then(|existing| existing.created_at)
            .unwrap_or(now);
        document.created_at = Some(created_at);
        document.updated_at = Some(now);

        if !inner.documents.contains_key(&document.id) {
            inner.order.push(document.id.clone());
        }
        inner.documents.insert(document.id.clone(), document.clone());
        Ok(document)
    }

    async fn get(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.inner.read().await.documents.get(id).cloned())
    }

    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Document>> {
        query.validate()?;

        let inner = self.inner.read().await;
        let mut matched = Vec::new();
        for id in &inner.order {
            if matched.len() >= query.limit {
                break;
            }
            let Some(document) = inner.documents.get(id) else {
                continue;
            };
            if query.filters.is_empty() || query.matches(&as_stored_json(document)?) {
                matched.push(document.clone());
            }
        }
        Ok(matched)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let inner = self.inner.read().await;
        let mut stats = StoreStats {
            document_count: inner.documents.len(),
            dimension: inner.dimension,
            ..Default::default()
        };
        for document in inner.documents.values() {
            *stats
                .by_type
                .entry(document.metadata.doc_type.to_string())
                .or_insert(0) += 1;
            if document.content_ref.is_some() {
                stats.relocated_count += 1;
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::test_support::document;
    use crate::store::{DocumentType, Filter};

    #[tokio::test]
    async fn test_roundtrip_and_overwrite() {
        let store = MemoryStore::new();
        let first = store
            .put(document("a", DocumentType::Documentation, vec![0.1, 0.2], 0.4))
            .await
            .unwrap();

        let second = store
            .put(document("a", DocumentType::Documentation, vec![0.3, 0.4], 0.6))
            .await
            .unwrap();
        assert_eq!(first.created_at, second.created_at);

        let loaded = store.get("a").await.unwrap().unwrap();
        assert_eq!(loaded.quality_score, 0.6);
        assert_eq!(store.stats().await.unwrap().document_count, 1);
    }

    #[tokio::test]
    async fn test_query_matches_sqlite_semantics() {
        let store = MemoryStore::new();
        store.put(document("x", DocumentType::Code, vec![1.0], 0.72)).await.unwrap();
        store.put(document("y", DocumentType::Analysis, vec![1.0], 0.9)).await.unwrap();
        store.put(document("z", DocumentType::Code, vec![1.0], 0.1)).await.unwrap();

        let hits = store
            .query(
                &DocumentQuery::new(5)
                    .with(Filter::doc_type(DocumentType::Code))
                    .with(Filter::min_quality(0.72)),
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "x");
    }

    #[tokio::test]
    async fn test_rejects_mismatched_dimension() {
        let store = MemoryStore::new();
        store.put(document("a", DocumentType::Code, vec![1.0, 0.0], 0.5)).await.unwrap();
        let err = store
            .put(document("b", DocumentType::Code, vec![1.0], 0.5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 1 }));
    }
}
