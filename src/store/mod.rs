//! Document storage
//!
//! This module defines the document store contract and provides:
//! - The indexed document record
//! - Equality/range filters over dotted fields
//! - A SQLite-backed store and an in-process store
//! - Blob storage for oversized content

mod blob;
mod document;
mod filter;
mod in_memory;
mod schema;
mod sqlite;

pub use blob::*;
pub use document::*;
pub use filter::*;
pub use in_memory::*;
pub use schema::*;
pub use sqlite::*;

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persistence contract for indexed documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist the full record, overwriting any document with the same id.
    /// Returns the record as stored, with timestamps assigned.
    async fn put(&self, document: Document) -> Result<Document>;

    /// Fetch a document; `None` when the id is unknown
    async fn get(&self, id: &str) -> Result<Option<Document>>;

    /// Documents matching every filter, in insertion order, capped at `limit`
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Document>>;

    /// Counts and the fixed embedding dimension
    async fn stats(&self) -> Result<StoreStats>;
}

/// Store statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub document_count: usize,
    pub by_type: BTreeMap<String, usize>,
    pub relocated_count: usize,
    pub dimension: Option<usize>,
}

/// Enforce the single-dimension invariant for an incoming embedding
pub(crate) fn check_embedding(fixed: Option<usize>, actual: usize) -> Result<()> {
    if actual == 0 {
        return Err(Error::Embedding(
            "Refusing to store a document with an empty embedding".to_string(),
        ));
    }
    match fixed {
        Some(expected) if expected != actual => {
            Err(Error::DimensionMismatch { expected, actual })
        }
        _ => Ok(()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_embedding() {
        assert!(check_embedding(None, 3).is_ok());
        assert!(check_embedding(Some(3), 3).is_ok());
        assert!(matches!(
            check_embedding(Some(3), 4),
            Err(Error::DimensionMismatch { expected: 3, actual: 4 })
        ));
        assert!(matches!(check_embedding(None, 0), Err(Error::Embedding(_))));
    }
}
