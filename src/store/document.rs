//! Indexed document records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::Error;

/// Category of a stored document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Code,
    Documentation,
    Architecture,
    Conversation,
    Analysis,
}

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        DocumentType::Code,
        DocumentType::Documentation,
        DocumentType::Architecture,
        DocumentType::Conversation,
        DocumentType::Analysis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Code => "code",
            DocumentType::Documentation => "documentation",
            DocumentType::Architecture => "architecture",
            DocumentType::Conversation => "conversation",
            DocumentType::Analysis => "analysis",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.to_lowercase().as_str() {
            "code" => Ok(DocumentType::Code),
            "documentation" | "docs" => Ok(DocumentType::Documentation),
            "architecture" => Ok(DocumentType::Architecture),
            "conversation" => Ok(DocumentType::Conversation),
            "analysis" => Ok(DocumentType::Analysis),
            _ => Err(Error::Config(format!("Unknown document type: {}", s))),
        }
    }
}

/// Descriptive metadata stored with each document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(rename = "type")]
    pub doc_type: DocumentType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,

    /// Estimated complexity on the analysis scale (0-10)
    #[serde(default)]
    pub complexity: f32,

    /// Estimated maintainability on the analysis scale (0-100)
    #[serde(default)]
    pub maintainability: f32,

    pub last_modified: DateTime<Utc>,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Ids of related documents
    #[serde(default)]
    pub relationships: BTreeSet<String>,
}

impl DocumentMetadata {
    pub fn new(doc_type: DocumentType) -> Self {
        Self {
            doc_type,
            source_path: None,
            language: None,
            framework: None,
            complexity: 0.0,
            maintainability: 0.0,
            last_modified: Utc::now(),
            tags: BTreeSet::new(),
            relationships: BTreeSet::new(),
        }
    }
}

/// A stored document with its embedding and derived analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,

    /// Full text, or a blob placeholder when the text was relocated
    pub content: String,

    /// Blob key holding the full text when relocated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_ref: Option<String>,

    /// blake3 of the full original content
    pub content_hash: String,

    pub embedding: Vec<f32>,

    pub metadata: DocumentMetadata,

    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub insights: Vec<String>,

    #[serde(default)]
    pub patterns: Vec<String>,

    pub quality_score: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Whether the full content lives in blob storage
    pub fn is_relocated(&self) -> bool {
        self.content_ref.is_some()
    }
}

/// Hash document content the same way everywhere
pub fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

/// Normalize a tag: trimmed and lower-cased, `None` when empty
pub fn normalize_tag(tag: &str) -> Option<String> {
    let tag = tag.trim().to_lowercase();
    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_type_roundtrip() {
        for ty in DocumentType::ALL {
            assert_eq!(ty.as_str().parse::<DocumentType>().unwrap(), ty);
        }
        assert!("spreadsheet".parse::<DocumentType>().is_err());
    }

    #[test]
    fn test_metadata_serializes_type_key() {
        let meta = DocumentMetadata::new(DocumentType::Architecture);
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["type"], "architecture");
        assert!(value.get("source_path").is_none());
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("  Booking "), Some("booking".to_string()));
        assert_eq!(normalize_tag("   "), None);
    }
}
