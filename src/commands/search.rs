//! Search, similar and related command implementations

use crate::embed::truncate_chars;
use crate::error::Result;
use crate::memory::{Memory, SearchOptions};
use crate::rank::{HitOrigin, SearchHit};
use crate::store::DocumentType;
use serde::Serialize;
use tracing::info;

const PREVIEW_CHARS: usize = 200;

/// One result row for CLI display
#[derive(Debug, Clone, Serialize)]
pub struct HitSummary {
    pub id: String,
    pub doc_type: DocumentType,
    pub score: Option<f32>,
    pub origin: HitOrigin,
    pub quality_score: f32,
    pub source_path: Option<String>,
    pub summary: String,
    pub preview: String,
}

impl From<SearchHit> for HitSummary {
    fn from(hit: SearchHit) -> Self {
        let doc = hit.document;
        let preview = truncate_chars(doc.content.trim(), PREVIEW_CHARS).replace('\n', " ");
        Self {
            id: doc.id,
            doc_type: doc.metadata.doc_type,
            score: hit.score,
            origin: hit.origin,
            quality_score: doc.quality_score,
            source_path: doc.metadata.source_path,
            summary: doc.summary,
            preview,
        }
    }
}

/// Results of a search-like command
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    /// Query text, or the id results are relative to
    pub query: String,
    pub results: Vec<HitSummary>,
}

impl SearchReport {
    fn new(query: &str, hits: Vec<SearchHit>) -> Self {
        Self {
            query: query.to_string(),
            results: hits.into_iter().map(HitSummary::from).collect(),
        }
    }
}

/// Execute a search
pub async fn cmd_search(memory: &Memory, query: &str, options: SearchOptions) -> Result<SearchReport> {
    info!("Searching: {}", query);
    let hits = memory.search(query, options).await?;
    Ok(SearchReport::new(query, hits))
}

/// Documents similar to a stored document
pub async fn cmd_similar(memory: &Memory, id: &str, k: usize) -> Result<SearchReport> {
    let hits = memory.find_similar(id, k).await?;
    Ok(SearchReport::new(id, hits))
}

/// Documents directly linked to a stored document
pub async fn cmd_related(memory: &Memory, id: &str) -> Result<SearchReport> {
    let hits = memory.related(id).await?;
    Ok(SearchReport::new(id, hits))
}

/// Print results to console
pub fn print_search_report(title: &str, report: &SearchReport) {
    println!("\n🔍 {}: {}\n", title, report.query);

    if report.results.is_empty() {
        println!("No results.");
        return;
    }
    println!("Found {} results:\n", report.results.len());

    for (i, r) in report.results.iter().enumerate() {
        let label = match (&r.score, &r.origin) {
            (Some(score), _) => format!("score: {:.3}", score),
            (None, HitOrigin::Related { from }) => format!("related to {}", from),
            (None, HitOrigin::Ranked) => "unscored".to_string(),
        };
        println!("{}. [{}] {} ({})", i + 1, label, r.id, r.doc_type);

        if let Some(path) = &r.source_path {
            println!("   Source: {}", path);
        }
        if !r.summary.is_empty() {
            println!("   Summary: {}", truncate_chars(&r.summary, PREVIEW_CHARS));
        }
        println!("   {}\n", r.preview);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::document;

    #[test]
    fn test_preview_is_char_safe() {
        let mut doc = document("x", DocumentType::Documentation, vec![1.0], 0.5);
        doc.content = "ü".repeat(500);
        let summary = HitSummary::from(SearchHit {
            document: doc,
            score: Some(0.9),
            origin: HitOrigin::Ranked,
        });
        assert_eq!(summary.preview.chars().count(), PREVIEW_CHARS);
    }
}
