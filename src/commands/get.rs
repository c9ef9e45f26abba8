//! Get command implementation

use crate::error::{Error, Result};
use crate::memory::Memory;
use crate::store::Document;

/// Fetch a document, optionally resolving relocated content
pub async fn cmd_get(memory: &Memory, id: &str, full: bool) -> Result<Document> {
    let document = if full {
        memory.get_with_content(id).await?
    } else {
        memory.get(id).await?
    };
    document.ok_or_else(|| Error::DocumentNotFound(id.to_string()))
}

pub fn print_document(doc: &Document) {
    let meta = &doc.metadata;
    println!("\n📄 {} [{}]\n", doc.id, meta.doc_type);
    if let Some(path) = &meta.source_path {
        println!("Source: {}", path);
    }
    if let Some(language) = &meta.language {
        match &meta.framework {
            Some(framework) => println!("Language: {} ({})", language, framework),
            None => println!("Language: {}", language),
        }
    }
    println!(
        "Quality: {:.2}  Complexity: {:.1}  Maintainability: {:.0}",
        doc.quality_score, meta.complexity, meta.maintainability
    );
    if let Some(updated) = doc.updated_at {
        println!("Updated: {}", updated.to_rfc3339());
    }
    if !meta.tags.is_empty() {
        println!("Tags: {}", meta.tags.iter().cloned().collect::<Vec<_>>().join(", "));
    }
    if !meta.relationships.is_empty() {
        println!(
            "Related: {}",
            meta.relationships.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }

    if !doc.summary.is_empty() {
        println!("\nSummary:\n  {}", doc.summary);
    }
    if !doc.insights.is_empty() {
        println!("\nInsights:");
        for insight in &doc.insights {
            println!("  • {}", insight);
        }
    }
    if !doc.patterns.is_empty() {
        println!("\nPatterns: {}", doc.patterns.join(", "));
    }

    println!("\n---\n{}", doc.content);
}
