//! Similarity ranking of candidate documents

use crate::store::Document;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::{debug, warn};

/// How a hit entered the result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HitOrigin {
    Ranked,
    /// Pulled in by a relationship of the document `from`
    Related { from: String },
}

/// A search result
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub document: Document,
    /// Cosine similarity; `None` for related documents
    pub score: Option<f32>,
    pub origin: HitOrigin,
}

/// Cosine similarity of two vectors.
///
/// Returns `None` when the lengths differ or either vector is empty, and
/// `0.0` when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(0.0);
    }
    Some((dot / (norm_a.sqrt() * norm_b.sqrt())) as f32)
}

/// Scores candidates against a query vector
#[derive(Debug, Clone, Copy, Default)]
pub struct Ranker;

impl Ranker {
    pub fn new() -> Self {
        Self
    }

    /// Top `k` candidates by descending similarity. Ties keep input order.
    pub fn rank(&self, query: &[f32], candidates: Vec<Document>, k: usize) -> Vec<SearchHit> {
        let total = candidates.len();
        let mut hits: Vec<SearchHit> = candidates
            .into_iter()
            .filter_map(|document| match cosine_similarity(query, &document.embedding) {
                Some(score) => Some(SearchHit {
                    document,
                    score: Some(score),
                    origin: HitOrigin::Ranked,
                }),
                None => {
                    warn!(
                        "Skipping document {}: embedding has {} dimensions, query has {}",
                        document.id,
                        document.embedding.len(),
                        query.len()
                    );
                    None
                }
            })
            .collect();

        // sort_by is stable
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
        });
        hits.truncate(k);

        debug!("Ranked {} of {} candidates", hits.len(), total);
        hits
    }

    /// Drop scored hits below `min_score`; unscored hits are kept
    pub fn filter_by_score(&self, hits: Vec<SearchHit>, min_score: f32) -> Vec<SearchHit> {
        hits.into_iter()
            .filter(|h| h.score.map_or(true, |s| s >= min_score))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::document;
    use crate::store::DocumentType;

    #[test]
    fn test_cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap() - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap().abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).unwrap() + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), Some(0.0));
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[], &[]), None);
    }

    #[test]
    fn test_cosine_is_symmetric() {
        let vectors: [&[f32]; 4] = [
            &[0.3, -1.2, 2.5],
            &[-4.0, 0.5, 0.25],
            &[1.0, 1.0, -7.5],
            &[0.01, -0.02, 0.9],
        ];
        for a in vectors {
            for b in vectors {
                let ab = cosine_similarity(a, b).unwrap();
                let ba = cosine_similarity(b, a).unwrap();
                assert_eq!(ab, ba);
            }
        }
    }

    #[test]
    fn test_cosine_is_scale_invariant() {
        let a = cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 1.0, 0.5]).unwrap();
        let b = cosine_similarity(&[10.0, 20.0, 30.0], &[2.0, 1.0, 0.5]).unwrap();
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_rank_orders_and_truncates() {
        let candidates = vec![
            document("far", DocumentType::Code, vec![0.0, 1.0], 0.5),
            document("near", DocumentType::Code, vec![1.0, 0.1], 0.5),
            document("mid", DocumentType::Code, vec![1.0, 1.0], 0.5),
        ];
        let hits = Ranker::new().rank(&[1.0, 0.0], candidates, 2);
        let ids: Vec<_> = hits.iter().map(|h| h.document.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid"]);
        assert!(hits.iter().all(|h| h.origin == HitOrigin::Ranked));
    }

    #[test]
    fn test_rank_ties_keep_fetch_order() {
        let candidates = vec![
            document("first", DocumentType::Code, vec![1.0, 0.0], 0.5),
            document("second", DocumentType::Code, vec![2.0, 0.0], 0.5),
            document("third", DocumentType::Code, vec![3.0, 0.0], 0.5),
        ];
        let hits = Ranker::new().rank(&[1.0, 0.0], candidates, 10);
        let ids: Vec<_> = hits.iter().map(|h| h.document.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_rank_skips_dimension_mismatch() {
        let candidates = vec![
            document("bad", DocumentType::Code, vec![1.0, 0.0, 0.0], 0.5),
            document("good", DocumentType::Code, vec![1.0, 0.0], 0.5),
        ];
        let hits = Ranker::new().rank(&[1.0, 0.0], candidates, 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.id, "good");
    }

    #[test]
    fn test_filter_by_score() {
        let candidates = vec![
            document("a", DocumentType::Code, vec![1.0, 0.0], 0.5),
            document("b", DocumentType::Code, vec![0.0, 1.0], 0.5),
        ];
        let ranker = Ranker::new();
        let hits = ranker.rank(&[1.0, 0.0], candidates, 10);
        let kept = ranker.filter_by_score(hits, 0.5);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].document.id, "a");
    }
}
