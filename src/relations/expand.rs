use crate::error::Result;
use crate::rank::{HitOrigin, SearchHit};
use crate::store::DocumentStore;
use futures::future::join_all;
use std::collections::HashSet;
use tracing::debug;

/// Append documents referenced by the hits' relationships, one hop deep.
///
/// Hits are visited in order and each hit's related ids in order; an id is
/// fetched only if it is not already in the result set. Added documents are
/// not expanded further.
pub async fn expand_one_hop(
    store: &dyn DocumentStore,
    hits: Vec<SearchHit>,
) -> Result<Vec<SearchHit>> {
    let mut seen: HashSet<String> = hits.iter().map(|h| h.document.id.clone()).collect();
    let mut related = Vec::new();

    for hit in &hits {
        let wanted: Vec<&String> = hit
            .document
            .metadata
            .relationships
            .iter()
            .filter(|id| seen.insert((*id).clone()))
            .collect();
        if wanted.is_empty() {
            continue;
        }

        let fetched = join_all(wanted.iter().map(|id| store.get(id))).await;
        for (id, result) in wanted.into_iter().zip(fetched) {
            match result? {
                Some(document) => related.push(SearchHit {
                    document,
                    score: None,
                    origin: HitOrigin::Related {
                        from: hit.document.id.clone(),
                    },
                }),
                None => debug!("Related document {} of {} not found", id, hit.document.id),
            }
        }
    }

    debug!("Expanded {} hits with {} related documents", hits.len(), related.len());
    let mut expanded = hits;
    expanded.extend(related);
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::Ranker;
    use crate::store::test_support::{document, related};
    use crate::store::{DocumentType, MemoryStore};

    #[tokio::test]
    async fn test_expands_exactly_one_hop() {
        let store = MemoryStore::new();
        let docs = vec![
            related(document("a", DocumentType::Code, vec![1.0, 0.0], 0.5), &["b", "missing"]),
            related(document("b", DocumentType::Code, vec![0.0, 1.0], 0.5), &["c"]),
            document("c", DocumentType::Code, vec![0.0, 1.0], 0.5),
        ];
        for doc in docs {
            store.put(doc).await.unwrap();
        }

        let a = store.get("a").await.unwrap().unwrap();
        let hits = Ranker::new().rank(&[1.0, 0.0], vec![a], 10);
        let expanded = expand_one_hop(&store, hits).await.unwrap();

        let ids: Vec<_> = expanded.iter().map(|h| h.document.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(expanded[1].score, None);
        assert_eq!(
            expanded[1].origin,
            HitOrigin::Related {
                from: "a".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_does_not_duplicate_present_hits() {
        let store = MemoryStore::new();
        let a = related(document("a", DocumentType::Code, vec![1.0, 0.0], 0.5), &["b"]);
        let b = related(document("b", DocumentType::Code, vec![0.9, 0.1], 0.5), &["a"]);
        store.put(a.clone()).await.unwrap();
        store.put(b.clone()).await.unwrap();

        let hits = Ranker::new().rank(&[1.0, 0.0], vec![a, b], 10);
        let expanded = expand_one_hop(&store, hits).await.unwrap();
        assert_eq!(expanded.len(), 2);
        assert!(expanded.iter().all(|h| h.origin == HitOrigin::Ranked));
    }
}
