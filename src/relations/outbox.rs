use crate::error::Result;
use crate::store::DocumentStore;
use serde::Serialize;
use std::collections::VecDeque;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// A pending reverse-edge write: add `source` to `target`'s relationships
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipEdge {
    pub target: String,
    pub source: String,
    pub attempts: u32,
}

/// Outcome of one drain pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub applied: usize,
    pub unchanged: usize,
    pub missing_target: usize,
    pub retried: usize,
    pub dropped: usize,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.retried == 0 && self.dropped == 0 && self.missing_target == 0
    }
}

enum EdgeResult {
    Applied,
    Unchanged,
    MissingTarget,
}

/// Queue of reverse-edge writes, delivered at least once.
///
/// Writes are get-modify-put with no compare-and-swap, so concurrent
/// updates to the same target can lose an edge.
pub struct RelationshipOutbox {
    queue: Mutex<VecDeque<RelationshipEdge>>,
    max_attempts: u32,
}

impl RelationshipOutbox {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Queue reverse edges from every target back to `source`
    pub async fn enqueue<'a>(&self, source: &str, targets: impl IntoIterator<Item = &'a String>) {
        let mut queue = self.queue.lock().await;
        for target in targets {
            if target == source {
                continue;
            }
            queue.push_back(RelationshipEdge {
                target: target.clone(),
                source: source.to_string(),
                attempts: 0,
            });
        }
    }

    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.queue.lock().await.is_empty()
    }

    /// Snapshot of queued edges
    pub async fn pending(&self) -> Vec<RelationshipEdge> {
        self.queue.lock().await.iter().cloned().collect()
    }

    /// Apply every queued edge once. Failed edges are re-queued until they
    /// reach the attempt limit.
    pub async fn drain(&self, store: &dyn DocumentStore) -> SyncReport {
        let batch: Vec<RelationshipEdge> = self.queue.lock().await.drain(..).collect();
        let mut report = SyncReport::default();
        let mut requeue = Vec::new();

        for mut edge in batch {
            match apply_edge(store, &edge).await {
                Ok(EdgeResult::Applied) => report.applied += 1,
                Ok(EdgeResult::Unchanged) => report.unchanged += 1,
                Ok(EdgeResult::MissingTarget) => {
                    warn!(
                        "Dropping relationship {} -> {}: target does not exist",
                        edge.target, edge.source
                    );
                    report.missing_target += 1;
                }
                Err(e) => {
                    edge.attempts += 1;
                    if edge.attempts >= self.max_attempts {
                        error!(
                            "Dropping relationship {} -> {} after {} attempts: {}",
                            edge.target, edge.source, edge.attempts, e
                        );
                        report.dropped += 1;
                    } else {
                        warn!(
                            "Relationship {} -> {} failed (attempt {}): {}",
                            edge.target, edge.source, edge.attempts, e
                        );
                        report.retried += 1;
                        requeue.push(edge);
                    }
                }
            }
        }

        if !requeue.is_empty() {
            self.queue.lock().await.extend(requeue);
        }

        debug!("Relationship sync: {:?}", report);
        report
    }
}

async fn apply_edge(store: &dyn DocumentStore, edge: &RelationshipEdge) -> Result<EdgeResult> {
    let Some(mut target) = store.get(&edge.target).await? else {
        return Ok(EdgeResult::MissingTarget);
    };
    if !target.metadata.relationships.insert(edge.source.clone()) {
        return Ok(EdgeResult::Unchanged);
    }
    store.put(target).await?;
    Ok(EdgeResult::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{document, FlakyStore};
    use crate::store::{DocumentType, MemoryStore};

    async fn seed(store: &dyn DocumentStore, ids: &[&str]) {
        for id in ids {
            store
                .put(document(id, DocumentType::Code, vec![1.0, 0.0], 0.5))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_drain_applies_reverse_edges() {
        let store = MemoryStore::new();
        seed(&store, &["a", "b"]).await;

        let outbox = RelationshipOutbox::new(5);
        let targets = vec!["b".to_string(), "a".to_string()];
        outbox.enqueue("a", &targets).await;
        assert_eq!(outbox.len().await, 1);

        let report = outbox.drain(&store).await;
        assert_eq!(report.applied, 1);
        assert!(outbox.is_empty().await);

        let b = store.get("b").await.unwrap().unwrap();
        assert!(b.metadata.relationships.contains("a"));

        outbox.enqueue("a", &targets).await;
        assert_eq!(outbox.drain(&store).await.unchanged, 1);
    }

    #[tokio::test]
    async fn test_missing_target_is_dropped() {
        let store = MemoryStore::new();
        let outbox = RelationshipOutbox::new(5);
        outbox.enqueue("a", &["ghost".to_string()]).await;

        let report = outbox.drain(&store).await;
        assert_eq!(report.missing_target, 1);
        assert!(!report.is_clean());
        assert!(outbox.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_edges_retry_then_drop() {
        let store = FlakyStore::default();
        seed(&store, &["b"]).await;
        store.fail_next_puts(10);

        let outbox = RelationshipOutbox::new(2);
        outbox.enqueue("a", &["b".to_string()]).await;

        let first = outbox.drain(&store).await;
        assert_eq!(first.retried, 1);
        assert_eq!(outbox.pending().await[0].attempts, 1);

        let second = outbox.drain(&store).await;
        assert_eq!(second.dropped, 1);
        assert!(outbox.is_empty().await);
    }

    #[tokio::test]
    async fn test_retry_eventually_succeeds() {
        let store = FlakyStore::default();
        seed(&store, &["b"]).await;
        store.fail_next_puts(1);

        let outbox = RelationshipOutbox::new(5);
        outbox.enqueue("a", &["b".to_string()]).await;

        assert_eq!(outbox.drain(&store).await.retried, 1);
        assert_eq!(outbox.drain(&store).await.applied, 1);
        let b = store.get("b").await.unwrap().unwrap();
        assert!(b.metadata.relationships.contains("a"));
    }
}
