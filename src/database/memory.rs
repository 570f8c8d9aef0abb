//! Brute-force in-memory vector store.
//!
//! Nothing is persisted; used by tests and ephemeral setups.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::{CollectionSpec, SearchHit, VectorRecord, VectorStore};
use crate::{RagError, Result};

struct Collection {
    spec: CollectionSpec,
    records: Vec<VectorRecord>,
}

#[derive(Default)]
pub struct MemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryVectorStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record of a collection, in insertion order
    #[inline]
    pub async fn records(&self, collection: &str) -> Vec<VectorRecord> {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.records.clone())
            .unwrap_or_default()
    }
}

fn missing(collection: &str) -> RagError {
    RagError::Database(format!("Collection '{}' does not exist", collection))
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<()> {
        let mut collections = self.collections.write().await;

        if let Some(existing) = collections.get(&spec.name) {
            if existing.spec.dimension != spec.dimension {
                return Err(RagError::Database(format!(
                    "Collection '{}' has dimension {}, requested {}",
                    spec.name, existing.spec.dimension, spec.dimension
                )));
            }
            return Ok(());
        }

        debug!(
            "Creating in-memory collection '{}' ({} dims, {:?})",
            spec.name, spec.dimension, spec.distance
        );
        collections.insert(
            spec.name.clone(),
            Collection {
                spec: spec.clone(),
                records: Vec::new(),
            },
        );
        Ok(())
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| missing(collection))?;

        if let Some(bad) = records
            .iter()
            .find(|r| r.vector.len() != target.spec.dimension)
        {
            return Err(RagError::Database(format!(
                "Vector has {} dimensions, collection '{}' expects {}",
                bad.vector.len(),
                collection,
                target.spec.dimension
            )));
        }

        debug!("Upserted {} records into '{}'", records.len(), collection);
        target.records.extend(records);
        Ok(())
    }

    async fn similarity_search(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<SearchHit>> {
        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| missing(collection))?;
        let metric = target.spec.distance;

        let mut scored: Vec<(f32, &VectorRecord)> = target
            .records
            .iter()
            .map(|r| (metric.distance(query, &r.vector), r))
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(distance, r)| SearchHit {
                text: r.text.clone(),
                origin: r.origin.clone(),
                section: r.section.clone(),
                position: r.position,
                distance,
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|c| c.records.len())
            .ok_or_else(|| missing(collection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DistanceMetric;

    fn spec(dimension: usize) -> CollectionSpec {
        CollectionSpec {
            name: "docs".to_string(),
            dimension,
            distance: DistanceMetric::L2,
        }
    }

    fn record(text: &str, vector: Vec<f32>) -> VectorRecord {
        VectorRecord {
            id: uuid::Uuid::new_v4().to_string(),
            vector,
            text: text.to_string(),
            origin: "test.txt".to_string(),
            section: None,
            position: 0,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn upsert_requires_collection() {
        let store = MemoryVectorStore::new();
        let result = store.upsert("docs", vec![record("a", vec![1.0, 0.0])]).await;
        assert!(matches!(result, Err(RagError::Database(_))));
    }

    #[tokio::test]
    async fn ensure_collection_is_idempotent() {
        let store = MemoryVectorStore::new();
        store.ensure_collection(&spec(2)).await.expect("create");
        store
            .upsert("docs", vec![record("a", vec![1.0, 0.0])])
            .await
            .expect("upsert");
        store.ensure_collection(&spec(2)).await.expect("re-ensure");

        assert_eq!(store.count("docs").await.expect("count"), 1);
        assert!(store.ensure_collection(&spec(3)).await.is_err());
    }

    #[tokio::test]
    async fn search_orders_by_distance() {
        let store = MemoryVectorStore::new();
        store.ensure_collection(&spec(2)).await.expect("create");
        store
            .upsert(
                "docs",
                vec![
                    record("far", vec![10.0, 10.0]),
                    record("near", vec![1.0, 1.0]),
                    record("middle", vec![3.0, 3.0]),
                ],
            )
            .await
            .expect("upsert");

        let hits = store
            .similarity_search("docs", &[0.0, 0.0], 2)
            .await
            .expect("search");

        let texts: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["near", "middle"]);
        assert!(hits[0].distance < hits[1].distance);
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() {
        let store = MemoryVectorStore::new();
        store.ensure_collection(&spec(2)).await.expect("create");

        let result = store
            .upsert("docs", vec![record("bad", vec![1.0, 2.0, 3.0])])
            .await;
        assert!(result.is_err());
        assert_eq!(store.count("docs").await.expect("count"), 0);
    }
}
