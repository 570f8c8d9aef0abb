
use arrow::array::RecordBatchIterator;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::{
    Connection, DistanceType,
    query::{ExecutableQuery, QueryBase},
};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{batch_to_hits, collection_schema, records_to_batch, schema_dimension};
use crate::config::Config;
use crate::database::{CollectionSpec, DistanceMetric, SearchHit, VectorRecord, VectorStore};
use crate::{RagError, Result};

/// LanceDB-backed collections, one table per collection
pub struct LanceVectorStore {
    connection: Connection,
    /// Metric and width of every collection ensured by this process
    collections: RwLock<HashMap<String, CollectionSpec>>,
}

impl DistanceMetric {
    fn to_lance(self) -> DistanceType {
        match self {
            Self::Cosine => DistanceType::Cosine,
            Self::L2 => DistanceType::L2,
            Self::Dot => DistanceType::Dot,
        }
    }
}

impl LanceVectorStore {
    /// Open the vector database under the configured base directory
    #[inline]
    pub async fn open(config: &Config) -> Result<Self> {
        Self::connect(&config.vector_database_path()).await
    }

    /// Connect to (or create) a LanceDB database directory
    #[inline]
    pub async fn connect(db_path: &Path) -> Result<Self> {
        debug!("Initializing LanceDB at path: {:?}", db_path);

        std::fs::create_dir_all(db_path).map_err(|e| {
            RagError::Database(format!("Failed to create vector database directory: {}", e))
        })?;

        let uri = format!("file://{}", db_path.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        info!("Vector store opened at {}", db_path.display());
        Ok(Self {
            connection,
            collections: RwLock::new(HashMap::new()),
        })
    }

    async fn open_table(&self, name: &str) -> Result<lancedb::Table> {
        self.connection
            .open_table(name)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to open collection '{}': {}", name, e)))
    }

    /// Width and metric of a collection; tables created by another process
    /// fall back to their schema width and the L2 metric
    async fn spec_for(&self, name: &str, table: &lancedb::Table) -> Result<CollectionSpec> {
        if let Some(spec) = self.collections.read().await.get(name) {
            return Ok(spec.clone());
        }

        let schema = table
            .schema()
            .await
            .map_err(|e| RagError::Database(format!("Failed to get table schema: {}", e)))?;
        let dimension = schema_dimension(&schema).ok_or_else(|| {
            RagError::Database("Could not find vector column or determine dimension".to_string())
        })?;

        Ok(CollectionSpec {
            name: name.to_string(),
            dimension,
            distance: DistanceMetric::default(),
        })
    }
}

#[async_trait]
impl VectorStore for LanceVectorStore {
    async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<()> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to list tables: {}", e)))?;

        if table_names.contains(&spec.name) {
            let table = self.open_table(&spec.name).await?;
            let existing = self.spec_for(&spec.name, &table).await?;
            if existing.dimension != spec.dimension {
                return Err(RagError::Database(format!(
                    "Collection '{}' has dimension {}, requested {}",
                    spec.name, existing.dimension, spec.dimension
                )));
            }
            debug!("Collection '{}' already exists", spec.name);
        } else {
            info!(
                "Creating collection '{}' with {} dimensions ({:?})",
                spec.name, spec.dimension, spec.distance
            );
            self.connection
                .create_empty_table(&spec.name, collection_schema(spec.dimension))
                .execute()
                .await
                .map_err(|e| RagError::Database(format!("Failed to create table: {}", e)))?;
        }

        self.collections
            .write()
            .await
            .insert(spec.name.clone(), spec.clone());
        Ok(())
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()> {
        if records.is_empty() {
            debug!("No records to store");
            return Ok(());
        }

        let table = self.open_table(collection).await?;
        let spec = self.spec_for(collection, &table).await?;
        let batch = records_to_batch(&records, spec.dimension)?;

        let schema = batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to insert records: {}", e)))?;

        debug!("Stored {} records in '{}'", records.len(), collection);
        Ok(())
    }

    async fn similarity_search(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<SearchHit>> {
        debug!("Searching '{}' for {} nearest records", collection, k);

        let table = self.open_table(collection).await?;
        let spec = self.spec_for(collection, &table).await?;

        let mut results = table
            .vector_search(query)
            .map_err(|e| RagError::Database(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .distance_type(spec.distance.to_lance())
            .limit(k)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to execute search: {}", e)))?;

        let mut hits = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| RagError::Database(format!("Failed to read result stream: {}", e)))?
        {
            hits.extend(batch_to_hits(&batch)?);
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        debug!("Parsed {} search results", hits.len());
        Ok(hits)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let table = self.open_table(collection).await?;
        table
            .count_rows(None)
            .await
            .map_err(|e| RagError::Database(format!("Failed to count rows: {}", e)))
    }
}
