// LanceDB vector database module
// Arrow schema and record batch conversion for stored chunks


pub mod vector_store;

pub use vector_store::LanceVectorStore;

use arrow::array::{Array, FixedSizeListArray, Float32Array, StringArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

use super::{SearchHit, VectorRecord};
use crate::{RagError, Result};

/// Arrow schema of a collection table with `dimension`-wide vectors
#[inline]
pub fn collection_schema(dimension: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                dimension as i32,
            ),
            false,
        ),
        Field::new("text", DataType::Utf8, false),
        Field::new("origin", DataType::Utf8, false),
        Field::new("section", DataType::Utf8, true),
        Field::new("position", DataType::UInt32, false),
        Field::new("created_at", DataType::Utf8, false),
    ]))
}

/// Vector width declared by a table schema
#[inline]
pub fn schema_dimension(schema: &Schema) -> Option<usize> {
    schema
        .field_with_name("vector")
        .ok()
        .and_then(|field| match field.data_type() {
            DataType::FixedSizeList(_, size) => usize::try_from(*size).ok(),
            _ => None,
        })
}

/// Build a record batch; every vector must be `dimension` wide
#[inline]
pub fn records_to_batch(records: &[VectorRecord], dimension: usize) -> Result<RecordBatch> {
    let mut flat_values = Vec::with_capacity(records.len() * dimension);
    for record in records {
        if record.vector.len() != dimension {
            return Err(RagError::Database(format!(
                "Vector has {} dimensions, collection expects {}",
                record.vector.len(),
                dimension
            )));
        }
        flat_values.extend_from_slice(&record.vector);
    }

    let field = Arc::new(Field::new("item", DataType::Float32, true));
    let vector_array = FixedSizeListArray::try_new(
        field,
        dimension as i32,
        Arc::new(Float32Array::from(flat_values)),
        None,
    )
    .map_err(|e| RagError::Database(format!("Failed to create vector array: {}", e)))?;

    let arrays: Vec<Arc<dyn Array>> = vec![
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.id.as_str()),
        )),
        Arc::new(vector_array),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.text.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.origin.as_str()),
        )),
        Arc::new(StringArray::from(
            records
                .iter()
                .map(|r| r.section.as_deref())
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt32Array::from_iter_values(
            records.iter().map(|r| r.position),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.created_at.as_str()),
        )),
    ];

    RecordBatch::try_new(collection_schema(dimension), arrays)
        .map_err(|e| RagError::Database(format!("Failed to create record batch: {}", e)))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| RagError::Database(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| RagError::Database(format!("Invalid {} column type", name)))
}

/// Turn one batch of search output into hits; `_distance` defaults to 0
#[inline]
pub fn batch_to_hits(batch: &RecordBatch) -> Result<Vec<SearchHit>> {
    let texts = string_column(batch, "text")?;
    let origins = string_column(batch, "origin")?;
    let sections = string_column(batch, "section")?;
    let positions = batch
        .column_by_name("position")
        .ok_or_else(|| RagError::Database("Missing position column".to_string()))?
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| RagError::Database("Invalid position column type".to_string()))?;
    let distances = batch
        .column_by_name("_distance")
        .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

    Ok((0..batch.num_rows())
        .map(|row| SearchHit {
            text: texts.value(row).to_string(),
            origin: origins.value(row).to_string(),
            section: (!sections.is_null(row)).then(|| sections.value(row).to_string()),
            position: positions.value(row),
            distance: distances
                .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) }),
        })
        .collect())
}
