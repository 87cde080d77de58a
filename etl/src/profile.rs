use arrow::array::Array;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dataset::Dataset;

/// Row and null statistics for one dataset, logged after transform and
/// embedded in the output file.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatasetProfile {
    pub dataset: String,
    pub record_count: u64,
    pub column_count: usize,
    pub null_percentage: f64,
    pub column_nulls: BTreeMap<String, u64>,
    pub profiled_at: DateTime<Utc>,
}

impl DatasetProfile {
    pub fn new(dataset: &Dataset) -> Self {
        let batch = &dataset.batch;
        let record_count = batch.num_rows() as u64;
        let schema = batch.schema();

        let column_nulls: BTreeMap<String, u64> = schema
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, column)| (field.name().clone(), column.null_count() as u64))
            .collect();
        let total_nulls: u64 = column_nulls.values().sum();

        let cells = record_count as f64 * schema.fields().len() as f64;
        let null_percentage = if cells > 0.0 {
            total_nulls as f64 / cells * 100.0
        } else {
            0.0
        };

        Self {
            dataset: dataset.name.clone(),
            record_count,
            column_count: schema.fields().len(),
            null_percentage,
            column_nulls,
            profiled_at: Utc::now(),
        }
    }

    /// Columns that still hold at least one null.
    pub fn columns_with_nulls(&self) -> Vec<&str> {
        self.column_nulls
            .iter()
            .filter(|(_, nulls)| **nulls > 0)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
