use arrow::compute::concat_batches;
use arrow::datatypes::Schema;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use common::{Error, Result};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::dataset::Dataset;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Missing,
    Unreadable(String),
}

#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Datasets read by one extraction, keyed by name, plus the files that could
/// not be read.
#[derive(Debug, Default)]
pub struct Extraction {
    pub datasets: BTreeMap<String, Dataset>,
    pub skipped: Vec<SkippedFile>,
}

/// Dataset name of an input file: its file name up to the first '.'.
pub fn dataset_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    match file_name.split('.').next() {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => file_name,
    }
}

/// Reads every row group of a Parquet file into a single batch. Schema-level
/// metadata from the writer is dropped.
pub fn read_parquet(path: &Path) -> Result<RecordBatch> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = Arc::new(Schema::new(builder.schema().fields().clone()));

    let batches = builder
        .build()?
        .collect::<std::result::Result<Vec<_>, ArrowError>>()?;

    Ok(concat_batches(&schema, &batches)?)
}

pub struct Extractor;

impl Extractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, files: &[PathBuf]) -> Extraction {
        let mut extraction = Extraction::default();

        for path in files {
            match read_parquet(path) {
                Ok(batch) => {
                    let name = dataset_name(path);
                    debug!(
                        dataset = %name,
                        rows = batch.num_rows(),
                        columns = batch.num_columns(),
                        "Extracted dataset"
                    );
                    extraction
                        .datasets
                        .insert(name.clone(), Dataset::new(name, batch));
                }
                Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
                    warn!("File '{}' not found.", path.display());
                    extraction.skipped.push(SkippedFile {
                        path: path.clone(),
                        reason: SkipReason::Missing,
                    });
                }
                Err(e) => {
                    warn!("An error occurred while reading {}: {}", path.display(), e);
                    extraction.skipped.push(SkippedFile {
                        path: path.clone(),
                        reason: SkipReason::Unreadable(e.to_string()),
                    });
                }
            }
        }

        extraction
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::Loader;
    use arrow::array::{ArrayRef, Float64Array};

    fn write_sample(path: &Path) {
        let batch = RecordBatch::try_from_iter(vec![(
            "amount",
            Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0])) as ArrayRef,
        )])
        .unwrap();
        Loader::new()
            .write_dataset(&Dataset::new("transactions", batch), path)
            .unwrap();
    }

    #[test]
    fn test_dataset_name_strips_extensions() {
        assert_eq!(dataset_name(Path::new("data/users.parquet")), "users");
        assert_eq!(dataset_name(Path::new("market.snappy.parquet")), "market");
        assert_eq!(dataset_name(Path::new("network")), "network");
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("transactions.parquet");
        write_sample(&existing);
        let missing = dir.path().join("users.parquet");

        let extraction = Extractor::new().extract(&[existing, missing.clone()]);

        assert_eq!(extraction.datasets.len(), 1);
        assert_eq!(extraction.datasets["transactions"].num_rows(), 3);
        assert_eq!(extraction.skipped.len(), 1);
        assert_eq!(extraction.skipped[0].path, missing);
        assert_eq!(extraction.skipped[0].reason, SkipReason::Missing);
    }

    #[test]
    fn test_corrupt_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let corrupt = dir.path().join("market.parquet");
        std::fs::write(&corrupt, b"definitely not parquet").unwrap();

        let extraction = Extractor::new().extract(&[corrupt]);

        assert!(extraction.datasets.is_empty());
        assert!(matches!(
            extraction.skipped[0].reason,
            SkipReason::Unreadable(_)
        ));
    }
}
