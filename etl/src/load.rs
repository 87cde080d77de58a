use chrono::Utc;
use common::{Error, Result};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::dataset::Dataset;
use crate::profile::DatasetProfile;

#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub dataset: String,
    pub error: String,
}

/// Outcome of one load; partial success is a valid result.
#[derive(Debug, Default, Clone)]
pub struct LoadReport {
    pub written: Vec<(String, PathBuf)>,
    pub failed: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Loader {
    compression: Compression,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
        }
    }

    fn writer_properties(&self, dataset: &Dataset) -> Result<WriterProperties> {
        let profile = match &dataset.profile {
            Some(profile) => serde_json::to_string(profile)?,
            None => serde_json::to_string(&DatasetProfile::new(dataset))?,
        };
        let key_value_metadata = vec![
            KeyValue {
                key: "etl.dataset".to_string(),
                value: Some(dataset.name.clone()),
            },
            KeyValue {
                key: "etl.processed_at".to_string(),
                value: Some(Utc::now().to_rfc3339()),
            },
            KeyValue {
                key: "etl.profile".to_string(),
                value: Some(profile),
            },
        ];

        Ok(WriterProperties::builder()
            .set_compression(self.compression)
            .set_key_value_metadata(Some(key_value_metadata))
            .build())
    }

    /// Encodes the whole file in memory first so a failed encode never leaves
    /// a partial file behind.
    pub fn write_dataset(&self, dataset: &Dataset, path: &Path) -> Result<()> {
        let mut buffer: Vec<u8> = Vec::new();

        let mut writer = ArrowWriter::try_new(
            &mut buffer,
            dataset.batch.schema(),
            Some(self.writer_properties(dataset)?),
        )?;
        writer.write(&dataset.batch)?;
        writer.close()?;

        std::fs::write(path, &buffer)?;
        Ok(())
    }

    /// Writes each dataset to its output path independently. A dataset
    /// without an output path, or whose write fails, is recorded as failed.
    pub fn load(
        &self,
        datasets: &BTreeMap<String, Dataset>,
        output_paths: &HashMap<String, PathBuf>,
    ) -> LoadReport {
        let mut report = LoadReport::default();

        for (name, dataset) in datasets {
            let result = output_paths
                .get(name)
                .ok_or_else(|| Error::InvalidInput(format!("no output path for dataset '{}'", name)))
                .and_then(|path| self.write_dataset(dataset, path).map(|_| path));

            match result {
                Ok(path) => {
                    info!("Dataset '{}' loaded to {}", name, path.display());
                    report.written.push((name.clone(), path.clone()));
                }
                Err(e) => {
                    error!("An error occurred while loading {}: {}", name, e);
                    report.failed.push(LoadFailure {
                        dataset: name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
