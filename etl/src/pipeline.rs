use arrow::util::pretty::pretty_format_batches;
use chrono::{NaiveDateTime, Utc};
use common::Result;
use common::config::Settings;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::dataset::{Dataset, DatasetKind};
use crate::extract::{Extractor, SkippedFile};
use crate::load::{LoadReport, Loader};
use crate::transform::transformer_for;

#[derive(Debug, Clone)]
pub struct DatasetSummary {
    pub dataset: String,
    pub rows_in: usize,
    pub rows_out: usize,
}

#[derive(Debug)]
pub struct PipelineReport {
    pub skipped: Vec<SkippedFile>,
    pub datasets: Vec<DatasetSummary>,
    pub load: LoadReport,
}

pub struct Pipeline {
    settings: Settings,
    reference: NaiveDateTime,
    extractor: Extractor,
    loader: Loader,
}

impl Pipeline {
    /// Resolves the reference instant once, so every dataset in the run sees
    /// the same "now".
    pub fn new(settings: Settings) -> Result<Self> {
        let reference = settings
            .reference_instant()?
            .unwrap_or_else(|| Utc::now().naive_utc());

        Ok(Self {
            settings,
            reference,
            extractor: Extractor::new(),
            loader: Loader::new(),
        })
    }

    pub fn reference(&self) -> NaiveDateTime {
        self.reference
    }

    pub fn input_paths(&self) -> Vec<PathBuf> {
        DatasetKind::ALL
            .iter()
            .map(|kind| self.settings.input_dir.join(kind.input_file_name()))
            .collect()
    }

    pub fn output_paths(&self) -> HashMap<String, PathBuf> {
        DatasetKind::ALL
            .iter()
            .map(|kind| {
                (
                    kind.as_str().to_string(),
                    self.settings.output_dir.join(kind.output_file_name()),
                )
            })
            .collect()
    }

    /// Routes each raw dataset to its transformer. Any transform error aborts.
    pub fn transform(
        &self,
        raw: BTreeMap<String, Dataset>,
    ) -> Result<(BTreeMap<String, Dataset>, Vec<DatasetSummary>)> {
        let mut transformed = BTreeMap::new();
        let mut summaries = Vec::new();

        for (name, dataset) in raw {
            let Some(kind) = DatasetKind::from_name(&name) else {
                warn!(dataset = %name, "No transformer for dataset, skipping");
                continue;
            };

            let rows_in = dataset.num_rows();
            let batch = transformer_for(kind, self.reference).transform(dataset.batch)?;
            let dataset = Dataset::new(name.clone(), batch).profiled();

            if let Some(profile) = &dataset.profile {
                info!(
                    dataset = %name,
                    rows_in,
                    rows_out = profile.record_count,
                    null_percentage = profile.null_percentage,
                    columns_with_nulls = ?profile.columns_with_nulls(),
                    "Transformed dataset"
                );
            }

            summaries.push(DatasetSummary {
                dataset: name.clone(),
                rows_in,
                rows_out: dataset.num_rows(),
            });
            transformed.insert(name, dataset);
        }

        Ok((transformed, summaries))
    }

    pub fn print_preview(&self, datasets: &BTreeMap<String, Dataset>) -> Result<()> {
        for kind in DatasetKind::ALL {
            println!("\n--- Transformed {} Dataset Head ---", kind.title());
            match datasets.get(kind.as_str()) {
                Some(dataset) => {
                    let rows = self.settings.preview_rows.min(dataset.num_rows());
                    println!("{}", pretty_format_batches(&[dataset.batch.slice(0, rows)])?);
                }
                None => println!("{} dataset not found.", kind.title()),
            }
        }
        Ok(())
    }

    pub fn run(&self) -> Result<PipelineReport> {
        info!(
            input_dir = %self.settings.input_dir.display(),
            output_dir = %self.settings.output_dir.display(),
            reference = %self.reference,
            "Starting ETL pipeline"
        );

        let extraction = self.extractor.extract(&self.input_paths());
        let (transformed, datasets) = self.transform(extraction.datasets)?;

        self.print_preview(&transformed)?;

        let load = self.loader.load(&transformed, &self.output_paths());
        info!(
            written = load.written.len(),
            failed = load.failed.len(),
            skipped_inputs = extraction.skipped.len(),
            "ETL pipeline finished"
        );

        Ok(PipelineReport {
            skipped: extraction.skipped,
            datasets,
            load,
        })
    }
}
