pub mod dataset;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod profile;
pub mod transform;
pub mod utils;

use common::Result;
use common::config::Settings;

pub use dataset::{Dataset, DatasetKind};
pub use extract::{Extraction, Extractor};
pub use load::{LoadReport, Loader};
pub use pipeline::{Pipeline, PipelineReport};

/// Runs extract, transform and load once over the configured directories.
pub fn run_etl_pipeline(settings: Settings) -> Result<PipelineReport> {
    Pipeline::new(settings)?.run()
}
