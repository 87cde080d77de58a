pub mod frame;
pub mod market;
pub mod network;
pub mod transaction;
pub mod user;

use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use common::Result;

use crate::dataset::DatasetKind;

pub use market::MarketTransformer;
pub use network::NetworkTransformer;
pub use transaction::TransactionTransformer;
pub use user::UserTransformer;

/// Cleans and enriches one raw table of a single dataset kind.
pub trait Transformer {
    fn kind(&self) -> DatasetKind;

    fn transform(&self, batch: RecordBatch) -> Result<RecordBatch>;

    /// Fails with a typed error when a required raw column is absent.
    fn validate(&self, batch: &RecordBatch) -> Result<()> {
        let kind = self.kind();
        frame::require_columns(kind.as_str(), batch, kind.required_columns())
    }
}

/// `reference` is the instant day-count features are measured from.
pub fn transformer_for(kind: DatasetKind, reference: NaiveDateTime) -> Box<dyn Transformer> {
    match kind {
        DatasetKind::Transactions => Box::new(TransactionTransformer),
        DatasetKind::Users => Box::new(UserTransformer::new(reference)),
        DatasetKind::Market => Box::new(MarketTransformer),
        DatasetKind::Network => Box::new(NetworkTransformer),
    }
}
