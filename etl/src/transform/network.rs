use arrow::array::Float64Array;
use arrow::record_batch::RecordBatch;
use common::Result;
use std::sync::Arc;

use super::{Transformer, frame};
use crate::dataset::DatasetKind;
use crate::utils::numeric::safe_div;
use crate::utils::time::parse_instants;

pub struct NetworkTransformer;

impl Transformer for NetworkTransformer {
    fn kind(&self) -> DatasetKind {
        DatasetKind::Network
    }

    fn transform(&self, batch: RecordBatch) -> Result<RecordBatch> {
        self.validate(&batch)?;
        let name = self.kind().as_str();

        let mut batch = frame::fill_nulls(&batch, &[])?;

        let instants = parse_instants(
            "network_timestamp",
            frame::column(name, &batch, "network_timestamp")?,
        )?;

        let total = frame::float_values(name, &batch, "total_transactions")?;
        let block_time = frame::float_values(name, &batch, "average_block_time")?;
        let hashrate = frame::float_values(name, &batch, "hashrate")?;

        let tps: Float64Array = total
            .iter()
            .zip(&block_time)
            .map(|(total, block_time)| Some(safe_div(*total, *block_time)))
            .collect();

        batch = frame::with_column(&batch, "network_timestamp", Arc::new(instants))?;
        batch = frame::with_column(&batch, "transactions_per_second", Arc::new(tps))?;

        let keep = block_time
            .iter()
            .zip(&hashrate)
            .map(|(block_time, hashrate)| *block_time > 0.0 && *hashrate > 0.0)
            .collect();

        frame::filter_rows(&batch, keep)
    }
}
