use arrow::array::Float64Array;
use arrow::record_batch::RecordBatch;
use common::Result;
use std::sync::Arc;

use super::{Transformer, frame};
use crate::dataset::DatasetKind;
use crate::utils::numeric::safe_div;
use crate::utils::time::parse_instants;

pub struct MarketTransformer;

/// Percentage change against the prior price `close - change`.
fn price_change_percentage(close: &[f64], change: &[f64]) -> Float64Array {
    close
        .iter()
        .zip(change)
        .map(|(close, change)| Some(safe_div(*change, close - change) * 100.0))
        .collect()
}

impl Transformer for MarketTransformer {
    fn kind(&self) -> DatasetKind {
        DatasetKind::Market
    }

    fn transform(&self, batch: RecordBatch) -> Result<RecordBatch> {
        self.validate(&batch)?;
        let name = self.kind().as_str();

        let mut batch = frame::fill_nulls(&batch, &[])?;

        let instants = parse_instants(
            "market_timestamp",
            frame::column(name, &batch, "market_timestamp")?,
        )?;

        let close = frame::float_values(name, &batch, "close_price")?;
        let change_24h = frame::float_values(name, &batch, "price_change_24h")?;
        let change_7d = frame::float_values(name, &batch, "price_change_7d")?;

        batch = frame::with_column(&batch, "market_timestamp", Arc::new(instants))?;
        batch = frame::with_column(
            &batch,
            "price_change_percentage_24h",
            Arc::new(price_change_percentage(&close, &change_24h)),
        )?;
        batch = frame::with_column(
            &batch,
            "price_change_percentage_7d",
            Arc::new(price_change_percentage(&close, &change_7d)),
        )?;

        let volume = frame::float_values(name, &batch, "volume")?;
        let market_cap = frame::float_values(name, &batch, "market_cap")?;
        let keep = volume
            .iter()
            .zip(&market_cap)
            .map(|(volume, cap)| *volume > 0.0 && *cap > 0.0)
            .collect();

        frame::filter_rows(&batch, keep)
    }
}
