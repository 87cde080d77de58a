use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int32Array};
use arrow::record_batch::RecordBatch;
use common::Result;
use std::sync::Arc;

use super::{Transformer, frame};
use crate::dataset::DatasetKind;
use crate::utils::numeric::{above_quantile, safe_div};
use crate::utils::time::{day_of_week, hour_of_day, parse_instants};

/// Gas prices and amounts above this batch quantile are flagged.
pub const HIGH_QUANTILE: f64 = 0.95;
pub const DEFAULT_LEVERAGE: f64 = 1.0;

pub struct TransactionTransformer;

impl Transformer for TransactionTransformer {
    fn kind(&self) -> DatasetKind {
        DatasetKind::Transactions
    }

    fn transform(&self, batch: RecordBatch) -> Result<RecordBatch> {
        self.validate(&batch)?;
        let name = self.kind().as_str();

        // leverage gets its own default instead of 0
        let mut batch = frame::fill_nulls(&batch, &[("leverage", DEFAULT_LEVERAGE)])?;

        let instants = parse_instants("timestamp", frame::column(name, &batch, "timestamp")?)?;

        let fee = frame::float_values(name, &batch, "transaction_fee")?;
        let amount = frame::float_values(name, &batch, "amount")?;
        let amount_usd = frame::float_values(name, &batch, "amount_usd")?;
        let gas_price = frame::float_values(name, &batch, "gas_price")?;

        let fee_usd: Float64Array = fee
            .iter()
            .zip(&amount_usd)
            .zip(&amount)
            .map(|((fee, usd), amount)| Some(safe_div(fee * usd, *amount)))
            .collect();

        // a missing instant yields the numeric fill value
        let hours: Int32Array = instants
            .iter()
            .map(|ts| Some(ts.and_then(hour_of_day).unwrap_or(0) as i32))
            .collect();
        let weekdays: Int32Array = instants
            .iter()
            .map(|ts| Some(ts.and_then(day_of_week).unwrap_or(0) as i32))
            .collect();

        let order_id = frame::to_text(frame::column(name, &batch, "order_id")?)?;

        batch = frame::with_column(&batch, "timestamp", Arc::new(instants))?;
        batch = frame::with_column(&batch, "transaction_fee_usd", Arc::new(fee_usd))?;
        batch = frame::with_column(&batch, "hour", Arc::new(hours))?;
        batch = frame::with_column(&batch, "day_of_week", Arc::new(weekdays))?;
        batch = frame::with_column(
            &batch,
            "is_high_gas",
            Arc::new(BooleanArray::from(above_quantile(&gas_price, HIGH_QUANTILE))),
        )?;
        batch = frame::with_column(
            &batch,
            "is_high_amount",
            Arc::new(BooleanArray::from(above_quantile(&amount, HIGH_QUANTILE))),
        )?;
        batch = frame::with_column(&batch, "order_id", order_id)?;

        if batch.column_by_name("leverage").is_none() {
            let leverage: ArrayRef =
                Arc::new(Float64Array::from(vec![DEFAULT_LEVERAGE; batch.num_rows()]));
            batch = frame::with_column(&batch, "leverage", leverage)?;
        }

        Ok(batch)
    }
}
