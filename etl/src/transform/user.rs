use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use common::Result;
use std::sync::Arc;

use super::{Transformer, frame};
use crate::dataset::DatasetKind;
use crate::utils::time::{days_between, instant_micros, parse_instants};

const TEXT_COLUMNS: [&str; 3] = ["is_bot", "referral_id", "api_key_usage"];

pub struct UserTransformer {
    reference: NaiveDateTime,
}

impl UserTransformer {
    pub fn new(reference: NaiveDateTime) -> Self {
        Self { reference }
    }

    /// Parses `column` and counts whole days from each instant to the reference.
    /// A missing instant counts as 0 days.
    fn days_since(
        &self,
        name: &str,
        batch: &RecordBatch,
        column: &str,
    ) -> Result<(ArrayRef, Int64Array)> {
        let reference = instant_micros(&self.reference);
        let instants = parse_instants(column, frame::column(name, batch, column)?)?;
        let days: Int64Array = instants
            .iter()
            .map(|ts| Some(ts.map_or(0, |micros| days_between(reference, micros))))
            .collect();
        Ok((Arc::new(instants) as ArrayRef, days))
    }
}

impl Transformer for UserTransformer {
    fn kind(&self) -> DatasetKind {
        DatasetKind::Users
    }

    fn transform(&self, batch: RecordBatch) -> Result<RecordBatch> {
        self.validate(&batch)?;
        let name = self.kind().as_str();

        let mut batch = frame::fill_nulls(&batch, &[])?;

        let (registered, days_since_registration) =
            self.days_since(name, &batch, "registration_date")?;
        let (last_login, days_since_last_login) =
            self.days_since(name, &batch, "last_login_time")?;

        let balance: Float64Array = frame::float_values(name, &batch, "account_balance")?
            .into_iter()
            .map(|b| Some(b.max(0.0)))
            .collect();

        batch = frame::with_column(&batch, "registration_date", registered)?;
        batch = frame::with_column(&batch, "last_login_time", last_login)?;
        batch = frame::with_column(
            &batch,
            "days_since_registration",
            Arc::new(days_since_registration),
        )?;
        batch = frame::with_column(
            &batch,
            "days_since_last_login",
            Arc::new(days_since_last_login),
        )?;
        batch = frame::with_column(&batch, "account_balance", Arc::new(balance))?;

        for column in TEXT_COLUMNS {
            let text = frame::to_text(frame::column(name, &batch, column)?)?;
            batch = frame::with_column(&batch, column, text)?;
        }

        Ok(batch)
    }
}
