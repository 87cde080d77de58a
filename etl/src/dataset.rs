use arrow::record_batch::RecordBatch;

use crate::profile::DatasetProfile;

/// A named table, read from one input file and written to one output file.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub batch: RecordBatch,
    /// Set once the batch is final; the loader embeds it as-is.
    pub profile: Option<DatasetProfile>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, batch: RecordBatch) -> Self {
        Self {
            name: name.into(),
            batch,
            profile: None,
        }
    }

    /// Profiles the current batch and keeps the result with the dataset.
    pub fn profiled(mut self) -> Self {
        self.profile = Some(DatasetProfile::new(&self));
        self
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }
}

// The four logical datasets the pipeline knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Transactions,
    Users,
    Market,
    Network,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 4] = [
        DatasetKind::Transactions,
        DatasetKind::Users,
        DatasetKind::Market,
        DatasetKind::Network,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::Users => "users",
            Self::Market => "market",
            Self::Network => "network",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Title used in the preview output, e.g. "Transactions".
    pub fn title(&self) -> &'static str {
        match self {
            Self::Transactions => "Transactions",
            Self::Users => "Users",
            Self::Market => "Market",
            Self::Network => "Network",
        }
    }

    pub fn input_file_name(&self) -> String {
        format!("{}.parquet", self.as_str())
    }

    pub fn output_file_name(&self) -> String {
        format!("transformed_{}.parquet", self.as_str())
    }

    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Transactions => &[
                "timestamp",
                "amount",
                "amount_usd",
                "transaction_fee",
                "gas_price",
                "order_id",
            ],
            Self::Users => &[
                "registration_date",
                "last_login_time",
                "account_balance",
                "is_bot",
                "referral_id",
                "api_key_usage",
            ],
            Self::Market => &[
                "market_timestamp",
                "close_price",
                "price_change_24h",
                "price_change_7d",
                "volume",
                "market_cap",
            ],
            Self::Network => &[
                "network_timestamp",
                "total_transactions",
                "average_block_time",
                "hashrate",
            ],
        }
    }
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
