use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray,
};
use arrow::datatypes::{DataType, Float64Type, Int64Type, TimeUnit};
use arrow::record_batch::RecordBatch;
use common::config::Settings;
use etl::extract::{SkipReason, read_parquet};
use etl::{Dataset, Loader, Pipeline};
use std::path::Path;
use std::sync::Arc;

fn write_raw(dir: &Path, name: &str, batch: RecordBatch) {
    Loader::new()
        .write_dataset(
            &Dataset::new(name, batch),
            &dir.join(format!("{name}.parquet")),
        )
        .unwrap();
}

fn transactions() -> RecordBatch {
    RecordBatch::try_from_iter(vec![
        (
            "timestamp",
            Arc::new(StringArray::from(vec![
                "2024-05-01 08:00:00",
                "2024-05-02 09:30:00",
                "2024-05-03 22:15:00",
            ])) as ArrayRef,
        ),
        (
            "amount",
            Arc::new(Float64Array::from(vec![Some(100.0), Some(0.0), None])) as ArrayRef,
        ),
        (
            "amount_usd",
            Arc::new(Float64Array::from(vec![200.0, 50.0, 10.0])) as ArrayRef,
        ),
        (
            "transaction_fee",
            Arc::new(Float64Array::from(vec![1.0, 1.0, 1.0])) as ArrayRef,
        ),
        (
            "gas_price",
            Arc::new(Float64Array::from(vec![20.0, 25.0, 90.0])) as ArrayRef,
        ),
        (
            "order_id",
            Arc::new(Int64Array::from(vec![Some(11), None, Some(13)])) as ArrayRef,
        ),
        (
            "leverage",
            Arc::new(Float64Array::from(vec![Some(2.0), None, None])) as ArrayRef,
        ),
        (
            "token_symbol",
            Arc::new(StringArray::from(vec![Some("ETH"), None, Some("BTC")])) as ArrayRef,
        ),
    ])
    .unwrap()
}

fn users() -> RecordBatch {
    RecordBatch::try_from_iter(vec![
        (
            "registration_date",
            Arc::new(StringArray::from(vec!["2024-04-01", "2024-05-30"])) as ArrayRef,
        ),
        (
            "last_login_time",
            Arc::new(StringArray::from(vec!["2024-05-31 10:00:00", "2024-05-31 23:00:00"]))
                as ArrayRef,
        ),
        (
            "account_balance",
            Arc::new(Float64Array::from(vec![-50.0, 50.0])) as ArrayRef,
        ),
        (
            "is_bot",
            Arc::new(BooleanArray::from(vec![false, true])) as ArrayRef,
        ),
        (
            "referral_id",
            Arc::new(StringArray::from(vec![Some("ref-1"), None])) as ArrayRef,
        ),
        (
            "api_key_usage",
            Arc::new(Int64Array::from(vec![3, 0])) as ArrayRef,
        ),
    ])
    .unwrap()
}

fn market() -> RecordBatch {
    RecordBatch::try_from_iter(vec![
        (
            "market_timestamp",
            Arc::new(StringArray::from(vec!["2024-05-01", "2024-05-02"])) as ArrayRef,
        ),
        (
            "close_price",
            Arc::new(Float64Array::from(vec![105.0, 99.0])) as ArrayRef,
        ),
        (
            "price_change_24h",
            Arc::new(Float64Array::from(vec![5.0, -1.0])) as ArrayRef,
        ),
        (
            "price_change_7d",
            Arc::new(Float64Array::from(vec![5.0, -1.0])) as ArrayRef,
        ),
        ("volume", Arc::new(Float64Array::from(vec![10.0, 0.0])) as ArrayRef),
        (
            "market_cap",
            Arc::new(Float64Array::from(vec![1e6, 1e6])) as ArrayRef,
        ),
    ])
    .unwrap()
}

fn settings(input: &Path, output: &Path) -> Settings {
    Settings {
        input_dir: input.to_path_buf(),
        output_dir: output.to_path_buf(),
        reference_time: Some("2024-06-01T00:00:00Z".to_string()),
        ..Settings::default()
    }
}

#[test]
fn test_pipeline_end_to_end() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_raw(input.path(), "transactions", transactions());
    write_raw(input.path(), "users", users());
    write_raw(input.path(), "market", market());
    // network input is deliberately absent

    let pipeline = Pipeline::new(settings(input.path(), output.path())).unwrap();
    let report = pipeline.run().unwrap();

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::Missing);
    assert!(report.skipped[0].path.ends_with("network.parquet"));

    assert_eq!(report.load.written.len(), 3);
    assert!(report.load.failed.is_empty());
    assert!(!output.path().join("transformed_network.parquet").exists());

    let market_summary = report
        .datasets
        .iter()
        .find(|s| s.dataset == "market")
        .unwrap();
    assert_eq!((market_summary.rows_in, market_summary.rows_out), (2, 1));

    let tx = read_parquet(&output.path().join("transformed_transactions.parquet")).unwrap();
    assert_eq!(tx.num_rows(), 3);
    assert_eq!(
        tx.column_by_name("timestamp").unwrap().data_type(),
        &DataType::Timestamp(TimeUnit::Microsecond, None)
    );
    let fee_usd = tx
        .column_by_name("transaction_fee_usd")
        .unwrap()
        .as_primitive::<Float64Type>();
    assert_eq!(fee_usd.values().to_vec(), vec![2.0, 0.0, 0.0]);
    let leverage = tx
        .column_by_name("leverage")
        .unwrap()
        .as_primitive::<Float64Type>();
    assert_eq!(leverage.values().to_vec(), vec![2.0, 1.0, 1.0]);
    let order_id = tx.column_by_name("order_id").unwrap().as_string::<i32>();
    assert_eq!(order_id.value(1), "0");
    let high_gas = tx.column_by_name("is_high_gas").unwrap().as_boolean();
    assert_eq!(high_gas.true_count(), 1);
    assert!(high_gas.value(2));

    let users = read_parquet(&output.path().join("transformed_users.parquet")).unwrap();
    let balance = users
        .column_by_name("account_balance")
        .unwrap()
        .as_primitive::<Float64Type>();
    assert_eq!(balance.values().to_vec(), vec![0.0, 50.0]);
    let since_registration = users
        .column_by_name("days_since_registration")
        .unwrap()
        .as_primitive::<Int64Type>();
    assert_eq!(since_registration.values().to_vec(), vec![61, 2]);
    let since_login = users
        .column_by_name("days_since_last_login")
        .unwrap()
        .as_primitive::<Int64Type>();
    assert_eq!(since_login.values().to_vec(), vec![0, 0]);
    let is_bot = users.column_by_name("is_bot").unwrap();
    assert_eq!(is_bot.data_type(), &DataType::Utf8);
    assert_eq!(is_bot.null_count(), 0);
    let is_bot = is_bot.as_string::<i32>();
    assert_eq!((is_bot.value(0), is_bot.value(1)), ("False", "True"));

    let market = read_parquet(&output.path().join("transformed_market.parquet")).unwrap();
    assert_eq!(market.num_rows(), 1);
    let pct = market
        .column_by_name("price_change_percentage_24h")
        .unwrap()
        .as_primitive::<Float64Type>();
    assert!((pct.value(0) - 5.0).abs() < 1e-9);
}

#[test]
fn test_missing_required_column_aborts_run() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    let broken = transactions();
    let keep: Vec<usize> = (0..broken.num_columns())
        .filter(|i| broken.schema().field(*i).name() != "amount_usd")
        .collect();
    write_raw(input.path(), "transactions", broken.project(&keep).unwrap());

    let pipeline = Pipeline::new(settings(input.path(), output.path())).unwrap();
    let err = pipeline.run().unwrap_err();

    assert!(err.to_string().contains("amount_usd"));
    assert!(!output.path().join("transformed_transactions.parquet").exists());
}

#[test]
fn test_empty_input_dir_writes_nothing() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    let report = Pipeline::new(settings(input.path(), output.path()))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.skipped.len(), 4);
    assert!(report.datasets.is_empty());
    assert!(report.load.written.is_empty());
}
