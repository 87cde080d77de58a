use anyhow::Context;
use clap::{Arg, Command, value_parser};
use common::config::{LogFormat, LoggingConfig, Settings};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_target(false);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn run_pipeline(config_path: &str) -> anyhow::Result<()> {
    let settings = Settings::new(config_path)
        .with_context(|| format!("failed to load config from {}", config_path))?;
    init_tracing(&settings.logging);

    let report = etl::run_etl_pipeline(settings)?;
    for failure in &report.load.failed {
        eprintln!("Dataset '{}' was not written: {}", failure.dataset, failure.error);
    }
    Ok(())
}

fn preview_file(path: &Path, rows: usize) -> anyhow::Result<()> {
    let batch = etl::extract::read_parquet(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    println!("{} rows, schema:", batch.num_rows());
    for field in batch.schema().fields() {
        println!("  {}: {}", field.name(), field.data_type());
    }

    let rows = rows.min(batch.num_rows());
    println!(
        "{}",
        arrow::util::pretty::pretty_format_batches(&[batch.slice(0, rows)])?
    );
    Ok(())
}

fn main() {
    let matches = Command::new("Crypto Snapshot ETL")
        .version("1.0")
        .about("Cleans and enriches crypto snapshot datasets")
        .subcommand(
            Command::new("etl")
                .about("Run the ETL pipeline")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .help("Sets a custom config file"),
                ),
        )
        .subcommand(
            Command::new("preview")
                .about("Print the schema and first rows of a Parquet file")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_name("FILE")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("rows")
                        .short('n')
                        .long("rows")
                        .value_name("ROWS")
                        .default_value("5")
                        .value_parser(value_parser!(usize)),
                ),
        )
        .get_matches();

    let result = match matches.subcommand() {
        Some(("etl", etl_matches)) => {
            let config_path = etl_matches
                .get_one::<String>("config")
                .map(|s| s.as_str())
                .unwrap_or("config/etl.toml");
            println!("Starting ETL pipeline with config: {}", config_path);
            run_pipeline(config_path)
        }
        Some(("preview", preview_matches)) => {
            let rows = preview_matches.get_one::<usize>("rows").copied().unwrap_or(5);
            match preview_matches.get_one::<PathBuf>("file") {
                Some(path) => preview_file(path, rows),
                None => Err(anyhow::anyhow!("no file given")),
            }
        }
        _ => {
            eprintln!("Please specify a valid subcommand");
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("ETL pipeline error: {:#}", e);
        process::exit(1);
    }
}
