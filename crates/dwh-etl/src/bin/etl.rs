//! etl - load staging tables from S3 and populate the star schema

use anyhow::Result;
use clap::Parser;
use dwh_common::logging::{init_logging, LogConfig};
use dwh_common::Phase;
use dwh_etl::{catalog::Catalog, db::PgConnector, pipeline, Config, EtlError};
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "etl")]
#[command(version, about = "Load staging tables from S3 and transform them into the analysis tables")]
struct Cli {}

// Returning `ExitCode` lets the log guard drop, flushing the file writer
// before the process exits.
#[tokio::main]
async fn main() -> ExitCode {
    let _cli = Cli::parse();

    let _guard = match LogConfig::builder()
        .log_file_prefix("etl")
        .filter_directives("sqlx=warn")
        .build()
        .merge_env()
        .and_then(|config| init_logging(&config))
    {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {:#}", e);
            None
        },
    };

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let statement = e.downcast_ref::<EtlError>().and_then(EtlError::statement);
            error!(error = %format!("{:#}", e), statement, "Pipeline failed");
            eprintln!("Error: {:#}", e);
            if let Some(sql) = statement {
                eprintln!("Statement:\n{}", sql);
            }
            ExitCode::FAILURE
        },
    }
}

async fn run() -> Result<()> {
    let config = Config::load()?;
    let catalog = Catalog::new(&config);
    catalog.validate()?;

    info!(host = %config.cluster.host, database = %config.cluster.db_name, "Starting pipeline");
    let report = pipeline::run_etl(&PgConnector, &config.cluster, &catalog).await?;

    for step in &report.steps {
        info!(phase = %step.phase, table = %step.table, rows = step.rows, "Summary");
    }
    info!(
        staged = report.total_rows(Phase::Load),
        inserted = report.total_rows(Phase::Transform),
        elapsed_ms = report.elapsed().as_millis() as u64,
        "Pipeline complete"
    );

    Ok(())
}
