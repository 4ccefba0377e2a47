//! create-tables - drop and recreate the staging and analysis tables

use anyhow::Result;
use clap::Parser;
use dwh_common::logging::{init_logging, LogConfig};
use dwh_etl::{catalog::Catalog, db::PgConnector, schema, Config, EtlError};
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "create-tables")]
#[command(version, about = "Drop and recreate the staging and analysis tables in Redshift")]
struct Cli {}

// Returning `ExitCode` lets the log guard drop, flushing the file writer
// before the process exits.
#[tokio::main]
async fn main() -> ExitCode {
    let _cli = Cli::parse();

    let _guard = match LogConfig::builder()
        .log_file_prefix("create-tables")
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
            error!(error = %format!("{:#}", e), statement, "Schema reset failed");
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

    info!(host = %config.cluster.host, database = %config.cluster.db_name, "Resetting schema");
    schema::run_setup(&PgConnector, &config.cluster, &catalog).await?;
    info!("Tables created");

    Ok(())
}
