//! DWH ETL Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Moves JSON event logs and song metadata from S3 into a Redshift star
//! schema.
//!
//! # Overview
//!
//! - **Configuration**: `dwh.cfg` loaded once into an immutable [`Config`]
//! - **Catalog**: every SQL statement, tagged by phase and table
//! - **Connection**: a single warehouse session with commit-per-statement
//! - **Schema**: drop and recreate staging and analysis tables (`create-tables`)
//! - **Pipeline**: `COPY` into staging, then `INSERT ... SELECT` into the star schema (`etl`)
//!
//! # Example
//!
//! ```no_run
//! use dwh_etl::{catalog::Catalog, db::PgConnector, pipeline, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let catalog = Catalog::new(&config);
//!     catalog.validate()?;
//!
//!     let report = pipeline::run_etl(&PgConnector, &config.cluster, &catalog).await?;
//!     println!("loaded {} staging rows", report.total_rows(dwh_common::Phase::Load));
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod pipeline;
pub mod schema;

// Re-export commonly used types
pub use config::Config;
pub use error::{EtlError, Result};
