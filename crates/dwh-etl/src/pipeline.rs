//! Load-and-transform runner
//!
//! Bulk-loads the staging tables from S3, then populates the analysis tables
//! from them. Every statement commits on its own, so a failure leaves the
//! statements before it committed. Nothing is retried.

use crate::catalog::Catalog;
use crate::config::ClusterConfig;
use crate::db::{self, Connector, Warehouse};
use crate::error::{EtlError, Result};
use dwh_common::{Phase, Table};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Phases the batch job runs, in order
pub const PIPELINE_PHASES: [Phase; 2] = [Phase::Load, Phase::Transform];

/// Outcome of one committed statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub phase: Phase,
    pub table: Table,
    /// Rows the warehouse reported as affected
    pub rows: u64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub steps: Vec<StepReport>,
}

impl PipelineReport {
    pub fn rows_for(&self, table: Table, phase: Phase) -> Option<u64> {
        self.steps
            .iter()
            .find(|s| s.table == table && s.phase == phase)
            .map(|s| s.rows)
    }

    pub fn total_rows(&self, phase: Phase) -> u64 {
        self.steps.iter().filter(|s| s.phase == phase).map(|s| s.rows).sum()
    }

    pub fn elapsed(&self) -> Duration {
        self.steps.iter().map(|s| s.elapsed).sum()
    }
}

/// Execute every load statement, then every transform statement, committing each
#[instrument(skip_all)]
pub async fn run_pipeline<W: Warehouse>(conn: &mut W, catalog: &Catalog) -> Result<PipelineReport> {
    let mut report = PipelineReport::default();

    for phase in PIPELINE_PHASES {
        info!(%phase, "Running pipeline phase");

        for (index, statement) in catalog.phase(phase).enumerate() {
            debug!(%phase, index, table = %statement.table, sql = %statement.sql, "Executing statement");

            let (rows, elapsed) = db::execute_committed(conn, &statement.sql).await.map_err(|source| {
                error!(%phase, index, table = %statement.table, error = ?source, "Pipeline statement failed");
                EtlError::Pipeline {
                    phase,
                    index,
                    table: statement.table,
                    statement: statement.sql.clone(),
                    source,
                }
            })?;

            info!(
                %phase,
                table = %statement.table,
                rows,
                elapsed_ms = elapsed.as_millis() as u64,
                "Statement committed"
            );

            report.steps.push(StepReport { phase, table: statement.table, rows, elapsed });
        }

        info!(%phase, rows = report.total_rows(phase), "Phase complete");
    }

    Ok(report)
}

/// Open a session, run the pipeline, and close the session on every path
pub async fn run_etl<C: Connector>(
    connector: &C,
    cluster: &ClusterConfig,
    catalog: &Catalog,
) -> Result<PipelineReport> {
    let mut conn = connector.open(cluster).await?;
    let outcome = run_pipeline(&mut conn, catalog).await;
    db::release(conn, outcome).await
}
