//! Schema reset: drop then recreate every staging and analysis table
//!
//! This is a one-time administrative step. A failure leaves the schema
//! partially reset; running it again from the start is always safe because
//! drops use `IF EXISTS` and creates use `IF NOT EXISTS`.

use crate::catalog::Catalog;
use crate::config::ClusterConfig;
use crate::db::{self, Connector, Warehouse};
use crate::error::{EtlError, Result};
use dwh_common::Phase;
use tracing::{debug, error, info, instrument};

/// Execute every drop statement, then every create statement, committing each
#[instrument(skip_all, fields(dialect = ?catalog.dialect()))]
pub async fn reset_schema<W: Warehouse>(conn: &mut W, catalog: &Catalog) -> Result<()> {
    for phase in [Phase::Drop, Phase::Create] {
        info!(%phase, "Running schema phase");

        for statement in catalog.phase(phase) {
            debug!(%phase, table = %statement.table, sql = %statement.sql, "Executing statement");

            let (_, elapsed) = db::execute_committed(conn, &statement.sql).await.map_err(|source| {
                error!(%phase, table = %statement.table, error = ?source, "Schema statement failed");
                EtlError::Schema {
                    phase,
                    table: statement.table,
                    statement: statement.sql.clone(),
                    source,
                }
            })?;

            info!(
                %phase,
                table = %statement.table,
                elapsed_ms = elapsed.as_millis() as u64,
                "Statement committed"
            );
        }
    }

    info!("Schema reset complete");
    Ok(())
}

/// Open a session, reset the schema, and close the session on every path
pub async fn run_setup<C: Connector>(
    connector: &C,
    cluster: &ClusterConfig,
    catalog: &Catalog,
) -> Result<()> {
    let mut conn = connector.open(cluster).await?;
    let outcome = reset_schema(&mut conn, catalog).await;
    db::release(conn, outcome).await
}
