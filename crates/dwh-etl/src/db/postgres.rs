//! Postgres wire-protocol session, used for Redshift and stock Postgres
//!
//! Statements go through `raw_sql`, so they are sent as simple queries and
//! never prepared; Redshift's `COPY ... credentials` passes through verbatim.

use super::{Connector, DbError, DbResult, Warehouse};
use crate::config::ClusterConfig;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;

/// Application name reported to the warehouse
const APPLICATION_NAME: &str = "dwh-etl";

pub fn connect_options(cluster: &ClusterConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&cluster.host)
        .port(cluster.db_port)
        .database(&cluster.db_name)
        .username(&cluster.db_user)
        .password(&cluster.db_password)
        .application_name(APPLICATION_NAME)
}

/// Opens [`PgWarehouse`] sessions
#[derive(Debug, Clone, Copy, Default)]
pub struct PgConnector;

#[async_trait]
impl Connector for PgConnector {
    type Connection = PgWarehouse;

    async fn open(&self, cluster: &ClusterConfig) -> DbResult<PgWarehouse> {
        PgWarehouse::connect(cluster).await
    }
}

/// A single warehouse session with explicit commits
///
/// The first statement after a commit opens a transaction; [`commit`]
/// ends it.
///
/// [`commit`]: Warehouse::commit
pub struct PgWarehouse {
    conn: PgConnection,
    in_transaction: bool,
}

impl PgWarehouse {
    pub async fn connect(cluster: &ClusterConfig) -> DbResult<Self> {
        let conn = PgConnection::connect_with(&connect_options(cluster))
            .await
            .map_err(|source| DbError::Connect {
                host: cluster.host.clone(),
                port: cluster.db_port,
                database: cluster.db_name.clone(),
                source,
            })?;

        tracing::info!(
            host = %cluster.host,
            port = cluster.db_port,
            database = %cluster.db_name,
            "Warehouse session opened"
        );

        Ok(Self { conn, in_transaction: false })
    }

    async fn rollback(&mut self) {
        if let Err(e) = sqlx::raw_sql("ROLLBACK").execute(&mut self.conn).await {
            tracing::warn!(error = %e, "Rollback after failed statement did not complete");
        }
        self.in_transaction = false;
    }
}

#[async_trait(?Send)]
impl Warehouse for PgWarehouse {
    async fn execute(&mut self, statement: &str) -> DbResult<u64> {
        if !self.in_transaction {
            sqlx::raw_sql("BEGIN").execute(&mut self.conn).await?;
            self.in_transaction = true;
        }

        match sqlx::raw_sql(statement).execute(&mut self.conn).await {
            Ok(result) => Ok(result.rows_affected()),
            Err(e) => {
                self.rollback().await;
                Err(e.into())
            },
        }
    }

    async fn commit(&mut self) -> DbResult<()> {
        if self.in_transaction {
            sqlx::raw_sql("COMMIT").execute(&mut self.conn).await?;
            self.in_transaction = false;
        }
        Ok(())
    }

    async fn close(self) -> DbResult<()> {
        // An open transaction is discarded by the server when the session ends.
        self.conn.close().await?;
        Ok(())
    }
}
