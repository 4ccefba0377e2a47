//! Warehouse connection management
//!
//! The pipeline talks to the warehouse through a single session at a time:
//! [`Connector::open`] establishes it, [`Warehouse::execute`] runs one
//! statement, [`Warehouse::commit`] persists it and [`Warehouse::close`]
//! releases it. Callers wrap the work between open and close with
//! [`release`] so the session is closed on every exit path.

mod postgres;

pub use postgres::{connect_options, PgConnector, PgWarehouse};

use crate::config::ClusterConfig;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Warehouse operation errors with contextual information
#[derive(Error, Debug)]
pub enum DbError {
    /// SQL statement or protocol error reported by the driver
    #[error("Database query failed")]
    Sqlx(#[from] sqlx::Error),

    /// The session could not be established
    #[error("Could not connect to {host}:{port}/{database} (check the [CLUSTER] settings in dwh.cfg)")]
    Connect {
        host: String,
        port: u16,
        database: String,
        #[source]
        source: sqlx::Error,
    },
}

pub type DbResult<T> = Result<T, DbError>;

/// One open warehouse session
///
/// Sessions are driven from a single task, so the returned futures are not
/// required to be `Send`.
#[async_trait(?Send)]
pub trait Warehouse: Send {
    /// Run a single statement and return the number of rows it affected
    async fn execute(&mut self, statement: &str) -> DbResult<u64>;

    /// Persist everything executed since the last commit
    async fn commit(&mut self) -> DbResult<()>;

    /// Release the session; valid after a failed `execute`
    async fn close(self) -> DbResult<()>
    where
        Self: Sized;
}

/// Opens warehouse sessions
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: Warehouse;

    async fn open(&self, cluster: &ClusterConfig) -> DbResult<Self::Connection>;
}

/// Execute one statement and commit it immediately
pub async fn execute_committed<W: Warehouse>(conn: &mut W, statement: &str) -> DbResult<(u64, Duration)> {
    let started = Instant::now();
    let rows = conn.execute(statement).await?;
    conn.commit().await?;
    Ok((rows, started.elapsed()))
}

/// Close `conn` and hand back `outcome`
///
/// A close failure only surfaces when the work itself succeeded; otherwise it
/// is logged and the original error wins.
pub async fn release<W: Warehouse, T>(conn: W, outcome: crate::Result<T>) -> crate::Result<T> {
    let closed = conn.close().await;

    match (outcome, closed) {
        (Ok(value), Ok(())) => {
            tracing::debug!("Warehouse session closed");
            Ok(value)
        },
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            tracing::warn!(error = ?close_err, "Failed to close warehouse session after error");
            Err(e)
        },
    }
}
