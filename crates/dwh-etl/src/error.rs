//! Pipeline error types
//!
//! Every failure surfaces immediately; nothing here is retried or suppressed.

use crate::db::DbError;
use dwh_common::{Phase, Table};
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, EtlError>;

#[derive(Error, Debug)]
pub enum EtlError {
    /// Required configuration key missing, empty, or unreadable source
    #[error("Configuration error: {0}. Check dwh.cfg or the DWH_CONFIG path.")]
    Config(String),

    /// Opening or closing the warehouse session failed
    #[error("Warehouse connection error")]
    Connection(#[from] DbError),

    /// The statement catalog is incomplete or out of order
    #[error("Statement catalog is invalid: {0}")]
    Catalog(String),

    /// A drop or create statement failed; earlier statements stay committed
    #[error("Schema reset failed during {phase} of table '{table}'")]
    Schema {
        phase: Phase,
        table: Table,
        statement: String,
        #[source]
        source: DbError,
    },

    /// A load or transform statement failed; earlier statements stay committed
    #[error("Pipeline failed during {phase} statement #{index} (table '{table}')")]
    Pipeline {
        phase: Phase,
        index: usize,
        table: Table,
        statement: String,
        #[source]
        source: DbError,
    },
}

impl EtlError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Phase of the failing statement, if the error came from one
    pub fn phase(&self) -> Option<Phase> {
        match self {
            EtlError::Schema { phase, .. } | EtlError::Pipeline { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// SQL of the failing statement, if the error came from one
    pub fn statement(&self) -> Option<&str> {
        match self {
            EtlError::Schema { statement, .. } | EtlError::Pipeline { statement, .. } => {
                Some(statement)
            },
            _ => None,
        }
    }
}

impl From<config::ConfigError> for EtlError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
