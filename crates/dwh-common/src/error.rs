//! Error types for DWH

use thiserror::Error;

/// Result type alias for DWH common operations
pub type Result<T> = std::result::Result<T, DwhError>;

/// Main error type for the shared crate
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DwhError {
    #[error("Unknown phase: '{0}'. Expected one of: drop, create, load, transform")]
    UnknownPhase(String),

    #[error("Unknown table: '{0}'")]
    UnknownTable(String),
}
