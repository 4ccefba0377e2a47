//! DWH Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging setup, and error handling for the DWH workspace.
//!
//! # Overview
//!
//! - **Logging**: tracing subscriber setup driven by `LOG_*` environment variables
//! - **Types**: the phase and table identifiers every statement is tagged with
//! - **Error Handling**: error and result types for parsing those identifiers
//!
//! # Example
//!
//! ```no_run
//! use dwh_common::{Phase, Table};
//!
//! let phase: Phase = "transform".parse().unwrap();
//! assert_eq!(phase, Phase::Transform);
//! assert!(Table::StagingEvents.is_staging());
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{DwhError, Result};
pub use types::{Phase, Table};
