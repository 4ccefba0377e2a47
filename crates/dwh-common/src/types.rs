//! Common types used across DWH

use crate::error::{DwhError, Result};
use serde::{Deserialize, Serialize};

/// Execution phase a statement belongs to
///
/// Setup runs `Drop` then `Create`; the batch job runs `Load` then `Transform`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Drop staging and analysis tables
    Drop,
    /// Create staging and analysis tables
    Create,
    /// Bulk-load staging tables from object storage
    Load,
    /// Populate analysis tables from staging tables
    Transform,
}

impl Phase {
    /// All phases in execution order
    pub const ALL: [Phase; 4] = [Phase::Drop, Phase::Create, Phase::Load, Phase::Transform];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Drop => "drop",
            Phase::Create => "create",
            Phase::Load => "load",
            Phase::Transform => "transform",
        }
    }
}

impl std::str::FromStr for Phase {
    type Err = DwhError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "drop" => Ok(Phase::Drop),
            "create" => Ok(Phase::Create),
            "load" | "copy" => Ok(Phase::Load),
            "transform" | "insert" => Ok(Phase::Transform),
            _ => Err(DwhError::UnknownPhase(s.to_string())),
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Warehouse table managed by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    StagingEvents,
    StagingSongs,
    Songplays,
    Users,
    Songs,
    Artists,
    Time,
}

impl Table {
    /// Every table, in the order they are dropped and created
    pub const ALL: [Table; 7] = [
        Table::StagingEvents,
        Table::StagingSongs,
        Table::Songplays,
        Table::Users,
        Table::Songs,
        Table::Artists,
        Table::Time,
    ];

    /// Staging tables, in load order
    pub const STAGING: [Table; 2] = [Table::StagingEvents, Table::StagingSongs];

    /// Analysis tables, in transform order
    pub const ANALYSIS: [Table; 5] = [
        Table::Songplays,
        Table::Users,
        Table::Songs,
        Table::Artists,
        Table::Time,
    ];

    /// Table name as it appears in SQL
    pub fn name(self) -> &'static str {
        match self {
            Table::StagingEvents => "staging_events",
            Table::StagingSongs => "staging_songs",
            Table::Songplays => "songplays",
            Table::Users => "users",
            Table::Songs => "songs",
            Table::Artists => "artists",
            Table::Time => "time",
        }
    }

    pub fn is_staging(self) -> bool {
        matches!(self, Table::StagingEvents | Table::StagingSongs)
    }

    /// Whether the table is a deduplicated dimension of the star schema
    pub fn is_dimension(self) -> bool {
        matches!(self, Table::Users | Table::Songs | Table::Artists | Table::Time)
    }
}

impl std::str::FromStr for Table {
    type Err = DwhError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Table::ALL
            .into_iter()
            .find(|table| table.name() == wanted)
            .ok_or_else(|| DwhError::UnknownTable(s.to_string()))
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
