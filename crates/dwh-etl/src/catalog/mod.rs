//! Statement catalog
//!
//! The complete, ordered set of SQL statements the pipeline runs, built once
//! from static templates and the configuration bundle. Every statement is
//! tagged with the [`Phase`] it runs in and the [`Table`] it touches:
//!
//! | Phase | Tables, in order |
//! |---|---|
//! | drop | staging_events, staging_songs, songplays, users, songs, artists, time |
//! | create | staging_events, staging_songs, songplays, users, songs, artists, time |
//! | load | staging_events, staging_songs |
//! | transform | songplays, users, songs, artists, time |

mod copy;
mod tables;
mod transform;

use crate::config::Config;
use crate::error::{EtlError, Result};
use dwh_common::{Phase, Table};
use serde::Serialize;

/// SQL dialect the DDL is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Redshift, with distribution and sort keys
    #[default]
    Redshift,
    /// Stock Postgres, for local verification of schema and transforms
    Postgres,
}

impl std::str::FromStr for Dialect {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "redshift" => Ok(Dialect::Redshift),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            _ => Err(EtlError::Catalog(format!("unknown dialect '{}'", s))),
        }
    }
}

/// One fully rendered statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub phase: Phase,
    pub table: Table,
    pub sql: String,
}

impl Statement {
    fn new(phase: Phase, table: Table, sql: impl Into<String>) -> Self {
        Self { phase, table, sql: sql.into() }
    }
}

/// Tables each phase must cover, in execution order
pub fn expected_tables(phase: Phase) -> &'static [Table] {
    match phase {
        Phase::Drop | Phase::Create => &Table::ALL,
        Phase::Load => &Table::STAGING,
        Phase::Transform => &Table::ANALYSIS,
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    dialect: Dialect,
    statements: Vec<Statement>,
}

impl Catalog {
    /// Build the Redshift catalog
    pub fn new(config: &Config) -> Self {
        Self::with_dialect(config, Dialect::Redshift)
    }

    pub fn with_dialect(config: &Config, dialect: Dialect) -> Self {
        let mut statements = Vec::with_capacity(21);

        statements.extend(
            Table::ALL
                .iter()
                .map(|&t| Statement::new(Phase::Drop, t, tables::definition(t).drop_sql())),
        );
        statements.extend(
            Table::ALL
                .iter()
                .map(|&t| Statement::new(Phase::Create, t, tables::definition(t).create_sql(dialect))),
        );
        statements.push(Statement::new(Phase::Load, Table::StagingEvents, copy::staging_events(config)));
        statements.push(Statement::new(Phase::Load, Table::StagingSongs, copy::staging_songs(config)));
        statements.extend(
            transform::TRANSFORMS
                .iter()
                .map(|&(t, sql)| Statement::new(Phase::Transform, t, sql)),
        );

        Self { dialect, statements }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// All statements, phases in execution order
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn phase(&self, phase: Phase) -> impl Iterator<Item = &Statement> + '_ {
        self.statements.iter().filter(move |s| s.phase == phase)
    }

    pub fn drop_statements(&self) -> Vec<&Statement> {
        self.phase(Phase::Drop).collect()
    }

    pub fn create_statements(&self) -> Vec<&Statement> {
        self.phase(Phase::Create).collect()
    }

    pub fn load_statements(&self) -> Vec<&Statement> {
        self.phase(Phase::Load).collect()
    }

    pub fn transform_statements(&self) -> Vec<&Statement> {
        self.phase(Phase::Transform).collect()
    }

    /// Check that every phase covers exactly its tables, in order
    pub fn validate(&self) -> Result<()> {
        for phase in Phase::ALL {
            let actual: Vec<Table> = self.phase(phase).map(|s| s.table).collect();
            let expected = expected_tables(phase);

            if actual != expected {
                return Err(EtlError::Catalog(format!(
                    "{} phase covers {:?}, expected {:?}",
                    phase, actual, expected
                )));
            }
        }

        if let Some(empty) = self.statements.iter().find(|s| s.sql.trim().is_empty()) {
            return Err(EtlError::Catalog(format!(
                "{} statement for '{}' is empty",
                empty.phase, empty.table
            )));
        }

        Ok(())
    }

    /// Render one phase as a SQL script
    pub fn render(&self, phase: Phase) -> String {
        let mut script = String::new();
        for statement in self.phase(phase) {
            script.push_str(&format!("-- {} {}\n{}\n\n", statement.phase, statement.table, statement.sql));
        }
        script
    }
}
