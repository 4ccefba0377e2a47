//! Table definitions for the staging and analysis schemas
//!
//! Each table is described once and rendered to DDL per [`Dialect`]. Redshift
//! gets its physical layout hints (distribution style, distribution and sort
//! keys, identity columns); Postgres gets the same columns without them.

use super::Dialect;
use dwh_common::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnKey {
    None,
    /// Auto-generated surrogate key starting at 0
    Identity,
    DistKey,
    SortKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DistStyle {
    /// Round-robin across slices
    Even,
    /// Full copy on every node
    All,
}

#[derive(Debug)]
pub(crate) struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub nullable: bool,
    pub key: ColumnKey,
}

#[derive(Debug)]
pub(crate) struct TableDef {
    pub table: Table,
    pub columns: &'static [ColumnDef],
    pub primary_key: Option<&'static str>,
    pub dist_style: Option<DistStyle>,
}

const fn col(name: &'static str, sql_type: &'static str, nullable: bool) -> ColumnDef {
    ColumnDef { name, sql_type, nullable, key: ColumnKey::None }
}

const fn keyed(name: &'static str, sql_type: &'static str, key: ColumnKey) -> ColumnDef {
    ColumnDef { name, sql_type, nullable: false, key }
}

const NULL: bool = true;
const NOT_NULL: bool = false;

// Event-log columns stay loosely typed: the source JSON is not validated.
const STAGING_EVENTS: TableDef = TableDef {
    table: Table::StagingEvents,
    columns: &[
        col("artist", "VARCHAR", NULL),
        col("auth", "VARCHAR", NULL),
        col("firstName", "VARCHAR", NULL),
        col("gender", "VARCHAR", NULL),
        col("itemInSession", "VARCHAR", NULL),
        col("lastName", "VARCHAR", NULL),
        col("length", "VARCHAR", NULL),
        col("level", "VARCHAR", NULL),
        col("location", "VARCHAR", NULL),
        col("method", "VARCHAR", NULL),
        col("page", "VARCHAR", NULL),
        col("registration", "VARCHAR", NULL),
        col("sessionId", "INT", NOT_NULL),
        col("song", "VARCHAR", NULL),
        col("status", "INT", NULL),
        col("ts", "BIGINT", NOT_NULL),
        col("userAgent", "VARCHAR", NULL),
        col("userId", "INT", NULL),
    ],
    primary_key: None,
    dist_style: Some(DistStyle::Even),
};

const STAGING_SONGS: TableDef = TableDef {
    table: Table::StagingSongs,
    columns: &[
        col("num_songs", "INT", NULL),
        col("artist_id", "VARCHAR", NOT_NULL),
        col("artist_latitude", "DECIMAL(10,8)", NULL),
        col("artist_longitude", "DECIMAL(11,8)", NULL),
        col("artist_location", "VARCHAR", NULL),
        col("artist_name", "VARCHAR", NOT_NULL),
        col("song_id", "VARCHAR", NOT_NULL),
        col("title", "VARCHAR", NOT_NULL),
        col("duration", "DECIMAL(10,6)", NULL),
        col("year", "INT", NULL),
    ],
    primary_key: None,
    dist_style: Some(DistStyle::Even),
};

// A user's plays are co-located through the user_id distribution key.
const SONGPLAYS: TableDef = TableDef {
    table: Table::Songplays,
    columns: &[
        keyed("songplay_id", "INTEGER", ColumnKey::Identity),
        col("start_time", "TIMESTAMP", NOT_NULL),
        keyed("user_id", "VARCHAR", ColumnKey::DistKey),
        col("level", "VARCHAR", NOT_NULL),
        col("song_id", "VARCHAR", NOT_NULL),
        col("artist_id", "VARCHAR", NOT_NULL),
        keyed("session_id", "VARCHAR", ColumnKey::SortKey),
        col("location", "VARCHAR", NULL),
        col("user_agent", "VARCHAR", NULL),
    ],
    primary_key: Some("songplay_id"),
    dist_style: None,
};

const USERS: TableDef = TableDef {
    table: Table::Users,
    columns: &[
        keyed("user_id", "INTEGER", ColumnKey::SortKey),
        col("first_name", "VARCHAR", NOT_NULL),
        col("last_name", "VARCHAR", NOT_NULL),
        col("gender", "VARCHAR", NOT_NULL),
        col("level", "VARCHAR", NOT_NULL),
    ],
    primary_key: Some("user_id"),
    dist_style: Some(DistStyle::All),
};

const SONGS: TableDef = TableDef {
    table: Table::Songs,
    columns: &[
        keyed("song_id", "VARCHAR", ColumnKey::SortKey),
        col("title", "VARCHAR", NOT_NULL),
        keyed("artist_id", "VARCHAR", ColumnKey::DistKey),
        col("year", "INTEGER", NULL),
        col("duration", "DECIMAL(10,6)", NULL),
    ],
    primary_key: Some("song_id"),
    dist_style: None,
};

const ARTISTS: TableDef = TableDef {
    table: Table::Artists,
    columns: &[
        keyed("artist_id", "VARCHAR", ColumnKey::SortKey),
        col("name", "VARCHAR", NOT_NULL),
        col("location", "VARCHAR", NULL),
        col("latitude", "DECIMAL(10,8)", NULL),
        col("longitude", "DECIMAL(11,8)", NULL),
    ],
    primary_key: Some("artist_id"),
    dist_style: Some(DistStyle::All),
};

const TIME: TableDef = TableDef {
    table: Table::Time,
    columns: &[
        keyed("start_time", "TIMESTAMP", ColumnKey::SortKey),
        col("hour", "SMALLINT", NOT_NULL),
        col("day", "SMALLINT", NOT_NULL),
        col("week", "SMALLINT", NOT_NULL),
        col("month", "SMALLINT", NOT_NULL),
        col("year", "SMALLINT", NOT_NULL),
        col("weekday", "SMALLINT", NOT_NULL),
    ],
    primary_key: Some("start_time"),
    dist_style: Some(DistStyle::All),
};

pub(crate) fn definition(table: Table) -> &'static TableDef {
    match table {
        Table::StagingEvents => &STAGING_EVENTS,
        Table::StagingSongs => &STAGING_SONGS,
        Table::Songplays => &SONGPLAYS,
        Table::Users => &USERS,
        Table::Songs => &SONGS,
        Table::Artists => &ARTISTS,
        Table::Time => &TIME,
    }
}

impl TableDef {
    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {};", self.table.name())
    }

    pub fn create_sql(&self, dialect: Dialect) -> String {
        let width = self.columns.iter().map(|c| c.name.len()).max().unwrap_or(0);

        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|column| format!("    {:<width$}  {}", column.name, column.render(dialect)))
            .collect();

        if let Some(pk) = self.primary_key {
            lines.push(format!("    PRIMARY KEY ({})", pk));
        }

        let suffix = match (dialect, self.dist_style) {
            (Dialect::Redshift, Some(DistStyle::Even)) => " DISTSTYLE EVEN",
            (Dialect::Redshift, Some(DistStyle::All)) => " DISTSTYLE ALL",
            _ => "",
        };

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n){};",
            self.table.name(),
            lines.join(",\n"),
            suffix
        )
    }
}

impl ColumnDef {
    fn render(&self, dialect: Dialect) -> String {
        let nullability = if self.nullable { "NULL" } else { "NOT NULL" };

        match (dialect, self.key) {
            (Dialect::Redshift, ColumnKey::Identity) => {
                format!("{} IDENTITY(0,1) {}", self.sql_type, nullability)
            },
            (Dialect::Postgres, ColumnKey::Identity) => format!(
                "{} GENERATED ALWAYS AS IDENTITY (START WITH 0 MINVALUE 0) {}",
                self.sql_type, nullability
            ),
            (Dialect::Redshift, ColumnKey::DistKey) => {
                format!("{} {} DISTKEY", self.sql_type, nullability)
            },
            (Dialect::Redshift, ColumnKey::SortKey) => {
                format!("{} {} SORTKEY", self.sql_type, nullability)
            },
            _ => format!("{} {}", self.sql_type, nullability),
        }
    }
}
