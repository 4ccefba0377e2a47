//! Common test utilities for dwh-etl integration tests
//!
//! - [`RecordingConnector`]: in-memory warehouse that records every call and
//!   tracks open sessions, with optional injected failures
//! - [`TestPostgres`]: throwaway Postgres container for running the catalog's
//!   SQL for real (requires Docker)
//! - Fixtures for `staging_events` and `staging_songs`

#![allow(dead_code)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use dwh_etl::catalog::{Catalog, Dialect};
use dwh_etl::config::ClusterConfig;
use dwh_etl::db::{connect_options, Connector, DbError, DbResult, PgWarehouse, Warehouse};
use dwh_etl::Config;
use sqlx::{Connection, PgConnection};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres;
use tracing::info;

pub const EXAMPLE_CONFIG: &str = include_str!("../../../../dwh.cfg.example");

/// Initialize tracing for tests; repeated calls are ignored
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dwh_etl=debug,sqlx=warn")
        .with_test_writer()
        .try_init();
}

pub fn example_config() -> Config {
    Config::from_ini_str(EXAMPLE_CONFIG).expect("example config parses")
}

pub fn redshift_catalog() -> Catalog {
    Catalog::new(&example_config())
}

// ============================================================================
// Recording warehouse
// ============================================================================

/// Call observed by a [`RecordingWarehouse`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Execute(String),
    Commit,
    Close,
}

#[derive(Clone, Default)]
pub struct RecordingConnector {
    calls: Arc<Mutex<Vec<Call>>>,
    open: Arc<AtomicUsize>,
    opened_total: Arc<AtomicUsize>,
    fail_on: Option<String>,
    refuse_open: bool,
    fail_close: bool,
}

impl RecordingConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any statement containing `fragment`
    pub fn failing_on(fragment: impl Into<String>) -> Self {
        Self { fail_on: Some(fragment.into()), ..Self::default() }
    }

    pub fn refusing_connections() -> Self {
        Self { refuse_open: true, ..Self::default() }
    }

    pub fn with_failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// SQL of every executed statement, in order
    pub fn executed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Execute(sql) => Some(sql),
                _ => None,
            })
            .collect()
    }

    pub fn open_handles(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn sessions_opened(&self) -> usize {
        self.opened_total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for RecordingConnector {
    type Connection = RecordingWarehouse;

    async fn open(&self, _cluster: &ClusterConfig) -> DbResult<RecordingWarehouse> {
        if self.refuse_open {
            return Err(DbError::Sqlx(sqlx::Error::Protocol("connection refused".to_string())));
        }

        self.open.fetch_add(1, Ordering::SeqCst);
        self.opened_total.fetch_add(1, Ordering::SeqCst);

        Ok(RecordingWarehouse {
            calls: Arc::clone(&self.calls),
            open: Arc::clone(&self.open),
            fail_on: self.fail_on.clone(),
            fail_close: self.fail_close,
        })
    }
}

pub struct RecordingWarehouse {
    calls: Arc<Mutex<Vec<Call>>>,
    open: Arc<AtomicUsize>,
    fail_on: Option<String>,
    fail_close: bool,
}

impl RecordingWarehouse {
    fn record(&self, call: Call) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

#[async_trait(?Send)]
impl Warehouse for RecordingWarehouse {
    async fn execute(&mut self, statement: &str) -> DbResult<u64> {
        self.record(Call::Execute(statement.to_string()));

        match self.fail_on {
            Some(ref fragment) if statement.contains(fragment.as_str()) => Err(DbError::Sqlx(
                sqlx::Error::Protocol(format!("injected failure on '{}'", fragment)),
            )),
            _ => Ok(1),
        }
    }

    async fn commit(&mut self) -> DbResult<()> {
        self.record(Call::Commit);
        Ok(())
    }

    async fn close(self) -> DbResult<()> {
        self.record(Call::Close);
        self.open.fetch_sub(1, Ordering::SeqCst);

        if self.fail_close {
            return Err(DbError::Sqlx(sqlx::Error::Protocol("close failed".to_string())));
        }
        Ok(())
    }
}

// ============================================================================
// PostgreSQL Test Container
// ============================================================================

/// Postgres container wrapper exposing the cluster settings to reach it
pub struct TestPostgres {
    _container: ContainerAsync<Postgres>,
    cluster: ClusterConfig,
}

impl TestPostgres {
    pub async fn start() -> Result<Self> {
        info!("Starting PostgreSQL test container...");

        let container = Postgres::default()
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let cluster = ClusterConfig {
            host: host.to_string(),
            db_name: "postgres".to_string(),
            db_user: "postgres".to_string(),
            db_password: "postgres".to_string(),
            db_port: port,
        };

        Ok(Self { _container: container, cluster })
    }

    pub fn cluster(&self) -> &ClusterConfig {
        &self.cluster
    }

    /// Session with the same commit semantics the binaries use
    pub async fn warehouse(&self) -> Result<PgWarehouse> {
        PgWarehouse::connect(&self.cluster)
            .await
            .context("Failed to open warehouse session")
    }

    /// Plain autocommit connection for fixtures and assertions
    pub async fn connection(&self) -> Result<PgConnection> {
        PgConnection::connect_with(&connect_options(&self.cluster))
            .await
            .context("Failed to connect to PostgreSQL")
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::with_dialect(&example_config(), Dialect::Postgres)
    }
}

// ============================================================================
// Staging fixtures
// ============================================================================

/// One `staging_events` row; unset columns stay NULL
#[derive(Debug, Clone)]
pub struct EventFixture {
    pub user_id: Option<i32>,
    pub first_name: &'static str,
    pub last_name: &'static str,
    pub gender: &'static str,
    pub level: &'static str,
    pub page: &'static str,
    pub artist: Option<&'static str>,
    pub song: Option<&'static str>,
    pub session_id: i32,
    pub ts: i64,
}

impl EventFixture {
    /// A `NextSong` play by user 10 of Elena's "Setanta matins"
    pub fn play(ts: i64) -> Self {
        Self {
            user_id: Some(10),
            first_name: "Sylvie",
            last_name: "Cruz",
            gender: "F",
            level: "free",
            page: "NextSong",
            artist: Some("Elena"),
            song: Some("Setanta matins"),
            session_id: 9,
            ts,
        }
    }

    pub fn user(mut self, user_id: i32, first_name: &'static str, level: &'static str) -> Self {
        self.user_id = Some(user_id);
        self.first_name = first_name;
        self.level = level;
        self
    }

    pub fn page(mut self, page: &'static str) -> Self {
        self.page = page;
        self
    }

    pub fn song(mut self, artist: &'static str, song: &'static str) -> Self {
        self.artist = Some(artist);
        self.song = Some(song);
        self
    }

    pub async fn insert(&self, conn: &mut PgConnection) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO staging_events (
                artist, firstName, gender, lastName, level, location,
                page, sessionId, song, ts, userAgent, userId
            )
            VALUES ($1, $2, $3, $4, $5, 'Eugene, OR', $6, $7, $8, $9, 'Mozilla/5.0', $10)
            "#,
        )
        .bind(self.artist)
        .bind(self.first_name)
        .bind(self.gender)
        .bind(self.last_name)
        .bind(self.level)
        .bind(self.page)
        .bind(self.session_id)
        .bind(self.song)
        .bind(self.ts)
        .bind(self.user_id)
        .execute(&mut *conn)
        .await
        .context("Failed to insert staging event")?;
        Ok(())
    }
}

/// One `staging_songs` row
#[derive(Debug, Clone)]
pub struct SongFixture {
    pub song_id: &'static str,
    pub title: &'static str,
    pub artist_id: &'static str,
    pub artist_name: &'static str,
    pub artist_location: Option<&'static str>,
    pub year: i32,
}

impl SongFixture {
    pub fn elena() -> Self {
        Self {
            song_id: "SOZCTXZ12AB0182364",
            title: "Setanta matins",
            artist_id: "AR5KOSW1187FB35FF4",
            artist_name: "Elena",
            artist_location: Some("Dubai UAE"),
            year: 0,
        }
    }

    pub async fn insert(&self, conn: &mut PgConnection) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO staging_songs (
                num_songs, artist_id, artist_location, artist_name,
                song_id, title, duration, year
            )
            VALUES (1, $1, $2, $3, $4, $5, 269.58322, $6)
            "#,
        )
        .bind(self.artist_id)
        .bind(self.artist_location)
        .bind(self.artist_name)
        .bind(self.song_id)
        .bind(self.title)
        .bind(self.year)
        .execute(&mut *conn)
        .await
        .context("Failed to insert staging song")?;
        Ok(())
    }
}

pub async fn count(conn: &mut PgConnection, table: &str) -> Result<i64> {
    let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM \"{}\"", table))
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("Failed to count rows in {}", table))?;
    Ok(n)
}
