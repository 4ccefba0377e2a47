//! Configuration loading
//!
//! Reads the INI-style `dwh.cfg` once at startup into an immutable [`Config`]
//! that is passed by reference to every component.
//!
//! ```ini
//! [CLUSTER]
//! HOST=examplecluster.abc123.us-west-2.redshift.amazonaws.com
//! DB_NAME=dwh
//! DB_USER=dwhuser
//! DB_PASSWORD=secret
//! DB_PORT=5439
//!
//! [IAM_ROLE]
//! IAM_ROLE_ARN=arn:aws:iam::123456789012:role/dwhRole
//!
//! [S3]
//! BUCKET_REGION=us-west-2
//! LOG_DATA='s3://udacity-dend/log_data'
//! LOG_JSONPATH='s3://udacity-dend/log_json_path.json'
//! SONG_DATA='s3://udacity-dend/song_data'
//! ```

use crate::error::{EtlError, Result};
use config::{File, FileFormat};
use serde::Deserialize;
use std::path::Path;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Config file read when `DWH_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "dwh.cfg";

/// Environment variable overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "DWH_CONFIG";

/// Immutable configuration bundle shared by all components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub cluster: ClusterConfig,
    pub iam_role: IamRoleConfig,
    pub s3: S3Config,
}

/// Warehouse connection parameters (`[CLUSTER]`)
#[derive(Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    pub host: String,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub db_port: u16,
}

impl std::fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("host", &self.host)
            .field("db_name", &self.db_name)
            .field("db_user", &self.db_user)
            .field("db_password", &"<redacted>")
            .field("db_port", &self.db_port)
            .finish()
    }
}

/// Role the warehouse assumes to read from object storage (`[IAM_ROLE]`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IamRoleConfig {
    pub iam_role_arn: String,
}

/// Object storage locations (`[S3]`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub bucket_region: String,
    /// Prefix holding the event-log JSON files
    pub log_data: String,
    /// JSONPaths document mapping event-log fields to staging columns
    pub log_jsonpath: String,
    /// Prefix holding the song-metadata JSON files
    pub song_data: String,
}

// Section and key names are accepted in either case since INI sources differ
// in whether they preserve it.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(rename = "CLUSTER", alias = "cluster")]
    cluster: RawCluster,
    #[serde(rename = "IAM_ROLE", alias = "iam_role")]
    iam_role: RawIamRole,
    #[serde(rename = "S3", alias = "s3")]
    s3: RawS3,
}

#[derive(Deserialize)]
struct RawCluster {
    #[serde(rename = "HOST", alias = "host")]
    host: String,
    #[serde(rename = "DB_NAME", alias = "db_name")]
    db_name: String,
    #[serde(rename = "DB_USER", alias = "db_user")]
    db_user: String,
    #[serde(rename = "DB_PASSWORD", alias = "db_password")]
    db_password: String,
    #[serde(rename = "DB_PORT", alias = "db_port")]
    db_port: String,
}

#[derive(Deserialize)]
struct RawIamRole {
    #[serde(rename = "IAM_ROLE_ARN", alias = "iam_role_arn")]
    iam_role_arn: String,
}

#[derive(Deserialize)]
struct RawS3 {
    #[serde(rename = "BUCKET_REGION", alias = "bucket_region")]
    bucket_region: String,
    #[serde(rename = "LOG_DATA", alias = "log_data")]
    log_data: String,
    #[serde(rename = "LOG_JSONPATH", alias = "log_jsonpath")]
    log_jsonpath: String,
    #[serde(rename = "SONG_DATA", alias = "song_data")]
    song_data: String,
}

impl Config {
    /// Load configuration from `$DWH_CONFIG`, falling back to `./dwh.cfg`
    ///
    /// A `.env` file in the working directory is honored first.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(path)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            EtlError::config(format!("cannot read config file '{}': {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), "Read configuration file");
        Self::from_ini_str(&text)
    }

    /// Parse configuration from INI text
    ///
    /// Values are taken literally: a backslash is an ordinary character.
    pub fn from_ini_str(text: &str) -> Result<Self> {
        // The INI source unescapes `\x` sequences; doubling every backslash
        // makes that a no-op.
        let literal = text.replace('\\', "\\\\");

        let raw: RawConfig = config::Config::builder()
            .add_source(File::from_str(&literal, FileFormat::Ini))
            .build()?
            .try_deserialize()?;

        let config = Config {
            cluster: ClusterConfig {
                host: required("CLUSTER", "HOST", raw.cluster.host)?,
                db_name: required("CLUSTER", "DB_NAME", raw.cluster.db_name)?,
                db_user: required("CLUSTER", "DB_USER", raw.cluster.db_user)?,
                db_password: required("CLUSTER", "DB_PASSWORD", raw.cluster.db_password)?,
                db_port: parse_port(&required("CLUSTER", "DB_PORT", raw.cluster.db_port)?)?,
            },
            iam_role: IamRoleConfig {
                iam_role_arn: required("IAM_ROLE", "IAM_ROLE_ARN", raw.iam_role.iam_role_arn)?,
            },
            s3: S3Config {
                bucket_region: required("S3", "BUCKET_REGION", raw.s3.bucket_region)?,
                log_data: required("S3", "LOG_DATA", raw.s3.log_data)?,
                log_jsonpath: required("S3", "LOG_JSONPATH", raw.s3.log_jsonpath)?,
                song_data: required("S3", "SONG_DATA", raw.s3.song_data)?,
            },
        };

        Ok(config)
    }
}

/// Trim whitespace and one pair of surrounding quotes; reject empty values
fn required(section: &str, key: &str, value: String) -> Result<String> {
    let trimmed = value.trim();
    let unquoted = ['\'', '"']
        .into_iter()
        .find_map(|q| {
            trimmed
                .strip_prefix(q)
                .and_then(|rest| rest.strip_suffix(q))
        })
        .unwrap_or(trimmed)
        .trim();

    if unquoted.is_empty() {
        return Err(EtlError::config(format!("[{}] {} must not be empty", section, key)));
    }

    Ok(unquoted.to_string())
}

fn parse_port(value: &str) -> Result<u16> {
    match value.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(EtlError::config(format!(
            "[CLUSTER] DB_PORT '{}' is not a valid port number",
            value
        ))),
    }
}

/// Example configuration shipped at the repository root
#[cfg(test)]
pub(crate) const EXAMPLE_CONFIG: &str = include_str!("../../../dwh.cfg.example");
