//! Bulk-load statements
//!
//! `COPY` reads newline-delimited JSON straight from S3 into a staging table.
//! Event logs need an explicit JSONPaths document; song metadata maps by
//! field name (`'auto'`).

use crate::config::Config;

/// Render `value` as a single-quoted SQL string literal
pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn copy_json(table: &str, source: &str, config: &Config, json_format: &str) -> String {
    format!(
        "COPY {table} FROM {source}\n     credentials {credentials}\n     format as json {json_format}\n     STATUPDATE ON\n     region {region};",
        table = table,
        source = quote_literal(source),
        credentials = quote_literal(&format!("aws_iam_role={}", config.iam_role.iam_role_arn)),
        json_format = json_format,
        region = quote_literal(&config.s3.bucket_region),
    )
}

pub(crate) fn staging_events(config: &Config) -> String {
    copy_json(
        "staging_events",
        &config.s3.log_data,
        config,
        &quote_literal(&config.s3.log_jsonpath),
    )
}

pub(crate) fn staging_songs(config: &Config) -> String {
    copy_json("staging_songs", &config.s3.song_data, config, "'auto'")
}
