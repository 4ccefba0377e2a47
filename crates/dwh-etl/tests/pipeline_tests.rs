//! Load-and-transform runner tests against a recording warehouse

mod common;

use common::{example_config, init_test_tracing, redshift_catalog, Call, RecordingConnector};
use dwh_common::{Phase, Table};
use dwh_etl::pipeline::{run_etl, PIPELINE_PHASES};
use dwh_etl::EtlError;

#[tokio::test]
async fn test_pipeline_loads_before_transforming() {
    init_test_tracing();

    let connector = RecordingConnector::new();
    let report = run_etl(&connector, &example_config().cluster, &redshift_catalog())
        .await
        .expect("pipeline succeeds");

    let executed = connector.executed();
    assert_eq!(executed.len(), 7);
    assert!(executed[0].starts_with("COPY staging_events FROM 's3://udacity-dend/log_data'"));
    assert!(executed[1].starts_with("COPY staging_songs FROM 's3://udacity-dend/song_data'"));
    for (sql, table) in executed[2..].iter().zip(Table::ANALYSIS) {
        assert!(sql.starts_with(&format!("INSERT INTO {} (", table.name())), "{}", sql);
    }

    let tables: Vec<Table> = report.steps.iter().map(|s| s.table).collect();
    let mut expected = Table::STAGING.to_vec();
    expected.extend(Table::ANALYSIS);
    assert_eq!(tables, expected);
    assert_eq!(PIPELINE_PHASES, [Phase::Load, Phase::Transform]);
}

#[tokio::test]
async fn test_pipeline_report_counts_rows_per_phase() {
    let connector = RecordingConnector::new();
    let report = run_etl(&connector, &example_config().cluster, &redshift_catalog())
        .await
        .expect("pipeline succeeds");

    // The recording warehouse reports one row per statement
    assert_eq!(report.total_rows(Phase::Load), 2);
    assert_eq!(report.total_rows(Phase::Transform), 5);
    assert_eq!(report.rows_for(Table::Time, Phase::Transform), Some(1));
    assert_eq!(report.rows_for(Table::Time, Phase::Load), None);
}

#[tokio::test]
async fn test_pipeline_commits_each_statement_and_closes() {
    let connector = RecordingConnector::new();
    run_etl(&connector, &example_config().cluster, &redshift_catalog())
        .await
        .expect("pipeline succeeds");

    let calls = connector.calls();
    assert_eq!(calls.len(), 15);
    for pair in calls[..14].chunks(2) {
        assert!(matches!(pair[0], Call::Execute(_)));
        assert_eq!(pair[1], Call::Commit);
    }
    assert_eq!(calls[14], Call::Close);
    assert_eq!(connector.open_handles(), 0);
}

#[tokio::test]
async fn test_pipeline_failure_names_phase_and_index() {
    init_test_tracing();

    let connector = RecordingConnector::failing_on("INSERT INTO users");
    let err = run_etl(&connector, &example_config().cluster, &redshift_catalog())
        .await
        .expect_err("pipeline fails");

    match &err {
        EtlError::Pipeline { phase, index, table, statement, .. } => {
            assert_eq!(*phase, Phase::Transform);
            assert_eq!(*index, 1);
            assert_eq!(*table, Table::Users);
            assert!(statement.starts_with("INSERT INTO users"));
        },
        other => panic!("expected pipeline error, got {:?}", other),
    }

    assert!(err.statement().is_some_and(|sql| sql.starts_with("INSERT INTO users")));
    let message = format!("{:#}", anyhow::Error::from(err));
    assert!(message.contains("transform statement #1"), "{}", message);
    assert_eq!(message.matches("injected failure").count(), 1, "{}", message);

    // Nothing after the failing statement runs; earlier ones stay committed
    let executed = connector.executed();
    assert_eq!(executed.len(), 4);
    assert!(!executed.iter().any(|sql| sql.starts_with("INSERT INTO songs")));
    let commits = connector.calls().iter().filter(|c| **c == Call::Commit).count();
    assert_eq!(commits, 3);
    assert_eq!(connector.open_handles(), 0);
}

#[tokio::test]
async fn test_load_failure_skips_transforms() {
    let connector = RecordingConnector::failing_on("COPY staging_songs");
    let err = run_etl(&connector, &example_config().cluster, &redshift_catalog())
        .await
        .expect_err("pipeline fails");

    assert_eq!(err.phase(), Some(Phase::Load));
    assert!(matches!(err, EtlError::Pipeline { index: 1, table: Table::StagingSongs, .. }));
    assert!(!connector.executed().iter().any(|sql| sql.starts_with("INSERT")));
    assert_eq!(connector.calls().last(), Some(&Call::Close));
}

#[tokio::test]
async fn test_statement_error_wins_over_close_error() {
    let connector = RecordingConnector::failing_on("COPY staging_events").with_failing_close();
    let err = run_etl(&connector, &example_config().cluster, &redshift_catalog())
        .await
        .expect_err("pipeline fails");

    assert!(matches!(err, EtlError::Pipeline { index: 0, table: Table::StagingEvents, .. }));
    assert_eq!(connector.open_handles(), 0);
}

#[tokio::test]
async fn test_pipeline_reports_connection_failure() {
    let connector = RecordingConnector::refusing_connections();
    let err = run_etl(&connector, &example_config().cluster, &redshift_catalog())
        .await
        .expect_err("open fails");

    assert!(matches!(err, EtlError::Connection(_)));
    assert_eq!(err.phase(), None);
    assert!(connector.calls().is_empty());
}

#[tokio::test]
async fn test_repeated_runs_use_fresh_sessions() {
    let connector = RecordingConnector::new();
    let catalog = redshift_catalog();
    let cluster = example_config().cluster;

    run_etl(&connector, &cluster, &catalog).await.expect("first run");
    run_etl(&connector, &cluster, &catalog).await.expect("second run");

    assert_eq!(connector.sessions_opened(), 2);
    assert_eq!(connector.open_handles(), 0);
    assert_eq!(connector.executed().len(), 14);
}
