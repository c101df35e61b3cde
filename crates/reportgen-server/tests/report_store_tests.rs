//! PostgreSQL report repository tests
//!
//! **Requirements**:
//! - PostgreSQL must be running and `DATABASE_URL` must point at it
//! - Tests are skipped if `DATABASE_URL` is not configured
//!
//! **Running tests**:
//! ```bash
//! DATABASE_URL=postgresql://localhost/reportgen_test cargo test --test report_store_tests
//! ```

use chrono::{Duration, Utc};
use reportgen_common::types::ReportStatus;
use reportgen_server::db::{create_pool, DbConfig, DbError, PgReportStore, ReportStore};
use uuid::Uuid;

/// Connect and migrate if a database is available
async fn setup_store() -> Option<PgReportStore> {
    let url = std::env::var("DATABASE_URL").ok()?;

    let config = DbConfig {
        url,
        max_connections: 2,
        min_connections: 0,
        connect_timeout_secs: 5,
        idle_timeout_secs: None,
    };

    let pool = match create_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            return None;
        },
    };

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("migrations apply");

    Some(PgReportStore::new(pool))
}

#[tokio::test]
async fn test_create_and_load() {
    let Some(store) = setup_store().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let user_id = Uuid::new_v4();
    let created = store.create(user_id, "monsters").await.unwrap();
    assert_eq!(created.user_id, user_id);
    assert_eq!(created.status(), ReportStatus::Pending);

    let loaded = store.by_primary_key(created.id, user_id).await.unwrap();
    assert_eq!(loaded.id, created.id);
    assert_eq!(loaded.report_type, "monsters");
}

#[tokio::test]
async fn test_load_is_scoped_to_owner() {
    let Some(store) = setup_store().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let created = store.create(Uuid::new_v4(), "monsters").await.unwrap();

    let result = store.by_primary_key(created.id, Uuid::new_v4()).await;
    assert!(matches!(result, Err(DbError::NotFound(_))));
}

#[tokio::test]
async fn test_update_writes_lifecycle_columns() {
    let Some(store) = setup_store().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let mut report = store.create(Uuid::new_v4(), "monsters").await.unwrap();
    let now = Utc::now();
    report.mark_started(now);
    report.mark_completed("users/a/reports/b.csv.gz", now);
    report.download_url = Some("https://example.com/b".to_string());
    report.download_url_expires_at = Some(now + Duration::seconds(10));

    let updated = store.update(&report).await.unwrap();
    assert_eq!(updated.status(), ReportStatus::Completed);
    assert_eq!(updated.output_file_path.as_deref(), Some("users/a/reports/b.csv.gz"));

    let loaded = store.by_primary_key(report.id, report.user_id).await.unwrap();
    assert_eq!(loaded.download_url, report.download_url);
    assert!(loaded.completed_at.is_some());
    assert_eq!(loaded.created_at, updated.created_at);
}

#[tokio::test]
async fn test_update_of_missing_report_is_not_found() {
    let Some(store) = setup_store().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let report = reportgen_server::models::Report::new(Uuid::new_v4(), "monsters");
    let result = store.update(&report).await;
    assert!(matches!(result, Err(DbError::NotFound(_))));
}

#[tokio::test]
async fn test_health_check() {
    let Some(store) = setup_store().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    store.health_check().await.unwrap();
}
