//! Integration tests against a file-backed SQLite database.

use chrono::{NaiveDate, NaiveTime};
use pillbox_storage::models::ScheduleEntry;
use pillbox_storage::{Database, DatabaseConfig, ScheduleRepository, SqliteScheduleRepository};
use tempfile::TempDir;

fn entry_at(user_id: i64, hour: u32, minute: u32) -> ScheduleEntry {
    ScheduleEntry::new(
        user_id,
        NaiveDate::from_ymd_opt(2026, 8, 27).unwrap(),
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
    )
}

#[tokio::test]
async fn test_database_creates_file_and_migrates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pillbox.db");

    let db = Database::new(DatabaseConfig::new(path.to_string_lossy()))
        .await
        .unwrap();
    db.health_check().await.unwrap();

    assert!(path.exists());
    db.close().await;
}

#[tokio::test]
async fn test_schedule_survives_reconnect() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pillbox.db");
    let path_str = path.to_string_lossy().to_string();

    let id = {
        let db = Database::new(DatabaseConfig::new(&path_str)).await.unwrap();
        let repo = SqliteScheduleRepository::new(db.pool().clone());
        let id = repo.create(&entry_at(1, 8, 0)).await.unwrap();
        db.close().await;
        id
    };

    let db = Database::new(DatabaseConfig::new(&path_str)).await.unwrap();
    let repo = SqliteScheduleRepository::new(db.pool().clone());

    let found = repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(found.user_id, 1);
    assert_eq!(
        found.scheduled_time,
        NaiveTime::from_hms_opt(8, 0, 0).unwrap()
    );
    db.close().await;
}

#[tokio::test]
async fn test_full_schedule_lifecycle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pillbox.db");

    let db = Database::new(DatabaseConfig::new(path.to_string_lossy()))
        .await
        .unwrap();
    let repo = SqliteScheduleRepository::new(db.pool().clone());

    let morning = repo.create(&entry_at(1, 8, 0)).await.unwrap();
    let evening = repo.create(&entry_at(1, 20, 0)).await.unwrap();
    assert_ne!(morning, evening);

    let today = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();
    assert_eq!(repo.find_for_date(today).await.unwrap().len(), 2);

    repo.delete(morning).await.unwrap();
    let remaining = repo.find_for_date(today).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, evening);

    db.close().await;
}

#[tokio::test]
async fn test_migration_is_idempotent() {
    let db = Database::in_memory().await.unwrap();
    // Running migrations again on an up-to-date database is a no-op.
    db.migrate().await.unwrap();
    db.health_check().await.unwrap();
}
