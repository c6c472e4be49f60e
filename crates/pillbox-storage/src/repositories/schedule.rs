#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::ScheduleEntry;
use chrono::NaiveDate;
use sqlx::SqlitePool;

/// Repository trait for schedule entry operations
///
/// # Implementation Note
///
/// This trait uses native async trait methods (Edition 2024 feature),
/// eliminating the need for the async-trait crate while maintaining
/// full async/await support in trait methods.
pub trait ScheduleRepository: Send + Sync {
    /// Get all schedule entries, ordered by date then time
    async fn find_all(&self) -> StorageResult<Vec<ScheduleEntry>>;

    /// Get the entries planned for a specific calendar date
    async fn find_for_date(&self, date: NaiveDate) -> StorageResult<Vec<ScheduleEntry>>;

    /// Find a schedule entry by ID
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<ScheduleEntry>>;

    /// Create a new schedule entry, returning its assigned id
    async fn create(&self, entry: &ScheduleEntry) -> StorageResult<i64>;

    /// Delete a schedule entry by ID
    async fn delete(&self, id: i64) -> StorageResult<()>;
}

/// SQLite implementation of ScheduleRepository
pub struct SqliteScheduleRepository {
    pool: SqlitePool,
}

impl SqliteScheduleRepository {
    /// Create a new SQLite schedule repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ScheduleRepository for SqliteScheduleRepository {
    async fn find_all(&self) -> StorageResult<Vec<ScheduleEntry>> {
        let entries = sqlx::query_as::<_, ScheduleEntry>(
            r#"
            SELECT id, user_id, scheduled_date, scheduled_time, created_at
            FROM pill_schedule
            ORDER BY scheduled_date, scheduled_time
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn find_for_date(&self, date: NaiveDate) -> StorageResult<Vec<ScheduleEntry>> {
        let entries = sqlx::query_as::<_, ScheduleEntry>(
            r#"
            SELECT id, user_id, scheduled_date, scheduled_time, created_at
            FROM pill_schedule
            WHERE scheduled_date = ?
            ORDER BY scheduled_time
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<ScheduleEntry>> {
        let entry = sqlx::query_as::<_, ScheduleEntry>(
            r#"
            SELECT id, user_id, scheduled_date, scheduled_time, created_at
            FROM pill_schedule
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn create(&self, entry: &ScheduleEntry) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO pill_schedule (user_id, scheduled_date, scheduled_time, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.scheduled_date)
        .bind(entry.scheduled_time)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn delete(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM pill_schedule WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::schedule_not_found(id));
        }

        Ok(())
    }
}
