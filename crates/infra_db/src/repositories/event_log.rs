//! Event audit log
//!
//! Every notification a service publishes is also appended here with its raw
//! payload, giving each service a local, queryable history of what it told
//! the rest of the system.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::error::DatabaseError;
use crate::pool::DatabasePool;

/// A recorded event notification
#[derive(Debug, Clone)]
pub struct EventLogRow {
    pub event_id: String,
    pub event_type: String,
    pub source: String,
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

/// Repository for the events audit log
#[derive(Debug, Clone)]
pub struct EventLogRepository {
    pool: DatabasePool,
}

impl EventLogRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Appends a published event. The `event_id` column is UNIQUE, so
    /// replays of the same envelope surface as `DuplicateEntry`.
    pub async fn record(
        &self,
        event_id: &str,
        event_type: &str,
        source: &str,
        payload: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO events_log (event_id, event_type, source, payload, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(event_id)
        .bind(event_type)
        .bind(source)
        .bind(payload)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The most recently recorded events, newest first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<EventLogRow>, DatabaseError> {
        let rows = sqlx::query(
            r#"
            SELECT event_id, event_type, source, payload, created_at
            FROM events_log
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(scan_event).collect()
    }
}

fn scan_event(row: &SqliteRow) -> Result<EventLogRow, DatabaseError> {
    Ok(EventLogRow {
        event_id: row.try_get("event_id")?,
        event_type: row.try_get("event_type")?,
        source: row.try_get("source")?,
        payload: row.try_get("payload")?,
        created_at: row.try_get("created_at")?,
    })
}
