//! SQLite event store

use crate::event::{AlertType, AuditEvent, EventType};
use crate::repository::EventStore;
use crate::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};

const CREATE_EVENTS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS events (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        event_type      TEXT NOT NULL,
        event_date      TEXT NOT NULL,
        event_time      TEXT NOT NULL,
        alert_type      TEXT NOT NULL,
        driver_status   TEXT NOT NULL,
        location_coords TEXT NOT NULL DEFAULT '',
        location_place  TEXT NOT NULL DEFAULT '',
        notes           TEXT NOT NULL DEFAULT '',
        recorded_at     TEXT NOT NULL
    )";

const INSERT_EVENT: &str = "
    INSERT INTO events
        (event_type, event_date, event_time, alert_type, driver_status,
         location_coords, location_place, notes, recorded_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";

const SELECT_RECENT: &str = "
    SELECT event_type, alert_type, driver_status, location_coords,
           location_place, notes, recorded_at
    FROM events
    ORDER BY id DESC
    LIMIT ?";

/// Event store backed by a SQLite database file
pub struct SqliteEventStore {
    pool: SqlitePool,
}

impl SqliteEventStore {
    /// Connect to `url` (e.g. "sqlite://events.db" or "sqlite::memory:"),
    /// creating the database file if needed
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        info!("Opening SQLite event store at {}", url);

        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // An in-memory database lives and dies with its single connection
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(4)
                .connect_with(options)
                .await?
        };

        Ok(Self { pool })
    }

    pub async fn count(&self) -> Result<i64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM events")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn event_from_row(row: &SqliteRow) -> Result<AuditEvent, StorageError> {
    let event_type: String = row.try_get("event_type")?;
    let alert_type: String = row.try_get("alert_type")?;
    let recorded_at: String = row.try_get("recorded_at")?;

    Ok(AuditEvent {
        event_type: EventType::parse(&event_type).ok_or_else(|| {
            StorageError::SerializationError(format!("unknown event type {:?}", event_type))
        })?,
        alert_type: AlertType::parse(&alert_type).ok_or_else(|| {
            StorageError::SerializationError(format!("unknown alert type {:?}", alert_type))
        })?,
        driver_status: row.try_get("driver_status")?,
        coords: row.try_get("location_coords")?,
        place: row.try_get("location_place")?,
        notes: row.try_get("notes")?,
        timestamp: DateTime::parse_from_rfc3339(&recorded_at)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?
            .with_timezone(&Utc),
    })
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn init(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_EVENTS_TABLE).execute(&self.pool).await?;
        info!("Event table ensured");
        Ok(())
    }

    async fn append(&self, event: &AuditEvent) -> Result<(), StorageError> {
        sqlx::query(INSERT_EVENT)
            .bind(event.event_type.as_str())
            .bind(event.event_date())
            .bind(event.event_time())
            .bind(event.alert_type.as_str())
            .bind(event.driver_status.as_str())
            .bind(event.coords.as_str())
            .bind(event.place.as_str())
            .bind(event.notes.as_str())
            .bind(event.timestamp.to_rfc3339())
            .execute(&self.pool)
            .await?;

        debug!("[DB] Logged event: {} | {}", event.event_type.as_str(), event.driver_status);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditEvent>, StorageError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(SELECT_RECENT)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(event_from_row).collect()
    }
}
