//! Storage Layer
//!
//! Append-only audit trail of driver state events, with an in-memory store
//! and a SQLite store behind the same [`EventStore`] trait.

mod event;
mod logger;
mod repository;
mod sqlite;

pub use event::{AlertType, AuditEvent, EventType};
pub use logger::AuditLogger;
pub use repository::{EventStore, MemoryEventStore};
pub use sqlite::SqliteEventStore;

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::DatabaseError(err.to_string())
    }
}
