//! Event store trait and in-memory implementation

use crate::event::AuditEvent;
use crate::StorageError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, info};

/// Append-only audit event persistence
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Create the schema if missing. Safe to call repeatedly.
    async fn init(&self) -> Result<(), StorageError>;

    /// Persist one event; succeeds or fails as a whole
    async fn append(&self, event: &AuditEvent) -> Result<(), StorageError>;

    /// Most recent events, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<AuditEvent>, StorageError>;
}

/// In-memory event store with bounded retention
pub struct MemoryEventStore {
    events: Mutex<VecDeque<AuditEvent>>,
    /// Oldest events are evicted past this size
    max_events: usize,
}

impl MemoryEventStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    pub fn with_capacity(max_events: usize) -> Self {
        info!("Creating in-memory event store (max {} events)", max_events);
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events: max_events.max(1),
        }
    }

    /// All retained events, oldest first
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all data (for testing)
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Default for MemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn init(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn append(&self, event: &AuditEvent) -> Result<(), StorageError> {
        let mut events = self
            .events
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        // Enforce retention
        while events.len() >= self.max_events {
            events.pop_front();
        }

        events.push_back(event.clone());
        debug!("Stored event {} ({} retained)", event.event_type.as_str(), events.len());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditEvent>, StorageError> {
        let events = self
            .events
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        Ok(events.iter().rev().take(limit).cloned().collect())
    }
}
