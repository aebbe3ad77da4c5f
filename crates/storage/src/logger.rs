//! Audit logger: forwards events to the store without ever failing the caller

use crate::event::AuditEvent;
use crate::repository::EventStore;
use metrics::counter;
use std::sync::Arc;
use tracing::{info, warn};

/// Forwards audit events to an [`EventStore`].
///
/// A failed append is logged and the event is dropped.
#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn EventStore>,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// Persist an event. Returns whether it was stored.
    pub async fn log(&self, event: &AuditEvent) -> bool {
        match self.store.append(event).await {
            Ok(()) => {
                info!(
                    "[DB] Logged event: {} | {}",
                    event.event_type.as_str(),
                    event.driver_status
                );
                counter!("audit_events_total").increment(1);
                true
            }
            Err(e) => {
                warn!(
                    "Failed to store event {} | {}: {}",
                    event.event_type.as_str(),
                    event.driver_status,
                    e
                );
                counter!("monitor_events_dropped_total").increment(1);
                false
            }
        }
    }

    /// Log a `System / Info` event
    pub async fn log_system(&self, status: &str, notes: &str) -> bool {
        self.log(&AuditEvent::system(status).with_notes(notes)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;
    use crate::repository::MemoryEventStore;
    use crate::StorageError;
    use async_trait::async_trait;

    struct FailingStore;

    #[async_trait]
    impl EventStore for FailingStore {
        async fn init(&self) -> Result<(), StorageError> {
            Ok(())
        }

        async fn append(&self, _event: &AuditEvent) -> Result<(), StorageError> {
            Err(StorageError::DatabaseError("connection refused".into()))
        }

        async fn recent(&self, _limit: usize) -> Result<Vec<AuditEvent>, StorageError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_log_forwards_to_store() {
        let store = Arc::new(MemoryEventStore::new());
        let logger = AuditLogger::new(store.clone());

        assert!(logger.log_system("Application started", "serial: none").await);

        let events = store.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::System);
        assert_eq!(events[0].notes, "serial: none");
    }

    #[tokio::test]
    async fn test_store_failure_is_contained() {
        let logger = AuditLogger::new(Arc::new(FailingStore));
        assert!(!logger.log(&AuditEvent::system("Application shutdown")).await);
    }
}
