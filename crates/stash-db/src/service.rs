//! Service layer wrapping the database with change notification.
//!
//! `StashService` wraps `StashDb` (raw database access) and the change
//! channel. All repo methods are implemented as `impl StashService` blocks
//! in `repos/`, and every mutation publishes a [`StoreEvent`] after it commits.

use crate::StashDb;
use crate::error::DatabaseError;
use crate::events::{EventReceiver, EventSender, StoreEvent, create_event_channel};

/// Orchestrates database mutations and change notification.
pub struct StashService {
    db: StashDb,
    events: EventSender,
}

impl StashService {
    /// Open a service over a local database file, or `":memory:"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or migrated.
    pub async fn open_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = StashDb::open_local(db_path).await?;
        Ok(Self::from_db(db))
    }

    /// Wrap an already-open database.
    #[must_use]
    pub fn from_db(db: StashDb) -> Self {
        Self {
            db,
            events: create_event_channel(),
        }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &StashDb {
        &self.db
    }

    /// Subscribe to store changes made through this service.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Publish a change. Having no subscribers is not an error.
    pub(crate) fn publish(&self, event: StoreEvent) {
        tracing::trace!(?event, "store event");
        let _ = self.events.send(event);
    }
}
