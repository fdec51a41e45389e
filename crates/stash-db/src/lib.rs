//! # stash-db
//!
//! libSQL storage for Stash.
//!
//! Holds the four document collections (captures, projects, tasks, activities)
//! as flat rows keyed by prefixed ids, enforces the capture status state
//! machine on every write, and publishes a [`events::StoreEvent`] after each
//! mutation so a worker can react without polling.

pub mod error;
pub mod events;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
pub mod test_support;
pub mod updates;

use error::DatabaseError;
use libsql::Builder;

/// Central database handle for all Stash state.
///
/// Wraps a libSQL database and connection. Provides ID generation; the
/// repository methods live on [`service::StashService`].
pub struct StashDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl StashDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// Runs migrations automatically on first open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Concurrent readers (a second CLI invocation) wait instead of failing.
        conn.query("PRAGMA busy_timeout = 5000", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA busy_timeout: {e}")))?;

        let stash_db = Self { db, conn };
        stash_db.run_migrations().await?;
        tracing::debug!(path, "database opened");
        Ok(stash_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"cap-a3f8b2c1"`.
    ///
    /// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the prefix.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}
