//! Shared test utilities for stash-db and downstream crates.

use crate::StashDb;
use crate::error::DatabaseError;
use crate::service::StashService;

/// Open an in-memory `StashService` (for pure DB tests and pipeline tests).
///
/// # Errors
///
/// Returns `DatabaseError` if the in-memory database cannot be opened.
pub async fn memory_service() -> Result<StashService, DatabaseError> {
    let db = StashDb::open_local(":memory:").await?;
    Ok(StashService::from_db(db))
}
