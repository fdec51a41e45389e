//! Activity log repository.
//!
//! Append-only entries describing what happened, newest first when listed.
//! `ai-processed` entries can only be written by the filing saga (see
//! `repos::filing`); [`StashService::append_activity`] refuses them.

use stash_core::entities::{ActivityLogEntry, ActivityMetadata};
use stash_core::enums::ActivityType;
use stash_core::errors::CoreError;
use stash_core::ids::PREFIX_ACTIVITY;

use crate::error::DatabaseError;
use crate::helpers::{
    format_datetime, get_opt_string, now, parse_datetime, parse_enum, parse_json, to_json,
};
use crate::service::StashService;

const SELECT_COLS: &str = "id, type, description, detail, metadata, created_at";

/// An activity to append; id and timestamp are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub activity_type: ActivityType,
    pub description: String,
    pub detail: Option<String>,
    pub metadata: ActivityMetadata,
}

/// Filter criteria for activity queries.
#[derive(Debug, Default)]
pub struct ActivityFilter {
    pub activity_type: Option<ActivityType>,
    pub limit: Option<u32>,
}

fn row_to_activity(row: &libsql::Row) -> Result<ActivityLogEntry, DatabaseError> {
    Ok(ActivityLogEntry {
        id: row.get(0)?,
        activity_type: parse_enum(&row.get::<String>(1)?)?,
        description: row.get(2)?,
        detail: get_opt_string(row, 3)?,
        metadata: parse_json(&row.get::<String>(4)?, "activities.metadata")?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

/// Insert a fully built entry on `conn` (a plain connection or a transaction).
pub(crate) async fn insert_activity(
    conn: &libsql::Connection,
    entry: &ActivityLogEntry,
) -> Result<(), DatabaseError> {
    conn.execute(
        &format!("INSERT INTO activities ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
        libsql::params![
            entry.id.as_str(),
            entry.activity_type.as_str(),
            entry.description.as_str(),
            entry.detail.as_deref(),
            to_json(&entry.metadata)?,
            format_datetime(&entry.created_at)
        ],
    )
    .await?;
    Ok(())
}

impl StashService {
    /// Build (but do not insert) an entry with a fresh id.
    pub(crate) async fn new_activity_record(
        &self,
        new: NewActivity,
    ) -> Result<ActivityLogEntry, DatabaseError> {
        Ok(ActivityLogEntry {
            id: self.db().generate_id(PREFIX_ACTIVITY).await?,
            activity_type: new.activity_type,
            description: new.description,
            detail: new.detail,
            metadata: new.metadata,
            created_at: now(),
        })
    }

    /// Append a user-originated activity.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` for `ai-processed` entries, which only the
    /// filing saga writes, or `DatabaseError` if the INSERT fails.
    pub async fn append_activity(
        &self,
        new: NewActivity,
    ) -> Result<ActivityLogEntry, DatabaseError> {
        if new.activity_type == ActivityType::AiProcessed {
            return Err(CoreError::Validation(
                "ai-processed activities are written only when a capture is filed".into(),
            )
            .into());
        }
        let entry = self.new_activity_record(new).await?;
        insert_activity(self.db().conn(), &entry).await?;
        Ok(entry)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if no activity has this id.
    pub async fn get_activity(&self, id: &str) -> Result<ActivityLogEntry, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM activities WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_activity(&row)
    }

    /// List activities, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_activities(
        &self,
        filter: &ActivityFilter,
    ) -> Result<Vec<ActivityLogEntry>, DatabaseError> {
        let limit = filter.limit.unwrap_or(100);
        let mut rows = match filter.activity_type {
            Some(kind) => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {SELECT_COLS} FROM activities WHERE type = ?1
                             ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
                        ),
                        [kind.as_str()],
                    )
                    .await?
            }
            None => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {SELECT_COLS} FROM activities
                             ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
                        ),
                        (),
                    )
                    .await?
            }
        };

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_activity(&row)?);
        }
        Ok(entries)
    }
}
