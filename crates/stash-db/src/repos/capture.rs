//! Capture repository.
//!
//! Captures move through `pending → {success | needs-review}` and
//! `needs-review → {success | discarded}`. Every status write checks the
//! transition in Rust first, then re-checks the current status in the
//! `WHERE` clause so a concurrent writer turns into `InvalidState` instead of
//! a silent overwrite. The schema trigger is the last line.

use stash_core::classification::ProjectMatch;
use stash_core::entities::{ApplyProgress, ApplyStep, CaptureRecord, CaptureState};
use stash_core::enums::{CaptureStatus, EntityType};
use stash_core::errors::CoreError;
use stash_core::ids::PREFIX_CAPTURE;

use crate::error::DatabaseError;
use crate::events::StoreEvent;
use crate::helpers::{
    format_datetime, get_opt_string, now, parse_datetime, parse_enum, parse_json,
    parse_optional_json, to_json,
};
use crate::service::StashService;
use crate::updates::capture::{CaptureDraft, DraftUpdate};

const SELECT_COLS: &str = "id, original_text, rewritten_text, tags, list, status, \
     project_match, progress, last_error, created_at, updated_at";

/// Filter criteria for capture queries.
#[derive(Debug, Default)]
pub struct CaptureFilter {
    pub status: Option<CaptureStatus>,
    pub limit: Option<u32>,
    /// Oldest first (queue order) instead of newest first (inbox order).
    pub oldest_first: bool,
}

fn row_to_capture(row: &libsql::Row) -> Result<CaptureRecord, DatabaseError> {
    let status: CaptureStatus = parse_enum(&row.get::<String>(5)?)?;
    let project_match: Option<ProjectMatch> =
        parse_optional_json(get_opt_string(row, 6)?.as_deref(), "captures.project_match")?;
    let list = get_opt_string(row, 4)?
        .map(|s| parse_enum(&s))
        .transpose()?;

    Ok(CaptureRecord {
        id: row.get(0)?,
        original_text: row.get(1)?,
        rewritten_text: row.get(2)?,
        tags_applied: parse_json(&row.get::<String>(3)?, "captures.tags")?,
        list,
        state: CaptureState::from_parts(status, project_match)?,
        progress: parse_optional_json(get_opt_string(row, 7)?.as_deref(), "captures.progress")?,
        last_error: get_opt_string(row, 8)?,
        created_at: parse_datetime(&row.get::<String>(9)?)?,
        updated_at: parse_datetime(&row.get::<String>(10)?)?,
    })
}

/// Refuse a status change the state machine does not allow.
pub(crate) fn ensure_transition(
    capture: &CaptureRecord,
    to: CaptureStatus,
) -> Result<(), DatabaseError> {
    let from = capture.status();
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            entity_type: EntityType::Capture.to_string(),
            id: capture.id.clone(),
            from: from.to_string(),
            to: to.to_string(),
        }
        .into())
    }
}

/// Map "zero rows changed" on a guarded write to a concurrency error.
pub(crate) fn ensure_changed(changed: u64, capture_id: &str) -> Result<(), DatabaseError> {
    if changed == 0 {
        return Err(DatabaseError::InvalidState(format!(
            "capture {capture_id} changed while it was being written"
        )));
    }
    Ok(())
}

/// Whether the saga has created anything for this capture yet.
fn filing_started(capture: &CaptureRecord) -> bool {
    capture
        .progress
        .as_ref()
        .is_some_and(|p| p.step != ApplyStep::Classified)
}

impl StashService {
    /// Create a `pending` capture from raw text.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` if the text is blank.
    pub async fn create_capture(&self, text: &str) -> Result<CaptureRecord, DatabaseError> {
        if text.trim().is_empty() {
            return Err(CoreError::Validation("capture text must not be empty".into()).into());
        }

        let id = self.db().generate_id(PREFIX_CAPTURE).await?;
        let now = now();
        let capture = CaptureRecord {
            id,
            original_text: text.to_string(),
            rewritten_text: String::new(),
            tags_applied: stash_core::classification::Tags::default(),
            list: None,
            state: CaptureState::Pending,
            progress: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        };

        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO captures ({SELECT_COLS})
                     VALUES (?1, ?2, '', ?3, NULL, ?4, NULL, NULL, NULL, ?5, ?6)"
                ),
                libsql::params![
                    capture.id.as_str(),
                    capture.original_text.as_str(),
                    to_json(&capture.tags_applied)?,
                    CaptureStatus::Pending.as_str(),
                    format_datetime(&now),
                    format_datetime(&now)
                ],
            )
            .await?;

        tracing::info!(capture_id = %capture.id, "capture created");
        self.publish(StoreEvent::CaptureChanged {
            capture_id: capture.id.clone(),
            status: CaptureStatus::Pending,
        });
        Ok(capture)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if no capture has this id.
    pub async fn get_capture(&self, id: &str) -> Result<CaptureRecord, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM captures WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_capture(&row)
    }

    /// List captures, newest first unless `oldest_first` is set.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_captures(
        &self,
        filter: &CaptureFilter,
    ) -> Result<Vec<CaptureRecord>, DatabaseError> {
        let order = if filter.oldest_first {
            "created_at ASC, rowid ASC"
        } else {
            "created_at DESC, rowid DESC"
        };
        let limit = filter.limit.unwrap_or(100);

        let mut rows = if let Some(status) = filter.status {
            self.db()
                .conn()
                .query(
                    &format!(
                        "SELECT {SELECT_COLS} FROM captures WHERE status = ?1
                         ORDER BY {order} LIMIT {limit}"
                    ),
                    [status.as_str()],
                )
                .await?
        } else {
            self.db()
                .conn()
                .query(
                    &format!("SELECT {SELECT_COLS} FROM captures ORDER BY {order} LIMIT {limit}"),
                    (),
                )
                .await?
        };

        let mut captures = Vec::new();
        while let Some(row) = rows.next().await? {
            captures.push(row_to_capture(&row)?);
        }
        Ok(captures)
    }

    /// The oldest `pending` capture, by creation time then insertion order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn oldest_pending_capture(&self) -> Result<Option<CaptureRecord>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM captures WHERE status = 'pending'
                     ORDER BY created_at ASC, rowid ASC LIMIT 1"
                ),
                (),
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_capture(&row)?)),
            None => Ok(None),
        }
    }

    /// Count captures, optionally in one status.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_captures(&self, status: Option<CaptureStatus>) -> Result<u32, DatabaseError> {
        let mut rows = match status {
            Some(status) => {
                self.db()
                    .conn()
                    .query(
                        "SELECT COUNT(*) FROM captures WHERE status = ?1",
                        [status.as_str()],
                    )
                    .await?
            }
            None => {
                self.db()
                    .conn()
                    .query("SELECT COUNT(*) FROM captures", ())
                    .await?
            }
        };
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let count: i64 = row.get(0)?;
        u32::try_from(count).map_err(|e| DatabaseError::Other(e.into()))
    }

    /// Persist a filing draft and start the saga at `classified`.
    ///
    /// The status is left unchanged. Re-staging a capture whose saga already
    /// created something is refused, so a resumed apply never loses the ids
    /// it recorded.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` if the capture is not `pending` or
    /// `needs-review`, or `DatabaseError::InvalidState` if filing already started.
    pub async fn stage_for_filing(
        &self,
        id: &str,
        draft: &CaptureDraft,
    ) -> Result<CaptureRecord, DatabaseError> {
        let current = self.get_capture(id).await?;
        let status = current.status();
        if status.is_terminal() {
            return Err(CoreError::InvalidTransition {
                entity_type: EntityType::Capture.to_string(),
                id: id.to_string(),
                from: status.to_string(),
                to: status.to_string(),
            }
            .into());
        }
        if filing_started(&current) {
            return Err(DatabaseError::InvalidState(format!(
                "capture {id} is already being filed"
            )));
        }

        let progress = ApplyProgress {
            step: ApplyStep::Classified,
            target: draft.project_match.clone(),
        };
        let now = now();
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE captures SET rewritten_text = ?1, tags = ?2, list = ?3,
                     project_match = ?4, progress = ?5, updated_at = ?6
                 WHERE id = ?7 AND status = ?8",
                libsql::params![
                    draft.rewritten_text.as_str(),
                    to_json(&draft.tags)?,
                    draft.list.map(|l| l.as_str()),
                    to_json(&draft.project_match)?,
                    to_json(&progress)?,
                    format_datetime(&now),
                    id,
                    status.as_str()
                ],
            )
            .await?;
        ensure_changed(changed, id)?;

        tracing::debug!(capture_id = id, "capture staged for filing");
        self.publish(StoreEvent::CaptureChanged {
            capture_id: id.to_string(),
            status,
        });

        let state = match current.state {
            CaptureState::NeedsReview(_) => CaptureState::NeedsReview(draft.project_match.clone()),
            other => other,
        };
        Ok(CaptureRecord {
            rewritten_text: draft.rewritten_text.clone(),
            tags_applied: draft.tags.clone(),
            list: draft.list,
            state,
            progress: Some(progress),
            updated_at: now,
            ..current
        })
    }

    /// Finish filing: `success` with the confirmed match, saga marker cleared.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` if the capture cannot move to `success`.
    pub async fn mark_success(
        &self,
        id: &str,
        final_match: &ProjectMatch,
    ) -> Result<CaptureRecord, DatabaseError> {
        let current = self.get_capture(id).await?;
        ensure_transition(&current, CaptureStatus::Success)?;

        let now = now();
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE captures SET status = 'success', project_match = ?1, progress = NULL,
                     last_error = NULL, updated_at = ?2
                 WHERE id = ?3 AND status = ?4",
                libsql::params![
                    to_json(final_match)?,
                    format_datetime(&now),
                    id,
                    current.status().as_str()
                ],
            )
            .await?;
        ensure_changed(changed, id)?;

        tracing::info!(capture_id = id, from = %current.status(), "capture filed");
        self.publish(StoreEvent::CaptureChanged {
            capture_id: id.to_string(),
            status: CaptureStatus::Success,
        });

        Ok(CaptureRecord {
            state: CaptureState::Success(final_match.clone()),
            progress: None,
            last_error: None,
            updated_at: now,
            ..current
        })
    }

    /// Park a `pending` capture for human review with `draft` as the proposal.
    ///
    /// `last_error` is set when the move is caused by a classification failure.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` if the capture is not `pending`.
    pub async fn mark_needs_review(
        &self,
        id: &str,
        draft: &CaptureDraft,
        last_error: Option<&str>,
    ) -> Result<CaptureRecord, DatabaseError> {
        let current = self.get_capture(id).await?;
        ensure_transition(&current, CaptureStatus::NeedsReview)?;

        let now = now();
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE captures SET status = 'needs-review', rewritten_text = ?1, tags = ?2,
                     list = ?3, project_match = ?4, progress = NULL, last_error = ?5,
                     updated_at = ?6
                 WHERE id = ?7 AND status = 'pending'",
                libsql::params![
                    draft.rewritten_text.as_str(),
                    to_json(&draft.tags)?,
                    draft.list.map(|l| l.as_str()),
                    to_json(&draft.project_match)?,
                    last_error,
                    format_datetime(&now),
                    id
                ],
            )
            .await?;
        ensure_changed(changed, id)?;

        tracing::info!(capture_id = id, confidence = draft.project_match.confidence, "capture needs review");
        self.publish(StoreEvent::CaptureChanged {
            capture_id: id.to_string(),
            status: CaptureStatus::NeedsReview,
        });

        Ok(CaptureRecord {
            rewritten_text: draft.rewritten_text.clone(),
            tags_applied: draft.tags.clone(),
            list: draft.list,
            state: CaptureState::NeedsReview(draft.project_match.clone()),
            progress: None,
            last_error: last_error.map(String::from),
            updated_at: now,
            ..current
        })
    }

    /// Discard a `needs-review` capture. Creates nothing.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` if the capture is not `needs-review`, or
    /// `DatabaseError::InvalidState` if an accept already created entities for it.
    pub async fn discard_capture(&self, id: &str) -> Result<CaptureRecord, DatabaseError> {
        let current = self.get_capture(id).await?;
        ensure_transition(&current, CaptureStatus::Discarded)?;
        if filing_started(&current) {
            return Err(DatabaseError::InvalidState(format!(
                "capture {id} is partly filed; accept it to finish"
            )));
        }

        let now = now();
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE captures SET status = 'discarded', progress = NULL, updated_at = ?1
                 WHERE id = ?2 AND status = 'needs-review'",
                libsql::params![format_datetime(&now), id],
            )
            .await?;
        ensure_changed(changed, id)?;

        tracing::info!(capture_id = id, "capture discarded");
        self.publish(StoreEvent::CaptureChanged {
            capture_id: id.to_string(),
            status: CaptureStatus::Discarded,
        });

        Ok(CaptureRecord {
            state: CaptureState::Discarded,
            progress: None,
            updated_at: now,
            ..current
        })
    }

    /// Edit the displayed draft of a `needs-review` capture.
    ///
    /// Clears a `classified` saga marker so the next accept files the edited draft.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` if the capture is not `needs-review` or an
    /// edit leaves a blank project name, and `DatabaseError::InvalidState` if
    /// filing already started.
    pub async fn update_review_draft(
        &self,
        id: &str,
        update: &DraftUpdate,
    ) -> Result<CaptureRecord, DatabaseError> {
        let current = self.get_capture(id).await?;
        let CaptureState::NeedsReview(ref displayed) = current.state else {
            return Err(CoreError::Validation(format!(
                "capture {id} is {} and cannot be edited",
                current.status()
            ))
            .into());
        };
        if filing_started(&current) {
            return Err(DatabaseError::InvalidState(format!(
                "capture {id} is partly filed; accept it to finish"
            )));
        }
        if update.is_empty() {
            return Ok(current);
        }

        let mut draft = CaptureDraft {
            rewritten_text: current.rewritten_text.clone(),
            tags: current.tags_applied.clone(),
            list: current.list,
            project_match: displayed.clone(),
        };
        update.apply_to(&mut draft);
        if draft.project_match.name.trim().is_empty() {
            return Err(CoreError::Validation("project name must not be empty".into()).into());
        }

        let now = now();
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE captures SET rewritten_text = ?1, tags = ?2, list = ?3,
                     project_match = ?4, progress = NULL, updated_at = ?5
                 WHERE id = ?6 AND status = 'needs-review'",
                libsql::params![
                    draft.rewritten_text.as_str(),
                    to_json(&draft.tags)?,
                    draft.list.map(|l| l.as_str()),
                    to_json(&draft.project_match)?,
                    format_datetime(&now),
                    id
                ],
            )
            .await?;
        ensure_changed(changed, id)?;

        tracing::debug!(capture_id = id, "review draft edited");
        self.publish(StoreEvent::CaptureChanged {
            capture_id: id.to_string(),
            status: CaptureStatus::NeedsReview,
        });

        Ok(CaptureRecord {
            rewritten_text: draft.rewritten_text,
            tags_applied: draft.tags,
            list: draft.list,
            state: CaptureState::NeedsReview(draft.project_match),
            progress: None,
            updated_at: now,
            ..current
        })
    }
}
