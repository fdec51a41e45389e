//! Review resolution for captures parked in `needs-review`.
//!
//! A human can edit the displayed draft, point it at an existing project, turn
//! it into a brand-new project, then accept (file it through the same saga as
//! automatic filing) or discard it.

use stash_core::entities::{CaptureRecord, CaptureState};
use stash_core::enums::{CaptureStatus, EntityType};
use stash_core::errors::CoreError;
use stash_core::responses::AppliedEffect;
use stash_db::service::StashService;
use stash_db::updates::capture::{CaptureDraft, DraftUpdate, DraftUpdateBuilder};

use crate::applier::{ApplyOrigin, apply};
use crate::error::PipelineError;

/// Outcome given to a project created while resolving a review item.
pub const REVIEW_PROJECT_OUTCOME: &str = "Created from review";

fn require_review(capture: &CaptureRecord, to: CaptureStatus) -> Result<(), CoreError> {
    if capture.status() == CaptureStatus::NeedsReview {
        return Ok(());
    }
    Err(CoreError::InvalidTransition {
        entity_type: EntityType::Capture.to_string(),
        id: capture.id.clone(),
        from: capture.status().to_string(),
        to: to.to_string(),
    })
}

/// File the capture using its currently displayed draft.
///
/// A draft whose match has no id is filed into a new project named after the
/// displayed name, even when it claims to be an existing project. An accept
/// that stopped part-way resumes where it stopped.
///
/// # Errors
///
/// Returns `PipelineError::Core` if the capture is not in review, or
/// `PipelineError::Apply` if filing stops part-way.
pub async fn accept(store: &StashService, capture_id: &str) -> Result<AppliedEffect, PipelineError> {
    let capture = store.get_capture(capture_id).await?;
    require_review(&capture, CaptureStatus::Success)?;

    let staged = if capture.progress.is_some() {
        capture
    } else {
        let CaptureState::NeedsReview(ref displayed) = capture.state else {
            return Err(CoreError::Validation(format!("capture {capture_id} has no draft")).into());
        };
        let draft = CaptureDraft {
            rewritten_text: capture.rewritten_text.clone(),
            tags: capture.tags_applied.clone(),
            list: capture.list,
            project_match: displayed.clone(),
        };
        store.stage_for_filing(capture_id, &draft).await?
    };

    tracing::info!(capture_id, "review accepted");
    apply(store, &staged, ApplyOrigin::Review).await
}

/// Discard the capture. Nothing is created.
///
/// # Errors
///
/// Returns `PipelineError::Database` if the capture is not in review or an
/// accept already started filing it.
pub async fn discard(store: &StashService, capture_id: &str) -> Result<CaptureRecord, PipelineError> {
    Ok(store.discard_capture(capture_id).await?)
}

/// Edit the displayed draft.
///
/// # Errors
///
/// Returns `PipelineError::Database` if the capture is not in review.
pub async fn edit(
    store: &StashService,
    capture_id: &str,
    update: &DraftUpdate,
) -> Result<CaptureRecord, PipelineError> {
    Ok(store.update_review_draft(capture_id, update).await?)
}

/// Point the draft at an existing project, then accept.
///
/// # Errors
///
/// Returns `PipelineError::Database` with `NoResult` if the project does not exist.
pub async fn assign(
    store: &StashService,
    capture_id: &str,
    project_id: &str,
) -> Result<AppliedEffect, PipelineError> {
    let project = store.get_project(project_id).await?;
    let update = DraftUpdateBuilder::new()
        .project_id(Some(project.id.clone()))
        .project_name(project.name.clone())
        .is_new(false)
        .outcome(None)
        .build();
    store.update_review_draft(capture_id, &update).await?;
    accept(store, capture_id).await
}

/// Resolve the draft into a new project called `name`, then accept.
///
/// # Errors
///
/// Returns `PipelineError::Core` if `name` is blank or the capture is not in review.
pub async fn create_project_and_accept(
    store: &StashService,
    capture_id: &str,
    name: &str,
) -> Result<AppliedEffect, PipelineError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("project name must not be empty".into()).into());
    }
    let update = DraftUpdateBuilder::new()
        .project_id(None)
        .project_name(name)
        .is_new(true)
        .outcome(Some(REVIEW_PROJECT_OUTCOME.to_string()))
        .build();
    store.update_review_draft(capture_id, &update).await?;
    accept(store, capture_id).await
}
