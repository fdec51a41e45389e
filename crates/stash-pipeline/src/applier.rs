//! Effect applier: file a staged capture as project + task + activity.
//!
//! Filing is a saga over the capture's progress marker:
//!
//! ```text
//! classified ──► project-resolved ──► task-created ──► logged ──► success
//! ```
//!
//! Every arrow is one store transaction (see `stash_db::repos::filing`), so
//! [`apply`] can be called again on a capture that stopped anywhere and
//! continues from the recorded step without creating anything twice.

use stash_core::classification::ProjectMatch;
use stash_core::entities::{ActivityMetadata, ApplyStep, CaptureRecord, Project};
use stash_core::enums::ActivityType;
use stash_core::errors::CoreError;
use stash_core::responses::AppliedEffect;
use stash_db::error::DatabaseError;
use stash_db::repos::activity::NewActivity;
use stash_db::repos::task::NewTask;
use stash_db::service::StashService;

use crate::error::PipelineError;

/// Outcome text for a new project whose match carried none.
pub const DEFAULT_OUTCOME: &str = "No outcome defined";

/// Who decided this capture should be filed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOrigin {
    /// Confidence routing.
    Auto,
    /// A human accepted the review draft.
    Review,
}

fn stopped_at(capture_id: &str, step: &ApplyStep) -> impl FnOnce(DatabaseError) -> PipelineError {
    let capture_id = capture_id.to_string();
    let step = step.as_str();
    move |source| PipelineError::Apply {
        capture_id,
        step,
        source,
    }
}

fn activity_detail(origin: ApplyOrigin, project_created: bool) -> Option<String> {
    match (origin, project_created) {
        (ApplyOrigin::Review, _) => Some("Accepted from review".to_string()),
        (ApplyOrigin::Auto, true) => Some("Created new project automatically".to_string()),
        (ApplyOrigin::Auto, false) => None,
    }
}

/// Run the remaining saga steps for a staged capture and mark it `success`.
///
/// # Errors
///
/// Returns `PipelineError::Core` if the capture was never staged, or
/// `PipelineError::Apply` naming the step that failed. The capture keeps the
/// last completed step, so calling `apply` again resumes there.
pub async fn apply(
    store: &StashService,
    capture: &CaptureRecord,
    origin: ApplyOrigin,
) -> Result<AppliedEffect, PipelineError> {
    let Some(progress) = capture.progress.clone() else {
        return Err(CoreError::Validation(format!(
            "capture {} has no filing draft",
            capture.id
        ))
        .into());
    };
    let target = progress.target;
    let project_created = target.requires_new_project();
    let mut step = progress.step;
    let mut project: Option<Project> = None;

    if step != ApplyStep::Classified {
        tracing::info!(capture_id = %capture.id, step = step.as_str(), "resuming filing");
    }

    let (project_id, task_id) = loop {
        step = match step {
            ApplyStep::Classified => {
                let project_id = if project_created {
                    let outcome = target
                        .outcome
                        .as_deref()
                        .filter(|o| !o.trim().is_empty())
                        .unwrap_or(DEFAULT_OUTCOME);
                    let created = store
                        .file_new_project(capture, &target, &target.name, outcome)
                        .await
                        .map_err(stopped_at(&capture.id, &step))?;
                    let id = created.id.clone();
                    project = Some(created);
                    id
                } else {
                    // Existing ids are trusted as given; the classifier saw the project list.
                    let id = target.id.clone().unwrap_or_default();
                    store
                        .file_existing_project(capture, &target, &id)
                        .await
                        .map_err(stopped_at(&capture.id, &step))?;
                    id
                };
                ApplyStep::ProjectResolved { project_id }
            }
            ApplyStep::ProjectResolved { ref project_id } => {
                let new_task = NewTask {
                    title: capture.filing_title().to_string(),
                    description: None,
                    list: capture.list.unwrap_or_default(),
                    project_id: Some(project_id.clone()),
                    tags: capture.tags_applied.clone(),
                    original_thought: Some(capture.original_text.clone()),
                };
                let task = store
                    .file_task(capture, &target, project_id, new_task)
                    .await
                    .map_err(stopped_at(&capture.id, &step))?;
                ApplyStep::TaskCreated {
                    project_id: project_id.clone(),
                    task_id: task.id,
                }
            }
            ApplyStep::TaskCreated {
                ref project_id,
                ref task_id,
            } => {
                let entry = NewActivity {
                    activity_type: ActivityType::AiProcessed,
                    description: format!(
                        "Filed \"{}\" to {}",
                        capture.filing_title(),
                        target.name
                    ),
                    detail: activity_detail(origin, project_created),
                    metadata: ActivityMetadata {
                        project_id: Some(project_id.clone()),
                        project_name: Some(target.name.clone()),
                        task_id: Some(task_id.clone()),
                        capture_id: Some(capture.id.clone()),
                        original_text: Some(capture.original_text.clone()),
                        rewritten_text: Some(capture.filing_title().to_string()),
                    },
                };
                store
                    .file_activity(capture, &target, project_id, task_id, entry)
                    .await
                    .map_err(stopped_at(&capture.id, &step))?;
                ApplyStep::Logged {
                    project_id: project_id.clone(),
                    task_id: task_id.clone(),
                }
            }
            ApplyStep::Logged {
                project_id,
                task_id,
            } => break (project_id, task_id),
        };
    };

    let final_match = ProjectMatch {
        id: Some(project_id.clone()),
        confidence: 100,
        ..target
    };
    let capture = store
        .mark_success(&capture.id, &final_match)
        .await
        .map_err(|source| PipelineError::Apply {
            capture_id: capture.id.clone(),
            step: "logged",
            source,
        })?;

    let project = match project {
        Some(project) => Some(project),
        None => match store.get_project(&project_id).await {
            Ok(project) => Some(project),
            Err(DatabaseError::NoResult) => {
                tracing::warn!(
                    capture_id = %capture.id,
                    %project_id,
                    "filed under a project id the store does not hold"
                );
                None
            }
            Err(e) => return Err(e.into()),
        },
    };
    let task = store.get_task(&task_id).await?;

    tracing::info!(
        capture_id = %capture.id,
        %project_id,
        task_id = %task.id,
        project_created,
        "capture filed"
    );

    Ok(AppliedEffect {
        capture,
        project,
        project_id,
        task,
        project_created,
    })
}
