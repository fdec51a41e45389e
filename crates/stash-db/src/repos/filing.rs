//! Saga steps for filing a capture.
//!
//! Each step writes one entity and advances the capture's progress marker in
//! the same transaction, so after a crash the marker names exactly the ids
//! that exist:
//!
//! ```text
//! classified → project-resolved → task-created → logged → (success)
//! ```
//!
//! The steps do not decide anything. Which project to use, what the task looks
//! like and when to run each step is the applier's job in `stash-pipeline`.

use stash_core::classification::ProjectMatch;
use stash_core::entities::{
    ActivityLogEntry, ApplyProgress, ApplyStep, CaptureRecord, Project, Task,
};
use stash_core::enums::ActivityType;
use stash_core::errors::CoreError;

use crate::error::DatabaseError;
use crate::events::StoreEvent;
use crate::helpers::{format_datetime, now, to_json};
use crate::repos::activity::{NewActivity, insert_activity};
use crate::repos::capture::ensure_changed;
use crate::repos::project::insert_project;
use crate::repos::task::{NewTask, insert_task};
use crate::service::StashService;

/// Write `progress` onto a capture that is still open.
async fn advance(
    conn: &libsql::Connection,
    capture_id: &str,
    progress: &ApplyProgress,
) -> Result<(), DatabaseError> {
    let changed = conn
        .execute(
            "UPDATE captures SET progress = ?1, updated_at = ?2
             WHERE id = ?3 AND status IN ('pending', 'needs-review')",
            libsql::params![to_json(progress)?, format_datetime(&now()), capture_id],
        )
        .await?;
    ensure_changed(changed, capture_id)
}

impl StashService {
    fn publish_progress(&self, capture: &CaptureRecord) {
        self.publish(StoreEvent::CaptureChanged {
            capture_id: capture.id.clone(),
            status: capture.status(),
        });
    }

    /// Step 1 (new project): create the project and record `project-resolved`.
    ///
    /// Unlike [`StashService::create_project`] this logs no
    /// `user-create-project` activity; the filing is logged once, at step 3.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` if `name` is blank, or
    /// `DatabaseError::InvalidState` if the capture was closed meanwhile.
    pub async fn file_new_project(
        &self,
        capture: &CaptureRecord,
        target: &ProjectMatch,
        name: &str,
        outcome: &str,
    ) -> Result<Project, DatabaseError> {
        let project = self.new_project_record(name, outcome).await?;
        let progress = ApplyProgress {
            step: ApplyStep::ProjectResolved {
                project_id: project.id.clone(),
            },
            target: target.clone(),
        };

        let tx = self.db().conn().transaction().await?;
        insert_project(&tx, &project).await?;
        advance(&tx, &capture.id, &progress).await?;
        tx.commit().await?;

        tracing::info!(capture_id = %capture.id, project_id = %project.id, "project created for capture");
        self.publish(StoreEvent::ProjectCreated {
            project_id: project.id.clone(),
        });
        self.publish_progress(capture);
        Ok(project)
    }

    /// Step 1 (existing project): record `project-resolved` for a known id.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` if the capture was closed meanwhile.
    pub async fn file_existing_project(
        &self,
        capture: &CaptureRecord,
        target: &ProjectMatch,
        project_id: &str,
    ) -> Result<(), DatabaseError> {
        let progress = ApplyProgress {
            step: ApplyStep::ProjectResolved {
                project_id: project_id.to_string(),
            },
            target: target.clone(),
        };
        advance(self.db().conn(), &capture.id, &progress).await?;
        tracing::debug!(capture_id = %capture.id, project_id, "existing project resolved");
        self.publish_progress(capture);
        Ok(())
    }

    /// Step 2: create the task and record `task-created`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` if the task title is blank, or
    /// `DatabaseError::InvalidState` if the capture was closed meanwhile.
    pub async fn file_task(
        &self,
        capture: &CaptureRecord,
        target: &ProjectMatch,
        project_id: &str,
        new: NewTask,
    ) -> Result<Task, DatabaseError> {
        let task = self.new_task_record(new).await?;
        let progress = ApplyProgress {
            step: ApplyStep::TaskCreated {
                project_id: project_id.to_string(),
                task_id: task.id.clone(),
            },
            target: target.clone(),
        };

        let tx = self.db().conn().transaction().await?;
        insert_task(&tx, &task).await?;
        advance(&tx, &capture.id, &progress).await?;
        tx.commit().await?;

        tracing::debug!(capture_id = %capture.id, task_id = %task.id, "task created for capture");
        self.publish(StoreEvent::TaskChanged {
            task_id: task.id.clone(),
        });
        self.publish_progress(capture);
        Ok(task)
    }

    /// Step 3: append the `ai-processed` entry and record `logged`.
    ///
    /// This is the only writer of `ai-processed` activities.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` if `new` is not an `ai-processed` entry, or
    /// `DatabaseError::InvalidState` if the capture was closed meanwhile.
    pub async fn file_activity(
        &self,
        capture: &CaptureRecord,
        target: &ProjectMatch,
        project_id: &str,
        task_id: &str,
        new: NewActivity,
    ) -> Result<ActivityLogEntry, DatabaseError> {
        if new.activity_type != ActivityType::AiProcessed {
            return Err(CoreError::Validation(format!(
                "filing logs ai-processed activities, not {}",
                new.activity_type
            ))
            .into());
        }
        let entry = self.new_activity_record(new).await?;
        let progress = ApplyProgress {
            step: ApplyStep::Logged {
                project_id: project_id.to_string(),
                task_id: task_id.to_string(),
            },
            target: target.clone(),
        };

        let tx = self.db().conn().transaction().await?;
        insert_activity(&tx, &entry).await?;
        advance(&tx, &capture.id, &progress).await?;
        tx.commit().await?;

        self.publish_progress(capture);
        Ok(entry)
    }
}
