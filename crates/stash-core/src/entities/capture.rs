use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::classification::{ProjectMatch, Tags};
use crate::enums::{CaptureStatus, GtdList};
use crate::errors::CoreError;

/// Lifecycle state of a capture, carrying the match that belongs to it.
///
/// `Success` holds the final (filed) match; `NeedsReview` holds the draft a
/// human will confirm or edit.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "status", content = "project_match", rename_all = "kebab-case")]
pub enum CaptureState {
    Pending,
    Success(ProjectMatch),
    NeedsReview(ProjectMatch),
    Discarded,
}

impl CaptureState {
    #[must_use]
    pub const fn status(&self) -> CaptureStatus {
        match self {
            Self::Pending => CaptureStatus::Pending,
            Self::Success(_) => CaptureStatus::Success,
            Self::NeedsReview(_) => CaptureStatus::NeedsReview,
            Self::Discarded => CaptureStatus::Discarded,
        }
    }

    #[must_use]
    pub const fn project_match(&self) -> Option<&ProjectMatch> {
        match self {
            Self::Success(matched) | Self::NeedsReview(matched) => Some(matched),
            Self::Pending | Self::Discarded => None,
        }
    }

    /// Rebuild a state from its stored status and match columns.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if `success` or `needs-review` has no match.
    pub fn from_parts(
        status: CaptureStatus,
        project_match: Option<ProjectMatch>,
    ) -> Result<Self, CoreError> {
        match (status, project_match) {
            (CaptureStatus::Pending, _) => Ok(Self::Pending),
            (CaptureStatus::Discarded, _) => Ok(Self::Discarded),
            (CaptureStatus::Success, Some(matched)) => Ok(Self::Success(matched)),
            (CaptureStatus::NeedsReview, Some(matched)) => Ok(Self::NeedsReview(matched)),
            (status, None) => Err(CoreError::Validation(format!(
                "capture in status {status} has no project match"
            ))),
        }
    }
}

/// Saga step reached while filing a capture.
///
/// ```text
/// classified → project-resolved → task-created → logged
/// ```
///
/// Each step names the ids created so far, so a resumed apply skips them.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ApplyStep {
    Classified,
    ProjectResolved {
        project_id: String,
    },
    TaskCreated {
        project_id: String,
        task_id: String,
    },
    Logged {
        project_id: String,
        task_id: String,
    },
}

impl ApplyStep {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Classified => "classified",
            Self::ProjectResolved { .. } => "project-resolved",
            Self::TaskCreated { .. } => "task-created",
            Self::Logged { .. } => "logged",
        }
    }

    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        match self {
            Self::Classified => None,
            Self::ProjectResolved { project_id }
            | Self::TaskCreated { project_id, .. }
            | Self::Logged { project_id, .. } => Some(project_id),
        }
    }

    #[must_use]
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::Classified | Self::ProjectResolved { .. } => None,
            Self::TaskCreated { task_id, .. } | Self::Logged { task_id, .. } => Some(task_id),
        }
    }
}

/// Persisted saga marker: the step reached and the match being filed against.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ApplyProgress {
    pub step: ApplyStep,
    pub target: ProjectMatch,
}

/// A raw thought thrown into the inbox and what became of it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CaptureRecord {
    pub id: String,
    /// Never changes after creation.
    pub original_text: String,
    /// Empty until classified.
    pub rewritten_text: String,
    pub tags_applied: Tags,
    pub list: Option<GtdList>,
    pub state: CaptureState,
    pub progress: Option<ApplyProgress>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CaptureRecord {
    #[must_use]
    pub const fn status(&self) -> CaptureStatus {
        self.state.status()
    }

    #[must_use]
    pub const fn project_match(&self) -> Option<&ProjectMatch> {
        self.state.project_match()
    }

    /// Title a task filed from this capture gets: the rewrite, else the original text.
    #[must_use]
    pub fn filing_title(&self) -> &str {
        let rewritten = self.rewritten_text.trim();
        if rewritten.is_empty() {
            &self.original_text
        } else {
            rewritten
        }
    }
}
