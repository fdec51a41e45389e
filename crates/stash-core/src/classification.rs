//! The classification contract shared by every classifier backend.
//!
//! These types are the JSON wire shape of the external classification service
//! (`camelCase` field names) and are persisted verbatim inside capture records.
//! Deserialization is strict: an unknown time estimate, a missing title or an
//! out-of-range confidence makes the whole response malformed.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::entities::{Project, Task};
use crate::enums::{GtdList, ProjectStatus, TimeEstimate};
use crate::errors::CoreError;

/// Context labels the classifier is allowed to choose from.
pub const KNOWN_CONTEXTS: &[&str] = &[
    "@calls",
    "@computer",
    "@errands",
    "@home",
    "@office",
    "Admin",
];

/// Lists a classification may file into.
pub const CLASSIFIED_LISTS: &[GtdList] = &[GtdList::Next, GtdList::Waiting, GtdList::Someday];

/// Project name stamped on the match of a capture whose classification failed.
pub const ERROR_MATCH_NAME: &str = "Error";

/// Tag set applied to a capture and copied onto the task it produces.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Tags {
    #[serde(default)]
    pub time: TimeEstimate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<String>,
    #[serde(default)]
    pub contexts: Vec<String>,
}

/// The classifier's opinion on which project a capture belongs to.
///
/// `confidence` measures certainty in the project choice only, never the
/// quality of the rewritten title.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMatch {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(deserialize_with = "deserialize_confidence")]
    #[schemars(with = "u8")]
    pub confidence: u8,
}

impl ProjectMatch {
    /// The zero-confidence match recorded when classification fails.
    #[must_use]
    pub fn classification_error() -> Self {
        Self {
            id: None,
            name: ERROR_MATCH_NAME.to_string(),
            is_new: false,
            outcome: None,
            confidence: 0,
        }
    }

    /// A match pointing at an existing project, confirmed by a human or by filing.
    #[must_use]
    pub fn confirmed(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
            is_new: false,
            outcome: None,
            confidence: 100,
        }
    }

    /// Whether applying this match must create a project.
    ///
    /// True for `is_new`, and also for the inconsistent case of an existing-project
    /// claim that carries no id: the displayed name becomes a new project.
    #[must_use]
    pub fn requires_new_project(&self) -> bool {
        self.is_new || self.id.as_deref().is_none_or(str::is_empty)
    }
}

/// Accept a whole number in `0..=100`.
///
/// `90` and `90.0` are the same answer; `89.6` is not a confidence and makes
/// the response malformed rather than being rounded across the threshold.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn deserialize_confidence<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() || !(0.0..=100.0).contains(&raw) {
        return Err(serde::de::Error::custom(format!(
            "confidence {raw} outside 0..=100"
        )));
    }
    if raw.fract() > 0.0 {
        return Err(serde::de::Error::custom(format!(
            "confidence {raw} is not a whole number"
        )));
    }
    Ok(raw as u8)
}

/// A project the classifier may match against, sent as context.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct KnownProject {
    pub id: String,
    pub name: String,
}

/// Request body of the classification call.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRequest {
    pub text: String,
    pub existing_projects: Vec<KnownProject>,
}

/// Structured output produced from one capture.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub rewritten_title: String,
    #[serde(default)]
    pub list: Option<GtdList>,
    #[serde(default)]
    pub tags: Tags,
    pub project_match: ProjectMatch,
}

impl ClassificationResult {
    /// Normalize and check a freshly deserialized result.
    ///
    /// Trims the title and project name, turns an empty id into `None`, and
    /// rejects results that could not be filed.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` when the title or project name is blank,
    /// or the list is `inbox` (the classifier files out of the inbox, never into it).
    pub fn validated(mut self) -> Result<Self, CoreError> {
        self.rewritten_title = self.rewritten_title.trim().to_string();
        self.project_match.name = self.project_match.name.trim().to_string();
        if self.project_match.id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            self.project_match.id = None;
        }
        if self.rewritten_title.is_empty() {
            return Err(CoreError::Validation(
                "classification has an empty rewrittenTitle".to_string(),
            ));
        }
        if self.project_match.name.is_empty() {
            return Err(CoreError::Validation(
                "classification has an empty projectMatch.name".to_string(),
            ));
        }
        if let Some(list) = self.list.filter(|list| !CLASSIFIED_LISTS.contains(list)) {
            return Err(CoreError::Validation(format!(
                "classification chose list '{list}', expected next, waiting or someday"
            )));
        }
        Ok(self)
    }

    /// The list to file into; a missing list means `next`.
    #[must_use]
    pub fn effective_list(&self) -> GtdList {
        self.list.unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Subtask decomposition
// ---------------------------------------------------------------------------

/// Request body of the subtask decomposition call.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SubtaskRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Response of the subtask decomposition call: 3-6 actionable steps.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SubtaskResponse {
    pub subtasks: Vec<String>,
}

// ---------------------------------------------------------------------------
// Task grouping
// ---------------------------------------------------------------------------

/// One task offered for grouping.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GroupingTask {
    pub id: String,
    pub title: String,
}

/// Request body of the task grouping call.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupingRequest {
    pub project_name: String,
    pub tasks: Vec<GroupingTask>,
    pub existing_groups: Vec<String>,
}

/// A named category and the tasks placed in it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskGroup {
    pub category_name: String,
    pub task_ids: Vec<String>,
}

/// Response of the task grouping call.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GroupingResponse {
    pub groups: Vec<TaskGroup>,
}

impl GroupingResponse {
    /// Check that every requested task appears in exactly one group and that
    /// no group references an unknown task or has a blank name.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` describing the first violation found.
    pub fn validate_against(&self, request: &GroupingRequest) -> Result<(), CoreError> {
        let mut seen = std::collections::HashSet::new();
        for group in &self.groups {
            if group.category_name.trim().is_empty() {
                return Err(CoreError::Validation(
                    "group has an empty categoryName".to_string(),
                ));
            }
            for task_id in &group.task_ids {
                if !request.tasks.iter().any(|task| &task.id == task_id) {
                    return Err(CoreError::Validation(format!(
                        "group '{}' references unknown task {task_id}",
                        group.category_name
                    )));
                }
                if !seen.insert(task_id.as_str()) {
                    return Err(CoreError::Validation(format!(
                        "task {task_id} appears in more than one group"
                    )));
                }
            }
        }
        if let Some(missing) = request
            .tasks
            .iter()
            .find(|task| !seen.contains(task.id.as_str()))
        {
            return Err(CoreError::Validation(format!(
                "task {} was not placed in any group",
                missing.id
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Assistant chat
// ---------------------------------------------------------------------------

/// Request body of the assistant chat call.
///
/// `context` is a JSON document ([`AssistantContext`]) serialized to a string,
/// so the service can paste it into its prompt unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub context: String,
}

/// Response of the assistant chat call.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ChatResponse {
    pub reply: String,
}

/// A task as the assistant sees it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ContextTask {
    pub id: String,
    pub title: String,
    pub list: GtdList,
    pub tags: Tags,
}

/// A project as the assistant sees it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ContextProject {
    pub name: String,
    pub status: ProjectStatus,
    pub outcome: String,
}

impl From<&Task> for ContextTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            list: task.list,
            tags: task.tags.clone(),
        }
    }
}

impl From<&Project> for ContextProject {
    fn from(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            status: project.status,
            outcome: project.outcome.clone(),
        }
    }
}

/// The user's tasks and projects, sent along with every chat question.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AssistantContext {
    pub tasks: Vec<ContextTask>,
    pub projects: Vec<ContextProject>,
}
