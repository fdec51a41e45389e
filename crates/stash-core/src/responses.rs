//! Response types returned as JSON by `stash` commands and pipeline operations.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::classification::TaskGroup;
use crate::entities::{CaptureRecord, Project, Subtask, Task};
use crate::enums::CaptureStatus;

/// Everything a completed filing touched.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AppliedEffect {
    pub capture: CaptureRecord,
    /// `None` when the match named an existing id the store does not hold.
    pub project: Option<Project>,
    pub project_id: String,
    pub task: Task,
    /// Whether this filing created `project`.
    pub project_created: bool,
}

/// One capture taken out of `pending` by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProcessedCapture {
    pub capture_id: String,
    pub status: CaptureStatus,
}

/// Response from `stash process`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProcessReport {
    pub processed: Vec<ProcessedCapture>,
    pub remaining_pending: u32,
    /// Set when draining stopped because a filing failed part-way.
    pub error: Option<String>,
}

/// Response from `stash task decompose`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DecomposeResponse {
    pub task: Task,
    pub added: Vec<Subtask>,
}

/// Response from `stash project group`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GroupResponse {
    pub project_id: String,
    pub groups: Vec<TaskGroup>,
    pub tasks_updated: u32,
}

/// Response from `stash ask`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AskResponse {
    pub question: String,
    pub reply: String,
    /// How many tasks and projects the assistant was shown.
    pub tasks_in_context: u32,
    pub projects_in_context: u32,
}
