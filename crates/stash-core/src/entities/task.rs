use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::classification::Tags;
use crate::enums::{GtdList, TaskStatus};

/// A single next action.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub list: GtdList,
    pub project_id: Option<String>,
    pub tags: Tags,
    /// Text of the capture this task was filed from.
    pub original_thought: Option<String>,
    /// Category assigned by task grouping.
    pub category: Option<String>,
    pub subtasks: Vec<Subtask>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A checklist item inside a task.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    pub completed: bool,
}
