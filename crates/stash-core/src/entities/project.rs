use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::ProjectStatus;

/// A multi-step outcome that tasks are filed under.
///
/// `name` is what the classifier matches against. It is not unique: two
/// projects may share a name.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
    /// What "done" looks like.
    pub outcome: String,
    pub status: ProjectStatus,
    pub sections: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
