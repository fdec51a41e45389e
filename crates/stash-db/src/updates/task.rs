//! Task update builder.

use serde::Serialize;
use stash_core::classification::Tags;
use stash_core::enums::GtdList;

#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<GtdList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

impl TaskUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.list.is_none()
            && self.project_id.is_none()
            && self.category.is_none()
            && self.tags.is_none()
    }
}

pub struct TaskUpdateBuilder(TaskUpdate);

impl TaskUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(TaskUpdate::default())
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.0.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.0.description = Some(description);
        self
    }

    #[must_use]
    pub const fn list(mut self, list: GtdList) -> Self {
        self.0.list = Some(list);
        self
    }

    #[must_use]
    pub fn project_id(mut self, project_id: Option<String>) -> Self {
        self.0.project_id = Some(project_id);
        self
    }

    #[must_use]
    pub fn category(mut self, category: Option<String>) -> Self {
        self.0.category = Some(category);
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: Tags) -> Self {
        self.0.tags = Some(tags);
        self
    }

    #[must_use]
    pub fn build(self) -> TaskUpdate {
        self.0
    }
}

impl Default for TaskUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
