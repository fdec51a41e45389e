//! Capture draft types: what a classification proposes and what a reviewer edits.

use serde::Serialize;
use stash_core::classification::{ClassificationResult, ProjectMatch, Tags};
use stash_core::enums::{GtdList, TimeEstimate};

/// The filing proposal stored on a capture: rewritten text, tags, list and match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptureDraft {
    pub rewritten_text: String,
    pub tags: Tags,
    pub list: Option<GtdList>,
    pub project_match: ProjectMatch,
}

impl From<&ClassificationResult> for CaptureDraft {
    fn from(result: &ClassificationResult) -> Self {
        Self {
            rewritten_text: result.rewritten_title.clone(),
            tags: result.tags.clone(),
            list: result.list,
            project_match: result.project_match.clone(),
        }
    }
}

impl CaptureDraft {
    /// The draft recorded when classification failed: empty rewrite, default
    /// tags, and the zero-confidence `Error` match.
    #[must_use]
    pub fn classification_error() -> Self {
        Self {
            rewritten_text: String::new(),
            tags: Tags::default(),
            list: None,
            project_match: ProjectMatch::classification_error(),
        }
    }
}

/// Human edits to a review draft. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DraftUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewritten_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeEstimate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contexts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<GtdList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Option<String>>,
}

impl DraftUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rewritten_text.is_none()
            && self.time.is_none()
            && self.energy.is_none()
            && self.contexts.is_none()
            && self.list.is_none()
            && self.project_name.is_none()
            && self.project_id.is_none()
            && self.is_new.is_none()
            && self.outcome.is_none()
    }

    /// Apply the edits to `draft` in place.
    pub fn apply_to(&self, draft: &mut CaptureDraft) {
        if let Some(ref text) = self.rewritten_text {
            draft.rewritten_text.clone_from(text);
        }
        if let Some(time) = self.time {
            draft.tags.time = time;
        }
        if let Some(ref energy) = self.energy {
            draft.tags.energy.clone_from(energy);
        }
        if let Some(ref contexts) = self.contexts {
            draft.tags.contexts.clone_from(contexts);
        }
        if let Some(list) = self.list {
            draft.list = Some(list);
        }
        if let Some(ref name) = self.project_name {
            draft.project_match.name.clone_from(name);
        }
        if let Some(ref id) = self.project_id {
            draft.project_match.id.clone_from(id);
        }
        if let Some(is_new) = self.is_new {
            draft.project_match.is_new = is_new;
        }
        if let Some(ref outcome) = self.outcome {
            draft.project_match.outcome.clone_from(outcome);
        }
    }
}

pub struct DraftUpdateBuilder(DraftUpdate);

impl DraftUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(DraftUpdate::default())
    }

    #[must_use]
    pub fn rewritten_text(mut self, text: impl Into<String>) -> Self {
        self.0.rewritten_text = Some(text.into());
        self
    }

    #[must_use]
    pub const fn time(mut self, time: TimeEstimate) -> Self {
        self.0.time = Some(time);
        self
    }

    #[must_use]
    pub fn energy(mut self, energy: Option<String>) -> Self {
        self.0.energy = Some(energy);
        self
    }

    #[must_use]
    pub fn contexts(mut self, contexts: Vec<String>) -> Self {
        self.0.contexts = Some(contexts);
        self
    }

    #[must_use]
    pub const fn list(mut self, list: GtdList) -> Self {
        self.0.list = Some(list);
        self
    }

    #[must_use]
    pub fn project_name(mut self, name: impl Into<String>) -> Self {
        self.0.project_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn project_id(mut self, id: Option<String>) -> Self {
        self.0.project_id = Some(id);
        self
    }

    #[must_use]
    pub const fn is_new(mut self, is_new: bool) -> Self {
        self.0.is_new = Some(is_new);
        self
    }

    #[must_use]
    pub fn outcome(mut self, outcome: Option<String>) -> Self {
        self.0.outcome = Some(outcome);
        self
    }

    #[must_use]
    pub fn build(self) -> DraftUpdate {
        self.0
    }
}

impl Default for DraftUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn apply_only_touches_set_fields() {
        let mut draft = CaptureDraft {
            rewritten_text: "Call mom".into(),
            tags: Tags {
                time: TimeEstimate::FiveMin,
                energy: None,
                contexts: vec!["@calls".into()],
            },
            list: Some(GtdList::Next),
            project_match: ProjectMatch {
                id: Some("prj-1".into()),
                name: "Family".into(),
                is_new: false,
                outcome: None,
                confidence: 70,
            },
        };

        let update = DraftUpdateBuilder::new()
            .rewritten_text("Call mom about Sunday")
            .list(GtdList::Waiting)
            .build();
        update.apply_to(&mut draft);

        assert_eq!(draft.rewritten_text, "Call mom about Sunday");
        assert_eq!(draft.list, Some(GtdList::Waiting));
        assert_eq!(draft.tags.contexts, vec!["@calls".to_string()]);
        assert_eq!(draft.project_match.id.as_deref(), Some("prj-1"));
        assert_eq!(draft.project_match.confidence, 70);
    }

    #[test]
    fn switching_to_new_project_clears_id() {
        let mut draft = CaptureDraft::classification_error();
        DraftUpdateBuilder::new()
            .project_name("Garden")
            .project_id(None)
            .is_new(true)
            .outcome(Some("Beds planted".into()))
            .build()
            .apply_to(&mut draft);

        assert_eq!(draft.project_match.name, "Garden");
        assert!(draft.project_match.is_new);
        assert_eq!(draft.project_match.outcome.as_deref(), Some("Beds planted"));
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(DraftUpdate::default().is_empty());
        assert!(!DraftUpdateBuilder::new().time(TimeEstimate::ThirtyMin).build().is_empty());
    }
}
