//! Status enums, list and tag vocabularies, and entity types for Stash.
//!
//! Capture statuses and activity types serialize as kebab-case (`needs-review`,
//! `ai-processed`); every other enum uses single lowercase words. Status enums
//! with state machines provide `allowed_next_states()` so the store can refuse
//! invalid transitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// CaptureStatus
// ---------------------------------------------------------------------------

/// Processing status of a captured thought.
///
/// ```text
/// pending → success
///         → needs-review → success
///                        → discarded
/// ```
///
/// `success` and `discarded` are terminal. A record never returns to `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureStatus {
    Pending,
    Success,
    NeedsReview,
    Discarded,
}

impl CaptureStatus {
    /// Valid next states from the current state.
    #[must_use]
    #[allow(clippy::match_same_arms)]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Success, Self::NeedsReview],
            Self::NeedsReview => &[Self::Success, Self::Discarded],
            Self::Success | Self::Discarded => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Discarded)
    }

    /// Return the string representation used in SQL storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::NeedsReview => "needs-review",
            Self::Discarded => "discarded",
        }
    }
}

impl fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TaskStatus
// ---------------------------------------------------------------------------

/// Status of a task.
///
/// ```text
/// todo → done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    Done,
}

impl TaskStatus {
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Todo => &[Self::Done],
            Self::Done => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ProjectStatus
// ---------------------------------------------------------------------------

/// Status of a project. Projects created by the pipeline start `active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Completed,
    Archived,
}

impl ProjectStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GtdList
// ---------------------------------------------------------------------------

/// The "getting things done" list a task lives on.
///
/// The classifier only proposes `next`, `waiting`, or `someday`; `inbox` is
/// accepted for manually created tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GtdList {
    Inbox,
    #[default]
    Next,
    Waiting,
    Someday,
}

impl GtdList {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Next => "next",
            Self::Waiting => "waiting",
            Self::Someday => "someday",
        }
    }
}

impl fmt::Display for GtdList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TimeEstimate
// ---------------------------------------------------------------------------

/// Rough effort estimate attached to a filed task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum TimeEstimate {
    #[serde(rename = "5 min")]
    FiveMin,
    #[default]
    #[serde(rename = "15 min")]
    FifteenMin,
    #[serde(rename = "30 min")]
    ThirtyMin,
    #[serde(rename = "60 min+")]
    SixtyPlus,
}

impl TimeEstimate {
    pub const ALL: [Self; 4] = [
        Self::FiveMin,
        Self::FifteenMin,
        Self::ThirtyMin,
        Self::SixtyPlus,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FiveMin => "5 min",
            Self::FifteenMin => "15 min",
            Self::ThirtyMin => "30 min",
            Self::SixtyPlus => "60 min+",
        }
    }
}

impl fmt::Display for TimeEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ActivityType
// ---------------------------------------------------------------------------

/// What kind of event an activity log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityType {
    AiProcessed,
    UserUpdate,
    UserComplete,
    UserCreateProject,
}

impl ActivityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AiProcessed => "ai-processed",
            Self::UserUpdate => "user-update",
            Self::UserComplete => "user-complete",
            Self::UserCreateProject => "user-create-project",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Entity kinds, used in error messages and `stash schema`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Capture,
    Project,
    Task,
    Activity,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Capture => "capture",
            Self::Project => "project",
            Self::Task => "task",
            Self::Activity => "activity",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // --- Serde roundtrip tests ---

    macro_rules! test_serde_roundtrip {
        ($name:ident, $ty:ty, $variant:expr, $expected_str:expr) => {
            #[test]
            fn $name() {
                let val = $variant;
                let json = serde_json::to_string(&val).unwrap();
                assert_eq!(json, format!("\"{}\"", $expected_str));
                let recovered: $ty = serde_json::from_str(&json).unwrap();
                assert_eq!(recovered, val);
            }
        };
    }

    test_serde_roundtrip!(
        capture_needs_review,
        CaptureStatus,
        CaptureStatus::NeedsReview,
        "needs-review"
    );
    test_serde_roundtrip!(task_todo, TaskStatus, TaskStatus::Todo, "todo");
    test_serde_roundtrip!(list_someday, GtdList, GtdList::Someday, "someday");
    test_serde_roundtrip!(
        time_sixty_plus,
        TimeEstimate,
        TimeEstimate::SixtyPlus,
        "60 min+"
    );
    test_serde_roundtrip!(
        activity_ai_processed,
        ActivityType,
        ActivityType::AiProcessed,
        "ai-processed"
    );
    test_serde_roundtrip!(
        activity_user_create_project,
        ActivityType,
        ActivityType::UserCreateProject,
        "user-create-project"
    );

    #[test]
    fn as_str_matches_serde_for_time_estimates() {
        for estimate in TimeEstimate::ALL {
            let json = serde_json::to_string(&estimate).unwrap();
            assert_eq!(json, format!("\"{}\"", estimate.as_str()));
        }
    }

    #[test]
    fn unknown_time_estimate_is_rejected() {
        assert!(serde_json::from_str::<TimeEstimate>("\"45 min\"").is_err());
    }

    // --- Transition tests ---

    #[test]
    fn capture_valid_transitions() {
        assert!(CaptureStatus::Pending.can_transition_to(CaptureStatus::Success));
        assert!(CaptureStatus::Pending.can_transition_to(CaptureStatus::NeedsReview));
        assert!(CaptureStatus::NeedsReview.can_transition_to(CaptureStatus::Success));
        assert!(CaptureStatus::NeedsReview.can_transition_to(CaptureStatus::Discarded));
    }

    #[test]
    fn capture_never_returns_to_pending() {
        for status in [
            CaptureStatus::Success,
            CaptureStatus::NeedsReview,
            CaptureStatus::Discarded,
        ] {
            assert!(!status.can_transition_to(CaptureStatus::Pending));
        }
    }

    #[test]
    fn capture_pending_cannot_be_discarded() {
        assert!(!CaptureStatus::Pending.can_transition_to(CaptureStatus::Discarded));
    }

    #[test]
    fn capture_terminal_states() {
        assert!(CaptureStatus::Success.is_terminal());
        assert!(CaptureStatus::Discarded.is_terminal());
        assert!(CaptureStatus::Success.allowed_next_states().is_empty());
        assert!(!CaptureStatus::NeedsReview.is_terminal());
    }

    #[test]
    fn task_done_is_terminal() {
        assert!(TaskStatus::Todo.can_transition_to(TaskStatus::Done));
        assert!(!TaskStatus::Done.can_transition_to(TaskStatus::Todo));
    }

    #[test]
    fn gtd_list_defaults_to_next() {
        assert_eq!(GtdList::default(), GtdList::Next);
    }
}
