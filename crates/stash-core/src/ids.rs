//! ID prefix constants.
//!
//! IDs are generated in SQL as `{prefix}-{8 hex chars}` (see `StashDb::generate_id`).
//! The prefix makes an ID's entity type readable at a glance in logs and CLI output.

pub const PREFIX_CAPTURE: &str = "cap";
pub const PREFIX_PROJECT: &str = "prj";
pub const PREFIX_TASK: &str = "tsk";
pub const PREFIX_SUBTASK: &str = "sub";
pub const PREFIX_ACTIVITY: &str = "act";

/// Every prefix in use, for tests that sweep all entity types.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_CAPTURE,
    PREFIX_PROJECT,
    PREFIX_TASK,
    PREFIX_SUBTASK,
    PREFIX_ACTIVITY,
];

/// Return the prefix part of an ID, if it has one.
#[must_use]
pub fn prefix_of(id: &str) -> Option<&str> {
    id.split_once('-').map(|(prefix, _)| prefix)
}
