//! Entity structs for all Stash domain objects.
//!
//! Each entity maps to a table in the libSQL database (see `stash-db` migrations).
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` for JSON output
//! and `stash schema`.

mod activity;
mod capture;
mod project;
mod task;

pub use activity::{ActivityLogEntry, ActivityMetadata};
pub use capture::{ApplyProgress, ApplyStep, CaptureRecord, CaptureState};
pub use project::Project;
pub use task::{Subtask, Task};
