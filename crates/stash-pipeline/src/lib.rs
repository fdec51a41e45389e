//! # stash-pipeline
//!
//! Turns pending captures into filed tasks.
//!
//! - [`scheduler`]: single-flight processing of the oldest pending capture
//!   (classify → route → file or park for review)
//! - [`applier`]: the resumable filing saga (project → task → activity → success)
//! - [`worker`]: the long-running owner of the store subscription
//! - [`review`]: human resolution of `needs-review` captures
//! - [`assist`]: subtask decomposition, task grouping and the assistant chat

pub mod applier;
pub mod assist;
pub mod error;
pub mod lease;
pub mod review;
pub mod scheduler;
pub mod worker;

pub use error::PipelineError;
pub use scheduler::{Scheduler, Tick};
pub use worker::{Worker, WorkerHandle};
