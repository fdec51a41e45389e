//! Pipeline error types.

use std::time::Duration;

use stash_classify::ClassifyError;
use stash_core::errors::CoreError;
use stash_db::error::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("classifier: {0}")]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// The classifier did not answer in time.
    #[error("classification timed out after {after:?}")]
    Timeout { after: Duration },

    /// Filing stopped part-way; the capture keeps its progress marker and a
    /// later attempt resumes from it.
    #[error("filing capture {capture_id} stopped at {step}: {source}")]
    Apply {
        capture_id: String,
        step: &'static str,
        #[source]
        source: DatabaseError,
    },
}
