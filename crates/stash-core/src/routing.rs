//! Confidence routing: decide between auto-filing and human review.
//!
//! Routing looks at `projectMatch.confidence` and nothing else. A brand-new
//! project proposed with high confidence is still filed automatically.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classification::ClassificationResult;

/// Minimum confidence for automatic filing.
pub const CONFIDENCE_THRESHOLD: u8 = 90;

/// Where a classified capture goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// File the capture without asking.
    Auto,
    /// Park the capture in the review queue.
    Review,
}

impl Route {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Review => "review",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route a classification with the fixed [`CONFIDENCE_THRESHOLD`].
#[must_use]
pub const fn route(result: &ClassificationResult) -> Route {
    route_with_threshold(result, CONFIDENCE_THRESHOLD)
}

/// Route a classification against a configured threshold.
#[must_use]
pub const fn route_with_threshold(result: &ClassificationResult, threshold: u8) -> Route {
    route_confidence(result.project_match.confidence, threshold)
}

/// `Auto` iff `confidence >= threshold`.
#[must_use]
pub const fn route_confidence(confidence: u8, threshold: u8) -> Route {
    if confidence >= threshold {
        Route::Auto
    } else {
        Route::Review
    }
}
