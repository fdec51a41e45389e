//! Capture pipeline tuning.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default auto-filing threshold.
const fn default_confidence_threshold() -> u8 {
    90
}

/// Default upper bound on one classification call, in seconds.
const fn default_classify_timeout_secs() -> u64 {
    45
}

/// Default worker poll interval, in seconds.
const fn default_poll_interval_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Captures whose project match confidence is at least this are filed automatically.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: u8,

    /// A classification that takes longer is treated as failed.
    #[serde(default = "default_classify_timeout_secs")]
    pub classify_timeout_secs: u64,

    /// How often `watch` rescans even without a change notification.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            classify_timeout_secs: default_classify_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl PipelineConfig {
    /// Reject values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.confidence_threshold > 100 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.confidence_threshold".into(),
                reason: format!("{} is outside 0..=100", self.confidence_threshold),
            });
        }
        if self.classify_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.classify_timeout_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.poll_interval_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
