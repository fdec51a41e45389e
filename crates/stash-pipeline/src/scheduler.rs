//! Single-flight scheduler.
//!
//! One [`Scheduler::tick`] takes the oldest `pending` capture, classifies it,
//! routes it by confidence and either files it or parks it for review. The
//! [`LeaseSlot`] makes sure only one capture is in flight at a time, however
//! many callers tick concurrently; the rest see [`Tick::Busy`].

use std::sync::Arc;
use std::time::Duration;

use stash_classify::{Classifier, ClassifyError};
use stash_core::classification::{ClassificationResult, KnownProject};
use stash_core::entities::CaptureRecord;
use stash_core::enums::CaptureStatus;
use stash_core::responses::{ProcessReport, ProcessedCapture};
use stash_core::routing::{CONFIDENCE_THRESHOLD, Route, route_with_threshold};
use stash_db::service::StashService;
use stash_db::updates::capture::CaptureDraft;

use crate::applier::{ApplyOrigin, apply};
use crate::error::PipelineError;
use crate::lease::LeaseSlot;

/// How long a classification may take before it counts as failed.
pub const DEFAULT_CLASSIFY_TIMEOUT: Duration = Duration::from_secs(45);

/// Result of one scheduling step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// Nothing is pending.
    Idle,
    /// Another caller holds the lease for this capture.
    Busy { capture_id: String },
    /// A capture left `pending`.
    Processed(ProcessedCapture),
}

pub struct Scheduler {
    store: Arc<StashService>,
    classifier: Arc<dyn Classifier>,
    lease: LeaseSlot,
    threshold: u8,
    classify_timeout: Duration,
}

impl Scheduler {
    #[must_use]
    pub fn new(store: Arc<StashService>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            store,
            classifier,
            lease: LeaseSlot::new(),
            threshold: CONFIDENCE_THRESHOLD,
            classify_timeout: DEFAULT_CLASSIFY_TIMEOUT,
        }
    }

    /// Minimum confidence for automatic filing (`0..=100`).
    #[must_use]
    pub const fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub const fn with_classify_timeout(mut self, timeout: Duration) -> Self {
        self.classify_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<StashService> {
        &self.store
    }

    #[must_use]
    pub const fn classifier(&self) -> &Arc<dyn Classifier> {
        &self.classifier
    }

    #[must_use]
    pub const fn lease(&self) -> &LeaseSlot {
        &self.lease
    }

    /// Process the oldest pending capture, if the lease is free.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` if the store fails or filing stops part-way.
    /// A failed classification is not an error: the capture goes to review.
    pub async fn tick(&self) -> Result<Tick, PipelineError> {
        loop {
            if let Some(capture_id) = self.lease.holder() {
                return Ok(Tick::Busy { capture_id });
            }
            let Some(candidate) = self.store.oldest_pending_capture().await? else {
                return Ok(Tick::Idle);
            };
            let Some(lease) = self.lease.try_acquire(&candidate.id) else {
                continue;
            };

            // Re-read under the lease: the scan may predate another tick finishing this capture.
            let capture = self.store.get_capture(lease.capture_id()).await?;
            if capture.status() != CaptureStatus::Pending {
                drop(lease);
                continue;
            }

            tracing::debug!(capture_id = %capture.id, "capture claimed");
            let status = self.process(&capture).await?;
            drop(lease);

            return Ok(Tick::Processed(ProcessedCapture {
                capture_id: capture.id,
                status,
            }));
        }
    }

    /// Tick until nothing is pending, the lease is busy, or a filing fails.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` only if the final pending count cannot be read;
    /// a failed tick is reported in [`ProcessReport::error`].
    pub async fn drain(&self) -> Result<ProcessReport, PipelineError> {
        let mut processed = Vec::new();
        let mut error = None;
        loop {
            match self.tick().await {
                Ok(Tick::Processed(done)) => processed.push(done),
                Ok(Tick::Idle | Tick::Busy { .. }) => break,
                Err(e) => {
                    tracing::error!(error = %e, "processing stopped");
                    error = Some(e.to_string());
                    break;
                }
            }
        }

        let remaining_pending = self
            .store
            .count_captures(Some(CaptureStatus::Pending))
            .await?;
        Ok(ProcessReport {
            processed,
            remaining_pending,
            error,
        })
    }

    async fn process(&self, capture: &CaptureRecord) -> Result<CaptureStatus, PipelineError> {
        if capture.progress.is_some() {
            // Routed to auto-filing by an earlier attempt that stopped part-way.
            let effect = apply(&self.store, capture, ApplyOrigin::Auto).await?;
            return Ok(effect.capture.status());
        }

        let known_projects = self.store.known_projects().await?;
        match self.classify(capture, &known_projects).await {
            Ok(result) => {
                let route = route_with_threshold(&result, self.threshold);
                tracing::info!(
                    capture_id = %capture.id,
                    confidence = result.project_match.confidence,
                    %route,
                    "capture classified"
                );
                let draft = CaptureDraft::from(&result);
                match route {
                    Route::Auto => {
                        let staged = self.store.stage_for_filing(&capture.id, &draft).await?;
                        let effect = apply(&self.store, &staged, ApplyOrigin::Auto).await?;
                        Ok(effect.capture.status())
                    }
                    Route::Review => {
                        self.store
                            .mark_needs_review(&capture.id, &draft, None)
                            .await?;
                        Ok(CaptureStatus::NeedsReview)
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    capture_id = %capture.id,
                    error = %e,
                    "classification failed, sending to review"
                );
                self.store
                    .mark_needs_review(
                        &capture.id,
                        &CaptureDraft::classification_error(),
                        Some(&e.to_string()),
                    )
                    .await?;
                Ok(CaptureStatus::NeedsReview)
            }
        }
    }

    /// Classify under the timeout and re-check the result against the contract.
    async fn classify(
        &self,
        capture: &CaptureRecord,
        known_projects: &[KnownProject],
    ) -> Result<ClassificationResult, PipelineError> {
        let call = self
            .classifier
            .classify(&capture.original_text, known_projects);
        match tokio::time::timeout(self.classify_timeout, call).await {
            Ok(result) => Ok(result?.validated().map_err(ClassifyError::from)?),
            Err(_) => Err(PipelineError::Timeout {
                after: self.classify_timeout,
            }),
        }
    }
}
