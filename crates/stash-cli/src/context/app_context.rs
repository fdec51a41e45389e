use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use stash_classify::Classifier;
use stash_config::StashConfig;
use stash_db::service::StashService;
use stash_pipeline::Scheduler;

/// Shared application resources initialized once at startup.
///
/// The classifier is built on demand: capturing, listing and reviewing work
/// without one.
pub struct AppContext {
    pub service: Arc<StashService>,
    pub config: StashConfig,
}

impl AppContext {
    pub async fn init(config: StashConfig) -> anyhow::Result<Self> {
        if let Some(dir) = config.database.parent_dir() {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }

        let service = StashService::open_local(&config.database.path)
            .await
            .with_context(|| format!("failed to open database at {}", config.database.path))?;

        Ok(Self {
            service: Arc::new(service),
            config,
        })
    }

    pub fn classifier(&self) -> anyhow::Result<Arc<dyn Classifier>> {
        stash_classify::from_config(&self.config.classifier).context(
            "classifier unavailable: set STASH_CLASSIFIER__ENDPOINT (service backend) \
             or STASH_CLASSIFIER__API_KEY (gemini backend)",
        )
    }

    /// A scheduler honouring the configured threshold and classification timeout.
    pub fn scheduler(&self) -> anyhow::Result<Scheduler> {
        let pipeline = &self.config.pipeline;
        Ok(
            Scheduler::new(Arc::clone(&self.service), self.classifier()?)
                .with_threshold(pipeline.confidence_threshold)
                .with_classify_timeout(Duration::from_secs(pipeline.classify_timeout_secs)),
        )
    }
}
