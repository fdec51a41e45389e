use std::path::PathBuf;

use anyhow::Context;
use stash_config::{STASH_DIR, StashConfig};

/// Load layered configuration, reading `.env` from the working directory first.
pub fn load_config() -> anyhow::Result<StashConfig> {
    let config = StashConfig::load_with_dotenv().context("failed to load stash configuration")?;
    if !config.classifier.is_configured() {
        tracing::debug!(
            backend = ?config.classifier.backend,
            "classifier not configured; capture and review still work, processing does not"
        );
    }
    Ok(config)
}

/// Directory holding the worker lock: the database's directory, else `.stash`.
pub fn stash_dir(config: &StashConfig) -> PathBuf {
    config
        .database
        .parent_dir()
        .unwrap_or_else(|| PathBuf::from(STASH_DIR))
}
