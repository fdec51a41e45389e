//! # stash-config
//!
//! Layered configuration loading for Stash using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`STASH_*` prefix, `__` as separator)
//! 2. Project-level `.stash/config.toml`
//! 3. User-level `~/.config/stash/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `STASH_CLASSIFIER__API_KEY` -> `classifier.api_key`,
//! `STASH_PIPELINE__CONFIDENCE_THRESHOLD` -> `pipeline.confidence_threshold`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use stash_config::StashConfig;
//!
//! let config = StashConfig::load_with_dotenv().expect("config");
//!
//! if config.classifier.is_configured() {
//!     println!("Classifier: {}", config.classifier.base_url());
//! }
//! ```

mod classifier;
mod database;
mod error;
mod general;
mod pipeline;

pub use classifier::{ClassifierBackend, ClassifierConfig, GEMINI_DEFAULT_ENDPOINT};
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use pipeline::PipelineConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Project-local directory holding the config file, database, and worker lock.
pub const STASH_DIR: &str = ".stash";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StashConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl StashConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if a source cannot be parsed, or
    /// `ConfigError::InvalidValue` if pipeline settings are out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// Loads `.env` from the current directory (if present) before building the figment.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(STASH_DIR).join("config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment = figment.merge(Env::prefixed("STASH_").split("__"));

        figment
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("stash").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_loads() {
        let config = StashConfig::default();
        assert!(!config.classifier.is_configured());
        assert_eq!(config.database.path, ".stash/stash.db");
        assert_eq!(config.pipeline.confidence_threshold, 90);
    }

    #[test]
    fn figment_builds_without_files() {
        figment::Jail::expect_with(|_jail| {
            let config: StashConfig = StashConfig::figment().extract()?;
            assert!(!config.classifier.is_configured());
            assert_eq!(config.general.default_limit, 20);
            Ok(())
        });
    }
}
