//! Local libSQL database configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_path() -> String {
    ".stash/stash.db".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database file path, relative to the working directory unless absolute.
    /// `:memory:` opens a throwaway in-memory database.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

impl DatabaseConfig {
    /// Whether the database lives only in memory.
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }

    /// Directory that must exist before the database file can be created.
    pub fn parent_dir(&self) -> Option<PathBuf> {
        if self.is_in_memory() {
            return None;
        }
        PathBuf::from(&self.path)
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_is_project_local() {
        let config = DatabaseConfig::default();
        assert_eq!(config.path, ".stash/stash.db");
        assert_eq!(config.parent_dir(), Some(PathBuf::from(".stash")));
    }

    #[test]
    fn memory_database_has_no_parent() {
        let config = DatabaseConfig {
            path: ":memory:".into(),
        };
        assert!(config.is_in_memory());
        assert_eq!(config.parent_dir(), None);
    }

    #[test]
    fn bare_file_name_has_no_parent() {
        let config = DatabaseConfig {
            path: "stash.db".into(),
        };
        assert_eq!(config.parent_dir(), None);
    }
}
