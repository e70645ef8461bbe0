//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlexListConfig {
    /// SQLite file holding the layout documents
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    /// Prefix of the rolling log file names
    pub app_name: String,
    /// Recent log lines kept in memory
    pub log_buffer_lines: usize,
    /// Path prefix the console mounts the edit protocol under
    pub route_prefix: String,
}

impl Default for FlexListConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("flexlist.db"),
            log_dir: PathBuf::from("logs"),
            app_name: "FlexList".to_string(),
            log_buffer_lines: 500,
            route_prefix: "daf/".to_string(),
        }
    }
}

impl FlexListConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> DomainResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DomainError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| DomainError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Defaults overridden by `FLEXLIST_*` environment variables
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(db_path) = lookup("FLEXLIST_DB_PATH") {
            self.db_path = PathBuf::from(db_path);
        }
        if let Some(log_dir) = lookup("FLEXLIST_LOG_DIR") {
            self.log_dir = PathBuf::from(log_dir);
        }
        if let Some(app_name) = lookup("FLEXLIST_APP_NAME") {
            self.app_name = app_name;
        }
        self
    }
}
