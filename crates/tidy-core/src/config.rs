use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the optional config file looked up next to the index document.
pub const CONFIG_FILE_NAME: &str = ".notion-tidy.yaml";

/// Top-level configuration for a cleanup run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TidyConfig {
    /// Plan only; never touch the disk
    #[serde(default)]
    pub dry_run: bool,
    /// Strip hashes from documents no section links to
    #[serde(default = "default_true")]
    pub rename_orphans: bool,
    /// Remove folders left empty after the moves
    #[serde(default = "default_true")]
    pub remove_empty_dirs: bool,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log every planned move at info level
    #[serde(default = "default_true")]
    pub show_plan: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { show_plan: true }
    }
}

impl Default for TidyConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            rename_orphans: true,
            remove_empty_dirs: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl TidyConfig {
    /// Load config from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Config file that applies to an index document, if one exists.
    pub fn path_for_index(index_path: &Path) -> Option<std::path::PathBuf> {
        let candidate = index_path.parent()?.join(CONFIG_FILE_NAME);
        candidate.is_file().then_some(candidate)
    }
}
