// Configuration file handling

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub results: ResultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultsConfig {
    /// Directory the file store writes into
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Pretty-print result JSON
    #[serde(default)]
    pub indent: bool,

    /// Remove the directory before the first write
    #[serde(default)]
    pub clean: bool,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            indent: false,
            clean: false,
        }
    }
}

// Default values
pub const ENV_ALLURE_RESULTS_DIRECTORY: &str = "ALLURE_RESULTS_DIRECTORY";
pub const CONFIG_FILE_NAME: &str = "allure.toml";

pub fn default_directory() -> PathBuf {
    PathBuf::from("allure-results")
}

impl Config {
    /// Configuration from the default locations, with environment overrides
    pub fn load() -> Self {
        let mut config = Self::locate()
            .and_then(|path| Self::load_from_file(&path))
            .unwrap_or_default();
        config.apply_env();
        config
    }

    /// First existing config file:
    /// `allure.toml` in the current directory, then `~/.allure.toml`
    pub fn locate() -> Option<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd.join(CONFIG_FILE_NAME));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(format!(".{}", CONFIG_FILE_NAME)));
        }
        paths.into_iter().find(|path| path.exists())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Option<Self> {
        toml::from_str(content).ok()
    }

    pub fn apply_env(&mut self) {
        if let Ok(directory) = std::env::var(ENV_ALLURE_RESULTS_DIRECTORY)
            && !directory.is_empty()
        {
            self.results.directory = PathBuf::from(directory);
        }
    }

    /// Generate configuration as TOML
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_else(|_| String::new())
    }
}
