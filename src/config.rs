use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::backend::{DEFAULT_ANALYZE_URL, DEFAULT_CHAT_URL};
use crate::chat::HISTORY_WINDOW;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub analyze_url: Option<String>,
    pub chat_url: Option<String>,
    pub history_window: Option<usize>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            analyze_url: None,
            chat_url: None,
            history_window: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    pub fn analyze_url(&self) -> &str {
        self.analyze_url.as_deref().unwrap_or(DEFAULT_ANALYZE_URL)
    }

    pub fn chat_url(&self) -> &str {
        self.chat_url.as_deref().unwrap_or(DEFAULT_CHAT_URL)
    }

    pub fn history_window(&self) -> usize {
        self.history_window.unwrap_or(HISTORY_WINDOW)
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("timesheet-cli").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();

        assert_eq!(config.analyze_url(), DEFAULT_ANALYZE_URL);
        assert_eq!(config.chat_url(), DEFAULT_CHAT_URL);
        assert_eq!(config.history_window(), HISTORY_WINDOW);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::new();
        config.analyze_url = Some("http://localhost:9000/timesheetanalyze".to_string());
        config.history_window = Some(4);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.analyze_url(), "http://localhost:9000/timesheetanalyze");
        assert_eq!(loaded.chat_url(), DEFAULT_CHAT_URL);
        assert_eq!(loaded.history_window(), 4);
    }
}
