use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::cloud::DEFAULT_GRAPH_ENDPOINT;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    /// Override for the Microsoft Graph endpoint (sovereign clouds, test
    /// doubles). Defaults to the public cloud endpoint.
    pub graph_endpoint: Option<String>,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;

        let config_dir = home.join(".config").join("wictl");

        // Create directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        }

        Ok(config_dir.join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Get the Graph endpoint (with default fallback)
    pub fn get_graph_endpoint(&self) -> String {
        self.graph_endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_GRAPH_ENDPOINT.to_string())
    }
}
