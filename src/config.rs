use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::session::text_input::Settings;
use crate::store::json_store::JsonStore;

const MIN_TARGET_WPM: u32 = 10;
const MAX_TARGET_WPM: u32 = 200;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_target_wpm")]
    pub target_wpm: u32,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub settings: Settings,
}

fn default_target_wpm() -> u32 {
    35
}
fn default_data_dir() -> String {
    JsonStore::default_dir().to_string_lossy().to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_wpm: default_target_wpm(),
            data_dir: default_data_dir(),
            settings: Settings::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keystep")
            .join("config.toml")
    }

    pub fn target_cpm(&self) -> f64 {
        self.target_wpm as f64 * 5.0
    }

    /// Clamp out-of-range values left behind by hand-edited configs.
    pub fn validate(&mut self) {
        self.target_wpm = self.target_wpm.clamp(MIN_TARGET_WPM, MAX_TARGET_WPM);
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
    }
}
