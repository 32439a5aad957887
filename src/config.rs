//! Application configuration, separate from mapping profiles.
//!
//! Profiles are portable JSON documents the user saves and loads
//! explicitly; this is the small TOML file under the user's config
//! directory that remembers machine-local settings between runs.

use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

const CONFIG_DIR: &str = ".config/padbridge";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Mapping cycles per second.
    pub cycle_hz: u32,
    /// Profile document used on startup and preselected in the editor.
    pub profile_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cycle_hz: 100,
            profile_path: config_dir().join("profiles").join("default.json"),
        }
    }
}

impl AppConfig {
    /// Loads the config file, falling back to defaults when it is missing
    /// or unreadable. Never fails startup.
    pub fn load() -> Self {
        let path = config_path();
        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("config file {} is malformed, using defaults: {e}", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                debug!("no config file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| eyre!("failed to create config directory: {e}"))?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| eyre!("failed to serialize config: {e}"))?;
        fs::write(&path, content).map_err(|e| eyre!("failed to write config file: {e}"))?;
        Ok(())
    }

    /// Sleep interval between mapping cycles.
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.cycle_hz.max(1)))
    }
}

fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

fn config_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| {
        warn!("could not determine home directory, using current directory");
        PathBuf::from(".")
    });
    home.join(CONFIG_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cycle_rate_is_100hz() {
        let config = AppConfig::default();
        assert_eq!(config.cycle_interval(), Duration::from_millis(10));
    }

    #[test]
    fn zero_rate_does_not_divide_by_zero() {
        let config = AppConfig {
            cycle_hz: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.cycle_interval(), Duration::from_secs(1));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = AppConfig {
            cycle_hz: 250,
            profile_path: PathBuf::from("/tmp/p.json"),
        };
        let doc = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&doc).unwrap();
        assert_eq!(parsed.cycle_hz, 250);
        assert_eq!(parsed.profile_path, PathBuf::from("/tmp/p.json"));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed: AppConfig = toml::from_str("cycle_hz = 50\n").unwrap();
        assert_eq!(parsed.cycle_hz, 50);
        assert_eq!(parsed.profile_path, AppConfig::default().profile_path);
    }
}
