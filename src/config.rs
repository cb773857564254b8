#![warn(clippy::all, clippy::pedantic)]

use log::warn;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

// Global configuration instance with thread-safe access
pub static CONFIG: Lazy<Arc<RwLock<Config>>> =
    Lazy::new(|| Arc::new(RwLock::new(Config::default())));

// Fallback path when no user config directory exists
const CONFIG_FILE_PATH: &str = "config/gridfall.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sound: bool,
    pub music: bool,
    pub volume: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_ghost: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sound: true,
            music: true,
            volume: 0.5,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { show_ghost: true }
    }
}

/// Loads the configuration into the global handle, writing a default file on
/// first run. A malformed file is reported as an error so the caller can log
/// it and play on with defaults.
pub fn load_config_from_file() -> Result<Config, ConfigError> {
    let config_path = get_config_file_path();

    if !config_path.exists() {
        let default_config = Config::default();
        save_config_to_file(&default_config)?;
        return Ok(default_config);
    }

    let contents = fs::read_to_string(&config_path)?;
    let config: Config = toml::from_str(&contents)?;

    match CONFIG.write() {
        Ok(mut global) => *global = config.clone(),
        Err(_) => warn!("Config lock poisoned, global config not updated"),
    }

    Ok(config)
}

/// Writes the configuration to the config file, creating the directory if
/// needed.
pub fn save_config_to_file(config: &Config) -> Result<(), ConfigError> {
    let config_path = get_config_file_path();

    if let Some(parent) = config_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let toml_string = toml::to_string_pretty(config)?;
    fs::write(&config_path, toml_string)?;

    Ok(())
}

/// Current global configuration (a clone; the global handle stays locked
/// only briefly).
#[must_use]
pub fn current() -> Config {
    CONFIG
        .read()
        .map(|config| config.clone())
        .unwrap_or_default()
}

// Environment variable override first, then the user config directory.
fn get_config_file_path() -> PathBuf {
    if let Ok(path) = std::env::var("GRIDFALL_CONFIG") {
        return PathBuf::from(path);
    }

    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("gridfall").join("config.toml")
    } else {
        PathBuf::from(CONFIG_FILE_PATH)
    }
}

// Custom error type for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::Serialize(err)
    }
}
