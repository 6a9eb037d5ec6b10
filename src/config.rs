//! Configuration file support.
//!
//! This module provides serialization and deserialization of application
//! settings, so preferences and keybindings survive between runs.

use serde::{Deserialize, Serialize};

use crate::keybindings::{Action, KeyBindings, KeyChord};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Get all log levels in order from least to most verbose.
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ]
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration that can be exported and imported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Application name (for identification)
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// User preferences
    pub preferences: UserPreferences,

    /// Keybinding configuration
    #[serde(default)]
    pub keybindings: KeyBindingsConfig,
}

fn default_app_name() -> String {
    "Polycrop".to_string()
}

/// User preferences section of the config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Default export folder path
    #[serde(default)]
    pub export_folder: String,

    /// Crop aspect ratio as entered, e.g. `16:9`; empty means the
    /// image's own ratio
    #[serde(default)]
    pub aspect_ratio: String,

    /// Whether crop resizing starts with the aspect lock engaged
    #[serde(default)]
    pub aspect_locked: bool,

    /// Undo history depth
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_history_capacity() -> usize {
    crate::constants::history::CAPACITY
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            export_folder: String::new(),
            aspect_ratio: String::new(),
            aspect_locked: false,
            history_capacity: default_history_capacity(),
            log_level: LogLevel::default(),
        }
    }
}

/// Keybinding configuration section.
///
/// Chords are stored as display strings like `Ctrl+Z`; unknown values
/// fall back to the default binding when converted back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindingsConfig {
    pub undo: String,
    pub finalize: String,
    pub cancel: String,
    pub delete: String,
    pub save: String,
    pub open_image: String,
    pub select_mode: String,
    pub polygon_mode: String,
    pub crop_mode: String,
    pub toggle_aspect: String,
}

impl Default for KeyBindingsConfig {
    fn default() -> Self {
        Self::from(&KeyBindings::default())
    }
}

impl From<&KeyBindings> for KeyBindingsConfig {
    fn from(bindings: &KeyBindings) -> Self {
        Self {
            undo: bindings.undo.label(),
            finalize: bindings.finalize.label(),
            cancel: bindings.cancel.label(),
            delete: bindings.delete.label(),
            save: bindings.save.label(),
            open_image: bindings.open_image.label(),
            select_mode: bindings.select_mode.label(),
            polygon_mode: bindings.polygon_mode.label(),
            crop_mode: bindings.crop_mode.label(),
            toggle_aspect: bindings.toggle_aspect.label(),
        }
    }
}

impl KeyBindingsConfig {
    /// Convert back to runtime keybindings, keeping the default chord
    /// for any entry that fails to parse.
    pub fn to_keybindings(&self) -> KeyBindings {
        let mut bindings = KeyBindings::default();
        let entries = [
            (Action::Undo, &self.undo),
            (Action::Finalize, &self.finalize),
            (Action::Cancel, &self.cancel),
            (Action::Delete, &self.delete),
            (Action::Save, &self.save),
            (Action::OpenImage, &self.open_image),
            (Action::SelectMode, &self.select_mode),
            (Action::PolygonMode, &self.polygon_mode),
            (Action::CropMode, &self.crop_mode),
            (Action::ToggleAspectLock, &self.toggle_aspect),
        ];
        for (action, text) in entries {
            match KeyChord::parse(text) {
                Some(chord) => bindings.set_chord(action, chord),
                None => log::warn!(
                    "Ignoring unparseable binding '{}' for {}",
                    text,
                    action.name()
                ),
            }
        }
        bindings
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            app_name: default_app_name(),
            preferences: UserPreferences::default(),
            keybindings: KeyBindingsConfig::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for config export.
    pub fn default_filename() -> &'static str {
        "polycrop-config.json"
    }

    /// Get the default config file path for auto-load/save.
    pub fn default_path() -> Option<std::path::PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("polycrop").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("polycrop")
                    .join(Self::default_filename())
            })
        }
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config file {:?}: {}", path, e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the default path.
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(&path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
