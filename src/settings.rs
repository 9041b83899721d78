//! Persistent settings for the layout tool.

use crate::error::SettingsError;
use crate::graph::LayoutConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A saved layout configuration under a user-chosen name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub layout: LayoutConfig,
}

impl Preset {
    /// Create a preset from current settings
    pub fn from_settings(name: String, settings: &Settings) -> Self {
        Self {
            name,
            layout: settings.layout.clone(),
        }
    }

    /// Apply this preset to settings
    pub fn apply_to(&self, settings: &mut Settings) {
        settings.layout = self.layout.clone();
    }
}

/// All persistable settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Jitter seed; entropy is used when absent
    #[serde(default)]
    pub seed: Option<u64>,

    /// Tick budget for headless runs
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    // Saved presets
    #[serde(default)]
    pub presets: Vec<Preset>,
}

fn default_max_steps() -> usize {
    5_000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            seed: None,
            max_steps: default_max_steps(),
            presets: Vec::new(),
        }
    }
}

impl Settings {
    /// Get the path to the settings file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("citation-layout");
            p.push("settings.json");
            p
        })
    }

    /// Load settings from disk, returning defaults if file doesn't exist or is invalid
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            tracing::warn!("Could not determine config directory, using defaults");
            return Self::default();
        };

        if !path.exists() {
            // File doesn't exist yet, that's fine
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => {
                tracing::debug!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                tracing::warn!("Failed to load settings: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Read settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::config_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Write settings as pretty JSON, creating parent directories as needed
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Saved settings to {:?}", path);
        Ok(())
    }

    pub fn preset(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name == name)
    }

    /// Store the current layout under `name`, replacing any preset with that name
    pub fn save_preset(&mut self, name: impl Into<String>) {
        let preset = Preset::from_settings(name.into(), self);
        match self.presets.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
    }

    pub fn apply_preset(&mut self, name: &str) -> Result<(), SettingsError> {
        let preset = self
            .preset(name)
            .cloned()
            .ok_or_else(|| SettingsError::UnknownPreset(name.to_string()))?;
        preset.apply_to(self);
        Ok(())
    }

    /// Returns true if a preset was removed
    pub fn remove_preset(&mut self, name: &str) -> bool {
        let before = self.presets.len();
        self.presets.retain(|p| p.name != name);
        self.presets.len() != before
    }

    /// The active layout config, validated
    pub fn layout_config(&self) -> Result<LayoutConfig, SettingsError> {
        self.layout.validate()?;
        Ok(self.layout.clone())
    }
}
