//! User settings persistence.
//!
//! This module handles loading and saving user preferences: model selection,
//! the default style category and the API key override.

use crate::error::{AppError, Result};
use crate::keys::KeySelector;
use crate::model::StyleCategory;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Gemini text models offered in the settings panel.
pub const AVAILABLE_MODELS: &[&str] = &[
    "gemini-3-flash-preview",
    "gemini-2.5-pro",
    "gemini-flash-latest",
];

/// User-configurable settings persisted between sessions.
///
/// Settings are stored as JSON in the user's config directory
/// (e.g., `~/.config/prompt-genius/settings.json` on Linux).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Selected Gemini model name.
    pub model: String,
    /// Category preselected on startup.
    #[serde(default)]
    pub category: StyleCategory,
    /// API key override (takes precedence over environment).
    #[serde(default)]
    pub api_key: String,
}

impl Settings {
    /// Returns the path to the settings file.
    ///
    /// Creates the config directory if it doesn't exist.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "promptgenius", "prompt-genius").map(|dirs| {
            let config_dir = dirs.config_dir();
            if !config_dir.exists() {
                let _ = fs::create_dir_all(config_dir);
            }
            config_dir.join("settings.json")
        })
    }

    /// Loads settings from disk, falling back to defaults if not found.
    pub fn load(default_model: &str) -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path, default_model))
            .unwrap_or_else(|| Self::with_defaults(default_model))
    }

    pub fn load_from(path: &Path, default_model: &str) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_else(|| Self::with_defaults(default_model))
    }

    /// Creates default settings with the specified model.
    pub fn with_defaults(model: &str) -> Self {
        Self {
            model: model.to_string(),
            category: StyleCategory::default(),
            api_key: String::new(),
        }
    }

    /// Persists settings to disk.
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_defaults(crate::config::DEFAULT_MODEL)
    }
}

/// The settings panel acts as the key picker: opening it means committing
/// the key typed into it.
impl KeySelector for Settings {
    fn has_selected_key(&self) -> bool {
        self.has_api_key()
    }

    fn open_key_selector(&mut self) -> Result<()> {
        if !self.has_api_key() {
            return Err(AppError::config("Paste a Gemini API key first"));
        }
        self.api_key = self.api_key.trim().to_string();
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let settings = Settings {
            model: "gemini-2.5-pro".into(),
            category: StyleCategory::Anime,
            api_key: "secret".into(),
        };
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path, "unused"), settings);
    }

    #[test]
    fn missing_or_corrupt_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(Settings::load_from(&path, "m").model, "m");

        fs::write(&path, "{not json").unwrap();
        assert_eq!(Settings::load_from(&path, "m"), Settings::with_defaults("m"));
    }

    #[test]
    fn older_files_without_category_still_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"model": "gemini-flash-latest"}"#).unwrap();

        let settings = Settings::load_from(&path, "m");
        assert_eq!(settings.category, StyleCategory::GeneralMixed);
        assert!(!settings.has_selected_key());
    }
}
