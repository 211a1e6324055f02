//! User preference persistence for the Murmur CLI/TUI.
//!
//! A tiny JSON-backed store for lightweight settings: the preferred theme,
//! the last server and the last team used. The file lives in the standard
//! configuration directory (`~/.config/murmur/preferences.json` on most
//! platforms) unless `MURMUR_PREFERENCES_PATH` points elsewhere.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dirs_next::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::expand_tilde;

/// Environment variable allowing callers to override the preferences file path.
pub const PREFERENCES_PATH_ENV: &str = "MURMUR_PREFERENCES_PATH";

/// Default filename for the JSON payload.
pub const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// Error surfaced when reading or writing preferences fails.
#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("preferences I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("preferences serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persisted preference values.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesPayload {
    /// Canonical identifier of the theme selected via the TUI.
    #[serde(default)]
    pub preferred_theme: Option<String>,
    /// Server URL used by the last successful session.
    #[serde(default)]
    pub server_url: Option<String>,
    /// Team name used by the last successful session.
    #[serde(default)]
    pub last_team: Option<String>,
}

/// Thread-safe preferences store backed by a JSON file.
#[derive(Debug, Default)]
pub struct UserPreferences {
    path: PathBuf,
    payload: Mutex<PreferencesPayload>,
    persist_to_disk: bool,
}

impl UserPreferences {
    /// Load the store from the default (or env-overridden) path.
    pub fn new() -> Result<Self, PreferencesError> {
        Self::with_path(default_preferences_path())
    }

    /// Load the store from an explicit path; a missing file yields defaults.
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self, PreferencesError> {
        let path = path.into();
        let payload = load_payload(&path)?;
        Ok(Self {
            path,
            payload: Mutex::new(payload),
            persist_to_disk: true,
        })
    }

    /// In-memory store used when the config directory cannot be accessed.
    pub fn ephemeral() -> Self {
        Self {
            path: PathBuf::new(),
            payload: Mutex::new(PreferencesPayload::default()),
            persist_to_disk: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn preferred_theme(&self) -> Option<String> {
        self.lock().preferred_theme.clone()
    }

    pub fn set_preferred_theme(&self, theme_id: Option<String>) -> Result<(), PreferencesError> {
        self.update(|payload| payload.preferred_theme = theme_id)
    }

    pub fn server_url(&self) -> Option<String> {
        self.lock().server_url.clone()
    }

    pub fn last_team(&self) -> Option<String> {
        self.lock().last_team.clone()
    }

    /// Record the server and team of a session that started successfully.
    pub fn remember_session(&self, server_url: &str, team: &str) -> Result<(), PreferencesError> {
        self.update(|payload| {
            payload.server_url = Some(server_url.to_string());
            payload.last_team = Some(team.to_string());
        })
    }

    fn update(&self, apply: impl FnOnce(&mut PreferencesPayload)) -> Result<(), PreferencesError> {
        let mut payload = self.lock();
        apply(&mut payload);
        if self.persist_to_disk {
            self.save_locked(&payload)?;
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PreferencesPayload> {
        self.payload.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn save_locked(&self, payload: &PreferencesPayload) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(payload)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

fn default_preferences_path() -> PathBuf {
    if let Ok(path) = env::var(PREFERENCES_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("murmur")
        .join(PREFERENCES_FILE_NAME)
}

fn load_payload(path: &Path) -> Result<PreferencesPayload, PreferencesError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(payload) => Ok(payload),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse preferences file; using defaults"
                );
                Ok(PreferencesPayload::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(PreferencesPayload::default()),
        Err(error) => Err(PreferencesError::Io(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let prefs = UserPreferences::with_path(dir.path().join("prefs.json")).unwrap();
        assert_eq!(prefs.preferred_theme(), None);
        assert_eq!(prefs.server_url(), None);
        assert_eq!(prefs.last_team(), None);
        assert!(!prefs.path().exists(), "loading alone writes nothing");
    }

    #[test]
    fn remembered_session_survives_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");
        let prefs = UserPreferences::with_path(&path).unwrap();
        prefs.remember_session("https://chat.example.com", "team1").unwrap();
        prefs.set_preferred_theme(Some("nord".into())).unwrap();

        let reloaded = UserPreferences::with_path(&path).unwrap();
        assert_eq!(reloaded.server_url().as_deref(), Some("https://chat.example.com"));
        assert_eq!(reloaded.last_team().as_deref(), Some("team1"));
        assert_eq!(reloaded.preferred_theme().as_deref(), Some("nord"));
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{ not json").unwrap();
        let prefs = UserPreferences::with_path(&path).unwrap();
        assert_eq!(prefs.preferred_theme(), None);
    }

    #[test]
    fn env_override_controls_default_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("override.json");
        temp_env::with_var(PREFERENCES_PATH_ENV, Some(path.to_str().unwrap()), || {
            let prefs = UserPreferences::new().unwrap();
            assert_eq!(prefs.path(), path.as_path());
        });
    }

    #[test]
    fn ephemeral_store_does_not_touch_disk() {
        let prefs = UserPreferences::ephemeral();
        prefs.set_preferred_theme(Some("dracula".into())).unwrap();
        assert_eq!(prefs.preferred_theme().as_deref(), Some("dracula"));
        assert_eq!(prefs.path(), Path::new(""));
    }
}
