//! Persisted preferences: audio settings, the "was audio on" flag and the
//! admin-browser marker used by the visitor tracker.
//!
//! The browser build keeps everything in `localStorage`; native builds use a
//! small SQLite key/value table in the platform data directory.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::audio::{EngineOptions, ResumePolicy, DEFAULT_VOLUME};

#[cfg(target_arch = "wasm32")]
use gloo_storage::{errors::StorageError as WebStorageError, LocalStorage, Storage};
#[cfg(not(target_arch = "wasm32"))]
use rusqlite::OptionalExtension;
#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

const SETTINGS_KEY: &str = "folio.audio_settings";
const AUDIO_PLAYING_KEY: &str = "folio.audio_playing";
const ADMIN_BROWSER_KEY: &str = "folio.admin_browser";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("stored value is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[cfg(not(target_arch = "wasm32"))]
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[cfg(not(target_arch = "wasm32"))]
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Audio settings stored across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    #[serde(default = "default_volume")]
    pub volume: f64,
    #[serde(default)]
    pub resume_policy: ResumePolicy,
    #[serde(default = "default_autoplay_on_enter")]
    pub autoplay_on_enter: bool,
}

fn default_volume() -> f64 {
    DEFAULT_VOLUME
}

fn default_autoplay_on_enter() -> bool {
    true
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            resume_policy: ResumePolicy::default(),
            autoplay_on_enter: default_autoplay_on_enter(),
        }
    }
}

impl AudioSettings {
    /// Copy with `volume` clamped to `[0, 1]`; `None` for non-finite input.
    pub fn with_volume(&self, volume: f64) -> Option<Self> {
        volume.is_finite().then(|| Self {
            volume: volume.clamp(0.0, 1.0),
            ..self.clone()
        })
    }
}

impl From<&AudioSettings> for EngineOptions {
    fn from(settings: &AudioSettings) -> Self {
        Self {
            volume: settings.volume,
            resume_policy: settings.resume_policy,
        }
    }
}

/// Whether entering the site should start the music, given the stored flag.
pub fn should_autoplay_on_enter(settings: &AudioSettings, stored: Option<bool>) -> bool {
    settings.autoplay_on_enter && stored.unwrap_or(true)
}

/// Handle to the preference store of the current platform.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    #[cfg(not(target_arch = "wasm32"))]
    path: PathBuf,
}

impl SettingsStore {
    #[cfg(target_arch = "wasm32")]
    pub fn open_default() -> Self {
        Self {}
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn open_default() -> Self {
        let dir = dirs::data_dir()
            .map(|dir| dir.join("folio"))
            .unwrap_or_else(|| PathBuf::from(".folio"));
        Self::at(dir.join("folio.db"))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load_settings(&self) -> AudioSettings {
        match self.read::<AudioSettings>(SETTINGS_KEY) {
            Ok(settings) => settings.unwrap_or_default(),
            Err(err) => {
                warn!(%err, "failed to read audio settings, using defaults");
                AudioSettings::default()
            }
        }
    }

    pub fn save_settings(&self, settings: &AudioSettings) -> Result<(), StorageError> {
        self.write(SETTINGS_KEY, settings)
    }

    /// The last explicit play/pause choice, if the visitor ever made one.
    pub fn audio_preference(&self) -> Option<bool> {
        self.read::<bool>(AUDIO_PLAYING_KEY).unwrap_or_else(|err| {
            warn!(%err, "failed to read audio preference");
            None
        })
    }

    pub fn save_audio_preference(&self, playing: bool) -> Result<(), StorageError> {
        self.write(AUDIO_PLAYING_KEY, &playing)
    }

    pub fn is_admin_browser(&self) -> bool {
        self.read::<bool>(ADMIN_BROWSER_KEY)
            .ok()
            .flatten()
            .unwrap_or(false)
    }

    pub fn mark_admin_browser(&self) -> Result<(), StorageError> {
        self.write(ADMIN_BROWSER_KEY, &true)
    }

    #[cfg(target_arch = "wasm32")]
    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match LocalStorage::get::<T>(key) {
            Ok(value) => Ok(Some(value)),
            Err(WebStorageError::KeyNotFound(_)) => Ok(None),
            Err(WebStorageError::SerdeError(err)) => Err(StorageError::Serde(err)),
            Err(err) => Err(StorageError::Backend(err.to_string())),
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        LocalStorage::set(key, value).map_err(|err| match err {
            WebStorageError::SerdeError(err) => StorageError::Serde(err),
            err => StorageError::Backend(err.to_string()),
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let conn = self.connection()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                [key],
                |row: &rusqlite::Row| row.get(0),
            )
            .optional()?;
        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(StorageError::from)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let conn = self.connection()?;
        let json = serde_json::to_string(value)?;
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            [key, json.as_str()],
        )?;
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn connection(&self) -> Result<rusqlite::Connection, StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = rusqlite::Connection::open(&self.path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(conn)
    }
}
