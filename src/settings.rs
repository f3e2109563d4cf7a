//! Playback settings and where they are kept.
//!
//! Settings serialize with the storage keys the browser extension used
//! (`speechRate`, `speechPitch`, `selectedVoiceURI`, `playbackVolume`), so a
//! settings file exported from it loads as-is. Missing keys take defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Valid speech rate range.
pub const RATE_RANGE: (f32, f32) = (0.1, 10.0);
pub const PITCH_RANGE: (f32, f32) = (0.0, 2.0);
pub const VOLUME_RANGE: (f32, f32) = (0.0, 1.0);

/// User-facing playback settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "speechRate")]
    pub rate: f32,
    #[serde(rename = "speechPitch")]
    pub pitch: f32,
    #[serde(rename = "playbackVolume")]
    pub volume: f32,
    /// Identifier of the preferred voice; empty means the engine default.
    #[serde(rename = "selectedVoiceURI")]
    pub voice_id: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            voice_id: String::new(),
        }
    }
}

impl Settings {
    /// Check every field is finite and in range.
    pub fn validate(&self) -> Result<()> {
        check("rate", self.rate, RATE_RANGE)?;
        check("pitch", self.pitch, PITCH_RANGE)?;
        check("volume", self.volume, VOLUME_RANGE)
    }

    /// Force every field into range. Non-finite values fall back to defaults.
    pub fn clamped(self) -> Self {
        let defaults = Settings::default();
        Self {
            rate: clamp(self.rate, RATE_RANGE, defaults.rate),
            pitch: clamp(self.pitch, PITCH_RANGE, defaults.pitch),
            volume: clamp(self.volume, VOLUME_RANGE, defaults.volume),
            voice_id: self.voice_id,
        }
    }
}

fn check(name: &str, value: f32, (min, max): (f32, f32)) -> Result<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidSettings(format!(
            "{name} must be between {min} and {max}, got {value}"
        )))
    }
}

fn clamp(value: f32, (min, max): (f32, f32), fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// Somewhere settings persist between sessions.
pub trait SettingsStore {
    /// Stored settings, or defaults when nothing usable is stored.
    fn load(&self) -> Settings;

    fn save(&self, settings: &Settings) -> Result<()>;
}

/// Settings kept as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/readaloud/settings.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("readaloud").join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Settings> {
        let data = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Settings {
        match self.read() {
            Ok(settings) => settings.clamped(),
            Err(Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no settings file, using defaults");
                Settings::default()
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "unreadable settings file, using defaults");
                Settings::default()
            }
        }
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Settings kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: Mutex<Option<Settings>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(Some(settings)),
        }
    }

    /// What was last saved, if anything.
    pub fn saved(&self) -> Option<Settings> {
        self.settings.lock().ok().and_then(|s| s.clone())
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Settings {
        self.saved().unwrap_or_default()
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        if let Ok(mut slot) = self.settings.lock() {
            *slot = Some(settings.clone());
        }
        Ok(())
    }
}

impl<T: SettingsStore + ?Sized> SettingsStore for Box<T> {
    fn load(&self) -> Settings {
        (**self).load()
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        (**self).save(settings)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_storage_keys() {
        let settings = Settings {
            rate: 1.5,
            pitch: 0.8,
            volume: 0.5,
            voice_id: "urn:voice:alex".into(),
        };
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["speechRate"], 1.5);
        assert_eq!(json["selectedVoiceURI"], "urn:voice:alex");
        assert_eq!(json["playbackVolume"], 0.5);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"speechRate": 2.0}"#).unwrap();
        assert_eq!(settings.rate, 2.0);
        assert_eq!(settings.pitch, 1.0);
        assert_eq!(settings.voice_id, "");
    }

    #[test]
    fn test_clamped() {
        let settings = Settings {
            rate: 0.0,
            pitch: 5.0,
            volume: f32::NAN,
            voice_id: String::new(),
        }
        .clamped();
        assert_eq!(settings.rate, 0.1);
        assert_eq!(settings.pitch, 2.0);
        assert_eq!(settings.volume, 1.0);
    }

    #[test]
    fn test_validate() {
        assert!(Settings::default().validate().is_ok());
        let loud = Settings {
            volume: 1.5,
            ..Settings::default()
        };
        assert!(matches!(loud.validate(), Err(Error::InvalidSettings(_))));
    }

    #[test]
    fn test_json_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("settings.json"));
        assert_eq!(store.load(), Settings::default());

        let settings = Settings {
            rate: 1.25,
            ..Settings::default()
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn test_json_store_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(JsonFileStore::new(path).load(), Settings::default());
    }

    #[test]
    fn test_json_store_clamps_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"speechPitch": 9}"#).unwrap();
        assert_eq!(JsonFileStore::new(path).load().pitch, 2.0);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.saved(), None);
        store.save(&Settings::default()).unwrap();
        assert_eq!(store.saved(), Some(Settings::default()));
    }
}
