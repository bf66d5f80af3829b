use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::error::Result;

/// Engine and front-end settings. Player choices (difficulty, language) live in the profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sound_enabled: bool,
    pub playback_poll_ms: u64,
    pub clock_tick_ms: u64,
    /// Used when a lyric source comes without a known song length
    pub default_duration_secs: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            playback_poll_ms: 500,
            clock_tick_ms: 1000,
            default_duration_secs: 210.0,
        }
    }
}

impl Config {
    pub fn playback_poll_interval(&self) -> Duration {
        Duration::from_millis(self.playback_poll_ms.max(1))
    }

    pub fn clock_tick_interval(&self) -> Duration {
        Duration::from_millis(self.clock_tick_ms.max(1))
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("lyrictype_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|err| {
                warn!(path = %self.path.display(), %err, "ignoring unreadable config");
                Config::default()
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Config::default(),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "could not read config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            sound_enabled: false,
            playback_poll_ms: 250,
            clock_tick_ms: 2000,
            default_duration_secs: 180.5,
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"sound_enabled": false}"#).unwrap();

        let loaded = FileConfigStore::with_path(&path).load();
        assert!(!loaded.sound_enabled);
        assert_eq!(loaded.playback_poll_ms, 500);
        assert_eq!(loaded.clock_tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn corrupt_file_gives_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json at all").unwrap();

        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }
}
