use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::Profile;
use crate::app_dirs::AppDirs;
use crate::error::Result;

pub trait ProfileStore {
    /// Load the stored profile, or a fresh one when nothing usable is stored
    fn load(&self) -> Profile;
    fn save(&self, profile: &Profile) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileProfileStore {
    path: PathBuf,
}

impl FileProfileStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::profile_path().unwrap_or_else(|| PathBuf::from("lyrictype_profile.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileStore for FileProfileStore {
    fn load(&self) -> Profile {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored profile, starting fresh");
                return Profile::default();
            }
            Err(err) => {
                warn!(path = %self.path.display(), %err, "could not read profile");
                return Profile::default();
            }
        };

        match serde_json::from_slice::<Profile>(&bytes) {
            Ok(mut profile) => {
                profile.normalize();
                profile
            }
            Err(err) => {
                warn!(path = %self.path.display(), %err, "stored profile is corrupt, starting fresh");
                Profile::default()
            }
        }
    }

    fn save(&self, profile: &Profile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(profile)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::practice::Language;
    use crate::profile::achievements::FIRST_SONG;
    use crate::scoring::Difficulty;
    use chrono::Local;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_profile() {
        let dir = tempdir().unwrap();
        let store = FileProfileStore::with_path(dir.path().join("profile.json"));
        let profile = Profile::default();

        store.save(&profile).unwrap();
        assert_eq!(store.load(), profile);
    }

    #[test]
    fn save_and_load_progressed_profile() {
        let dir = tempdir().unwrap();
        let store = FileProfileStore::with_path(dir.path().join("nested").join("profile.json"));
        let mut profile = Profile {
            language: Language::De,
            difficulty: Difficulty::Hard,
            max_streak: 44,
            max_combo: 31,
            completed_sessions: 3,
            ..Profile::default()
        };
        profile.add_points(1234);
        profile.unlock(FIRST_SONG, Local::now());

        store.save(&profile).unwrap();
        let loaded = store.load();

        assert_eq!(loaded, profile);
        assert_eq!(loaded.level(), 2);
        assert!(loaded.is_unlocked(FIRST_SONG));
    }

    #[test]
    fn missing_file_gives_default() {
        let dir = tempdir().unwrap();
        let store = FileProfileStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Profile::default());
    }

    #[test]
    fn corrupt_file_gives_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profile.json");
        fs::write(&path, b"{ not json").unwrap();

        assert_eq!(FileProfileStore::with_path(&path).load(), Profile::default());
    }

    #[test]
    fn tampered_level_and_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profile.json");
        fs::write(
            &path,
            r#"{"progress": {"points": 2500, "level": 99}, "achievements": []}"#,
        )
        .unwrap();

        let loaded = FileProfileStore::with_path(&path).load();
        assert_eq!(loaded.level(), 3);
        assert_eq!(loaded.achievements.len(), crate::profile::catalog().len());
        assert_eq!(loaded.difficulty, Difficulty::Medium);
    }
}
