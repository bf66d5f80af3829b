use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub const FIRST_SONG: &str = "first_song";
pub const PERFECT_ACCURACY: &str = "perfect_accuracy";
pub const SPEED_DEMON: &str = "speed_demon";
pub const COMBO_MASTER: &str = "combo_master";
pub const LYRIC_GENIUS: &str = "lyric_genius";

pub const SPEED_DEMON_WPM: u32 = 80;
pub const COMBO_MASTER_COMBO: u32 = 50;
pub const LYRIC_GENIUS_SESSIONS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub unlocked: bool,
    #[serde(default, rename = "date", skip_serializing_if = "Option::is_none")]
    pub unlocked_date: Option<DateTime<Local>>,
}

impl Achievement {
    fn locked(id: &str, name: &str, description: &str, icon: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            unlocked: false,
            unlocked_date: None,
        }
    }

    /// One-way transition. Returns false if it was already unlocked.
    pub fn unlock(&mut self, at: DateTime<Local>) -> bool {
        if self.unlocked {
            return false;
        }
        self.unlocked = true;
        self.unlocked_date = Some(at);
        true
    }
}

/// Every achievement the game knows about, all locked
pub fn catalog() -> Vec<Achievement> {
    vec![
        Achievement::locked(FIRST_SONG, "First Beat", "Complete your first song", "🎵"),
        Achievement::locked(
            PERFECT_ACCURACY,
            "Perfect Harmony",
            "Achieve 100% accuracy on any song",
            "🎯",
        ),
        Achievement::locked(SPEED_DEMON, "Speed Demon", "Type faster than 80 WPM", "⚡"),
        Achievement::locked(COMBO_MASTER, "Combo Master", "Reach a 50x combo", "🔥"),
        Achievement::locked(LYRIC_GENIUS, "Lyric Genius", "Complete 10 songs", "🧠"),
    ]
}

/// Lay stored unlock state over the current catalog.
///
/// Catalog order and wording win; entries the catalog no longer has are dropped and
/// new catalog entries start locked.
pub fn merge_with_catalog(stored: &[Achievement]) -> Vec<Achievement> {
    catalog()
        .into_iter()
        .map(|mut entry| {
            if let Some(saved) = stored.iter().find(|s| s.id == entry.id && s.unlocked) {
                entry.unlocked = true;
                entry.unlocked_date = saved.unlocked_date;
            }
            entry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_unique_and_locked() {
        let all = catalog();
        let mut ids: Vec<&str> = all.iter().map(|a| a.id.as_str()).collect();
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), all.len());
        assert!(all.iter().all(|a| !a.unlocked && a.unlocked_date.is_none()));
    }

    #[test]
    fn test_unlock_is_one_way() {
        let mut entry = catalog().remove(0);
        let first = Local::now();

        assert!(entry.unlock(first));
        assert!(!entry.unlock(Local::now()));
        assert_eq!(entry.unlocked_date, Some(first));
    }

    #[test]
    fn test_merge_keeps_unlocks_and_adds_new_entries() {
        let when = Local::now();
        let mut stored = vec![catalog().remove(2)];
        stored[0].unlock(when);
        stored.push(Achievement::locked("retired", "Gone", "no longer offered", "x"));

        let merged = merge_with_catalog(&stored);

        assert_eq!(merged.len(), catalog().len());
        let speed = merged.iter().find(|a| a.id == SPEED_DEMON).unwrap();
        assert!(speed.unlocked);
        assert_eq!(speed.unlocked_date, Some(when));
        assert!(merged.iter().filter(|a| a.unlocked).count() == 1);
        assert!(!merged.iter().any(|a| a.id == "retired"));
    }
}
