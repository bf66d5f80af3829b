pub mod achievements;
pub mod high_scores;
pub mod store;

pub use achievements::{catalog, merge_with_catalog, Achievement};
pub use high_scores::{HighScoreEntry, HighScores, MAX_HIGH_SCORES};
pub use store::{FileProfileStore, ProfileStore};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::practice::Language;
use crate::scoring::{ComboState, Difficulty, ProgressState};
use crate::session::SessionSummary;

use achievements::{
    COMBO_MASTER, COMBO_MASTER_COMBO, FIRST_SONG, LYRIC_GENIUS, LYRIC_GENIUS_SESSIONS,
    PERFECT_ACCURACY, SPEED_DEMON, SPEED_DEMON_WPM,
};

/// Everything about a player that outlives a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub language: Language,
    pub difficulty: Difficulty,
    pub achievements: Vec<Achievement>,
    pub high_scores: HighScores,
    pub max_streak: u32,
    pub max_combo: u32,
    pub progress: ProgressState,
    pub completed_sessions: u32,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            language: Language::default(),
            difficulty: Difficulty::default(),
            achievements: catalog(),
            high_scores: HighScores::default(),
            max_streak: 0,
            max_combo: 0,
            progress: ProgressState::default(),
            completed_sessions: 0,
        }
    }
}

impl Profile {
    /// Bring a freshly loaded profile in line with the current achievement catalog
    pub fn normalize(&mut self) {
        self.achievements = merge_with_catalog(&self.achievements);
    }

    pub fn achievement(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.achievement(id).is_some_and(|a| a.unlocked)
    }

    /// Unlock `id`. Returns the achievement only on its locked to unlocked transition.
    pub fn unlock(&mut self, id: &str, at: DateTime<Local>) -> Option<Achievement> {
        let entry = self.achievements.iter_mut().find(|a| a.id == id)?;
        if entry.unlock(at) {
            info!(id, name = %entry.name, "achievement unlocked");
            Some(entry.clone())
        } else {
            None
        }
    }

    pub fn points(&self) -> u64 {
        self.progress.points()
    }

    pub fn level(&self) -> u32 {
        self.progress.level()
    }

    /// Returns the new level when the points crossed a level boundary
    pub fn add_points(&mut self, amount: u64) -> Option<u32> {
        self.progress.add_points(amount)
    }

    /// Fold a session's combo into the all-time maxima and check the combo trigger
    pub fn observe_combo(&mut self, combo: &ComboState, at: DateTime<Local>) -> Vec<Achievement> {
        self.max_combo = self.max_combo.max(combo.max_combo);
        self.max_streak = self.max_streak.max(combo.max_streak);

        let mut unlocked = Vec::new();
        if combo.combo >= COMBO_MASTER_COMBO {
            unlocked.extend(self.unlock(COMBO_MASTER, at));
        }
        unlocked
    }

    /// Record a finished session and run the completion triggers.
    /// Returns the achievements this completion unlocked.
    pub fn record_completion(&mut self, summary: &SessionSummary) -> Vec<Achievement> {
        let at = summary.completed_at;
        self.completed_sessions = self.completed_sessions.saturating_add(1);
        self.high_scores.insert(HighScoreEntry {
            date: at,
            wpm: summary.wpm,
            accuracy: summary.accuracy,
            mode: summary.mode,
            points: summary.points,
        });

        let mut unlocked = Vec::new();
        unlocked.extend(self.unlock(FIRST_SONG, at));
        if summary.accuracy == 100 {
            unlocked.extend(self.unlock(PERFECT_ACCURACY, at));
        }
        if summary.wpm >= SPEED_DEMON_WPM {
            unlocked.extend(self.unlock(SPEED_DEMON, at));
        }
        if self.completed_sessions >= LYRIC_GENIUS_SESSIONS {
            unlocked.extend(self.unlock(LYRIC_GENIUS, at));
        }
        unlocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Mode;

    fn summary(wpm: u32, accuracy: u8) -> SessionSummary {
        SessionSummary {
            title: "song".to_string(),
            mode: Mode::Lyrics,
            difficulty: Difficulty::Medium,
            wpm,
            accuracy,
            errors: 0,
            typed_length: 100,
            elapsed_seconds: 60.0,
            max_combo: 12,
            max_streak: 12,
            points: 500,
            completed_at: Local::now(),
            wpm_samples: Vec::new(),
        }
    }

    fn unlocked_ids(list: &[Achievement]) -> Vec<&str> {
        list.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_default_profile() {
        let profile = Profile::default();

        assert_eq!(profile.level(), 1);
        assert_eq!(profile.points(), 0);
        assert_eq!(profile.achievements.len(), catalog().len());
        assert!(profile.high_scores.is_empty());
        assert_eq!(profile.difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_first_completion() {
        let mut profile = Profile::default();
        let unlocked = profile.record_completion(&summary(40, 97));

        assert_eq!(unlocked_ids(&unlocked), vec![FIRST_SONG]);
        assert_eq!(profile.completed_sessions, 1);
        assert_eq!(profile.high_scores.len(), 1);
        assert_eq!(profile.high_scores.best().unwrap().points, 500);
    }

    #[test]
    fn test_perfect_and_fast_completion() {
        let mut profile = Profile::default();
        let unlocked = profile.record_completion(&summary(85, 100));

        assert_eq!(
            unlocked_ids(&unlocked),
            vec![FIRST_SONG, PERFECT_ACCURACY, SPEED_DEMON]
        );
    }

    #[test]
    fn test_speed_demon_unlocks_once() {
        let mut profile = Profile::default();

        assert!(profile.record_completion(&summary(79, 90)).iter().all(|a| a.id != SPEED_DEMON));
        assert!(!profile.is_unlocked(SPEED_DEMON));

        let first = profile.record_completion(&summary(80, 90));
        assert_eq!(unlocked_ids(&first), vec![SPEED_DEMON]);
        let date = profile.achievement(SPEED_DEMON).unwrap().unlocked_date;
        assert!(date.is_some());

        for wpm in [95, 20, 130] {
            assert!(profile.record_completion(&summary(wpm, 90)).is_empty());
            assert!(profile.is_unlocked(SPEED_DEMON));
            assert_eq!(profile.achievement(SPEED_DEMON).unwrap().unlocked_date, date);
        }
    }

    #[test]
    fn test_lyric_genius_counts_all_completions() {
        let mut profile = Profile::default();
        for _ in 0..9 {
            profile.record_completion(&summary(10, 50));
        }
        assert!(!profile.is_unlocked(LYRIC_GENIUS));

        let unlocked = profile.record_completion(&summary(10, 50));
        assert_eq!(unlocked_ids(&unlocked), vec![LYRIC_GENIUS]);

        for _ in 0..5 {
            profile.record_completion(&summary(10, 50));
        }
        assert_eq!(profile.completed_sessions, 15);
        assert_eq!(profile.high_scores.len(), MAX_HIGH_SCORES);
    }

    #[test]
    fn test_observe_combo() {
        let mut profile = Profile::default();
        let mut combo = ComboState {
            combo: 49,
            max_combo: 49,
            multiplier: 3.0,
            streak: 49,
            max_streak: 49,
        };

        assert!(profile.observe_combo(&combo, Local::now()).is_empty());
        assert_eq!(profile.max_combo, 49);

        combo.register_correct();
        let unlocked = profile.observe_combo(&combo, Local::now());
        assert_eq!(unlocked_ids(&unlocked), vec![COMBO_MASTER]);
        assert_eq!(profile.max_combo, 50);
        assert_eq!(profile.max_streak, 50);

        combo.register_incorrect();
        assert!(profile.observe_combo(&combo, Local::now()).is_empty());
        assert_eq!(profile.max_combo, 50);
    }

    #[test]
    fn test_unlock_unknown_id() {
        let mut profile = Profile::default();
        assert!(profile.unlock("no_such_thing", Local::now()).is_none());
    }

    #[test]
    fn test_profile_json_shape() {
        let mut profile = Profile::default();
        profile.add_points(2500);
        let json = serde_json::to_value(&profile).unwrap();

        assert_eq!(json["progress"]["points"], 2500);
        assert_eq!(json["progress"]["level"], 3);
        assert_eq!(json["difficulty"], "medium");
        assert_eq!(json["language"], "en");
        assert!(json["high_scores"].is_array());
    }
}
