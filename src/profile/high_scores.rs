use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::session::Mode;

pub const MAX_HIGH_SCORES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub date: DateTime<Local>,
    pub wpm: u32,
    pub accuracy: u8,
    pub mode: Mode,
    #[serde(default)]
    pub points: u64,
}

/// Best runs by WPM, highest first, never more than [`MAX_HIGH_SCORES`].
/// Equal WPM keeps the older entry ahead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<HighScoreEntry>", into = "Vec<HighScoreEntry>")]
pub struct HighScores(Vec<HighScoreEntry>);

impl From<Vec<HighScoreEntry>> for HighScores {
    fn from(entries: Vec<HighScoreEntry>) -> Self {
        let mut scores = HighScores(entries);
        scores.normalize();
        scores
    }
}

impl From<HighScores> for Vec<HighScoreEntry> {
    fn from(scores: HighScores) -> Self {
        scores.0
    }
}

impl HighScores {
    fn normalize(&mut self) {
        self.0.sort_by(|a, b| b.wpm.cmp(&a.wpm));
        self.0.truncate(MAX_HIGH_SCORES);
    }

    /// Insert a run. Returns its rank (0 = best) if it made the table.
    pub fn insert(&mut self, entry: HighScoreEntry) -> Option<usize> {
        let date = entry.date;
        let wpm = entry.wpm;
        self.0.push(entry);
        self.normalize();
        self.0.iter().position(|e| e.date == date && e.wpm == wpm)
    }

    pub fn entries(&self) -> &[HighScoreEntry] {
        &self.0
    }

    pub fn best(&self) -> Option<&HighScoreEntry> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
