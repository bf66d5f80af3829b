use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Characters per "word" in every WPM figure
pub const CHARS_PER_WORD: f64 = 5.0;
/// A combo bonus is paid (and the multiplier grows) every this many correct keys
pub const COMBO_MILESTONE: u32 = 10;
pub const MULTIPLIER_STEP: f64 = 0.5;
pub const MAX_MULTIPLIER: f64 = 5.0;
pub const COMBO_BONUS_BASE: f64 = 10.0;
pub const POINTS_PER_LEVEL: u64 = 1000;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Point multiplier applied to combo bonuses
    pub fn factor(self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 1.5,
            Difficulty::Hard => 2.0,
        }
    }
}

#[derive(Clone, Debug, Copy, PartialEq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// Advisory notifications for the presentation layer (sound, banners).
/// They describe what just happened and carry no state of their own.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreEvent {
    Correct { combo: u32 },
    Incorrect,
    ComboMilestone { combo: u32, multiplier: f64 },
    LevelUp { level: u32 },
    AchievementUnlocked { id: String, name: String },
    SessionComplete { wpm: u32, accuracy: u8 },
}

/// Words per minute over `elapsed_seconds`, five characters to the word.
///
/// The error count is accepted for callers that track it but is not subtracted:
/// the figure is gross WPM.
pub fn compute_wpm(typed_character_count: usize, elapsed_seconds: f64, _error_count: usize) -> u32 {
    if !elapsed_seconds.is_finite() || elapsed_seconds <= 0.0 {
        return 0;
    }
    let words = typed_character_count as f64 / CHARS_PER_WORD;
    let minutes = elapsed_seconds / 60.0;
    (words / minutes).round().max(0.0) as u32
}

/// Percentage of correct characters; no attempts counts as perfect
pub fn compute_accuracy(correct_count: usize, total_count: usize) -> u8 {
    if total_count == 0 {
        return 100;
    }
    let pct = (correct_count as f64 / total_count as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Positions (in characters) where `typed` and `target` disagree, up to the shorter length
pub fn count_errors(typed: &str, target: &str) -> usize {
    typed
        .chars()
        .zip(target.chars())
        .filter(|(typed, expected)| typed != expected)
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComboState {
    pub combo: u32,
    pub max_combo: u32,
    pub multiplier: f64,
    pub streak: u32,
    pub max_streak: u32,
}

impl Default for ComboState {
    fn default() -> Self {
        Self {
            combo: 0,
            max_combo: 0,
            multiplier: 1.0,
            streak: 0,
            max_streak: 0,
        }
    }
}

impl ComboState {
    /// Count a correct key. Returns true when the new combo hit a milestone.
    pub fn register_correct(&mut self) -> bool {
        self.combo += 1;
        self.streak += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.max_streak = self.max_streak.max(self.streak);

        let milestone = self.combo % COMBO_MILESTONE == 0;
        if milestone {
            self.multiplier = (self.multiplier + MULTIPLIER_STEP).min(MAX_MULTIPLIER);
        }
        milestone
    }

    pub fn register_incorrect(&mut self) {
        self.combo = 0;
        self.streak = 0;
        self.multiplier = 1.0;
    }

    /// Bonus paid at a combo milestone, using the already-raised multiplier
    pub fn milestone_bonus(&self, difficulty: Difficulty) -> u64 {
        (COMBO_BONUS_BASE * self.multiplier * difficulty.factor()).round() as u64
    }
}

/// Points and the level they imply. The level is derived, never set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ProgressRecord", into = "ProgressRecord")]
pub struct ProgressState {
    points: u64,
    level: u32,
}

/// On-disk shape. A stored level is ignored and recomputed from points on load.
#[derive(Serialize, Deserialize)]
struct ProgressRecord {
    points: u64,
    #[serde(default)]
    level: u32,
}

impl From<ProgressRecord> for ProgressState {
    fn from(record: ProgressRecord) -> Self {
        Self::from_points(record.points)
    }
}

impl From<ProgressState> for ProgressRecord {
    fn from(progress: ProgressState) -> Self {
        Self {
            points: progress.points,
            level: progress.level,
        }
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::from_points(0)
    }
}

impl ProgressState {
    pub fn from_points(points: u64) -> Self {
        Self {
            points,
            level: level_for_points(points),
        }
    }

    pub fn points(&self) -> u64 {
        self.points
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Add points, returning the new level if it went up
    pub fn add_points(&mut self, amount: u64) -> Option<u32> {
        let previous = self.level;
        *self = Self::from_points(self.points.saturating_add(amount));
        (self.level > previous).then_some(self.level)
    }
}

pub fn level_for_points(points: u64) -> u32 {
    (points / POINTS_PER_LEVEL + 1).min(u32::MAX as u64) as u32
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeystrokeOutcome {
    pub error_count: usize,
    pub combo: ComboState,
    pub points_awarded: u64,
    pub outcome: Option<Outcome>,
    pub events: Vec<ScoreEvent>,
}

/// Score the change from `previous_typed` to `new_typed` against `target_text`.
///
/// The error count is always recomputed over the whole typed text. Only growth
/// classifies a key: the last appended character is compared with the target at
/// its position, and anything past the end of the target is incorrect.
pub fn on_keystroke(
    previous_typed: &str,
    new_typed: &str,
    target_text: &str,
    combo: &ComboState,
    difficulty: Difficulty,
) -> KeystrokeOutcome {
    let error_count = count_errors(new_typed, target_text);
    let mut combo = *combo;
    let mut points_awarded = 0;
    let mut events = Vec::new();

    let new_len = new_typed.chars().count();
    if new_len <= previous_typed.chars().count() {
        return KeystrokeOutcome {
            error_count,
            combo,
            points_awarded,
            outcome: None,
            events,
        };
    }

    let idx = new_len - 1;
    let typed_char = new_typed.chars().last();
    let outcome = match (typed_char, target_text.chars().nth(idx)) {
        (Some(typed), Some(expected)) if typed == expected => Outcome::Correct,
        _ => Outcome::Incorrect,
    };

    match outcome {
        Outcome::Correct => {
            points_awarded += 1;
            let milestone = combo.register_correct();
            events.push(ScoreEvent::Correct { combo: combo.combo });
            if milestone {
                points_awarded += combo.milestone_bonus(difficulty);
                events.push(ScoreEvent::ComboMilestone {
                    combo: combo.combo,
                    multiplier: combo.multiplier,
                });
            }
        }
        Outcome::Incorrect => {
            combo.register_incorrect();
            events.push(ScoreEvent::Incorrect);
        }
    }

    KeystrokeOutcome {
        error_count,
        combo,
        points_awarded,
        outcome: Some(outcome),
        events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn type_all(target: &str, typed: &str, difficulty: Difficulty) -> (ComboState, u64) {
        let mut combo = ComboState::default();
        let mut points = 0;
        let mut current = String::new();
        for c in typed.chars() {
            let previous = current.clone();
            current.push(c);
            let out = on_keystroke(&previous, &current, target, &combo, difficulty);
            combo = out.combo;
            points += out.points_awarded;
        }
        (combo, points)
    }

    #[test]
    fn test_compute_wpm() {
        assert_eq!(compute_wpm(50, 60.0, 0), 10);
        assert_eq!(compute_wpm(50, 30.0, 0), 20);
        assert_eq!(compute_wpm(7, 60.0, 0), 1);
    }

    #[test]
    fn test_compute_wpm_zero_elapsed() {
        assert_eq!(compute_wpm(0, 0.0, 0), 0);
        assert_eq!(compute_wpm(100, 0.0, 3), 0);
        assert_eq!(compute_wpm(100, -1.0, 0), 0);
        assert_eq!(compute_wpm(100, f64::NAN, 0), 0);
    }

    #[test]
    fn test_compute_wpm_ignores_errors() {
        assert_eq!(compute_wpm(50, 60.0, 0), compute_wpm(50, 60.0, 25));
    }

    #[test]
    fn test_compute_accuracy() {
        assert_eq!(compute_accuracy(0, 0), 100);
        assert_eq!(compute_accuracy(8, 10), 80);
        assert_eq!(compute_accuracy(10, 10), 100);
        assert_eq!(compute_accuracy(2, 3), 67);
        assert_eq!(compute_accuracy(0, 4), 0);
    }

    #[test]
    fn test_count_errors() {
        assert_eq!(count_errors("hallo", "hello"), 1);
        assert_eq!(count_errors("hello world", "hello"), 0);
        assert_eq!(count_errors("", "hello"), 0);
        assert_eq!(count_errors("ñx", "ño"), 1);
    }

    #[test]
    fn test_difficulty_factor() {
        assert_eq!(Difficulty::Easy.factor(), 1.0);
        assert_eq!(Difficulty::Medium.factor(), 1.5);
        assert_eq!(Difficulty::Hard.factor(), 2.0);
        assert_eq!(Difficulty::default(), Difficulty::Medium);
        assert_eq!(Difficulty::Hard.to_string(), "hard");
    }

    #[test]
    fn test_ten_correct_then_one_wrong() {
        let target = "abcdefghijklmnop";
        let (combo, _) = type_all(target, "abcdefghij", Difficulty::Medium);
        assert_eq!(combo.combo, 10);
        assert_eq!(combo.multiplier, 1.5);

        let out = on_keystroke("abcdefghij", "abcdefghijX", target, &combo, Difficulty::Medium);
        assert_eq!(out.combo.combo, 0);
        assert_eq!(out.combo.streak, 0);
        assert_eq!(out.combo.multiplier, 1.0);
        assert_eq!(out.combo.max_combo, 10);
        assert_eq!(out.combo.max_streak, 10);
        assert_eq!(out.error_count, 1);
        assert_eq!(out.outcome, Some(Outcome::Incorrect));
        assert_eq!(out.events, vec![ScoreEvent::Incorrect]);
        assert_eq!(out.points_awarded, 0);
    }

    #[test]
    fn test_milestone_points_by_difficulty() {
        let target = "aaaaaaaaaa";
        // 10 base points plus round(10 * 1.5 * factor)
        assert_eq!(type_all(target, target, Difficulty::Easy).1, 10 + 15);
        assert_eq!(type_all(target, target, Difficulty::Medium).1, 10 + 23);
        assert_eq!(type_all(target, target, Difficulty::Hard).1, 10 + 30);
    }

    #[test]
    fn test_milestone_event() {
        let target = "aaaaaaaaaa";
        let combo = ComboState {
            combo: 9,
            max_combo: 9,
            multiplier: 1.0,
            streak: 9,
            max_streak: 9,
        };
        let out = on_keystroke("aaaaaaaaa", target, target, &combo, Difficulty::Easy);

        assert_eq!(out.events.len(), 2);
        assert_matches!(out.events[0], ScoreEvent::Correct { combo: 10 });
        assert_matches!(
            out.events[1],
            ScoreEvent::ComboMilestone { combo: 10, multiplier } if multiplier == 1.5
        );
    }

    #[test]
    fn test_multiplier_caps_at_five() {
        let target: String = std::iter::repeat('z').take(200).collect();
        let (combo, _) = type_all(&target, &target, Difficulty::Hard);

        assert_eq!(combo.combo, 200);
        assert_eq!(combo.multiplier, MAX_MULTIPLIER);
        assert!(combo.combo <= combo.max_combo);
        assert!(combo.streak <= combo.max_streak);
    }

    #[test]
    fn test_deletion_is_not_a_keystroke() {
        let combo = ComboState {
            combo: 4,
            max_combo: 6,
            multiplier: 1.0,
            streak: 4,
            max_streak: 6,
        };
        let out = on_keystroke("hellx", "hell", "hello", &combo, Difficulty::Medium);

        assert_eq!(out.combo, combo);
        assert_eq!(out.outcome, None);
        assert!(out.events.is_empty());
        assert_eq!(out.error_count, 0);
    }

    #[test]
    fn test_typing_past_target_is_incorrect() {
        let out = on_keystroke("hi", "hi!", "hi", &ComboState::default(), Difficulty::Medium);
        assert_eq!(out.outcome, Some(Outcome::Incorrect));
        assert_eq!(out.error_count, 0);
    }

    #[test]
    fn test_level_from_points() {
        assert_eq!(ProgressState::from_points(2500).level(), 3);
        assert_eq!(ProgressState::from_points(999).level(), 1);
        assert_eq!(ProgressState::from_points(1000).level(), 2);
        assert_eq!(ProgressState::default().level(), 1);
    }

    #[test]
    fn test_add_points_reports_level_up() {
        let mut progress = ProgressState::from_points(990);
        assert_eq!(progress.add_points(5), None);
        assert_eq!(progress.add_points(5), Some(2));
        assert_eq!(progress.points(), 1000);
        assert_eq!(progress.add_points(2100), Some(4));
    }

    #[test]
    fn test_progress_level_recomputed_on_load() {
        let progress: ProgressState =
            serde_json::from_str(r#"{"points": 2500, "level": 42}"#).unwrap();
        assert_eq!(progress.level(), 3);

        let json = serde_json::to_string(&ProgressState::from_points(1200)).unwrap();
        assert_eq!(json, r#"{"points":1200,"level":2}"#);
    }
}
