use std::time::Instant;

use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::error::Result;
use crate::history::HistoryDb;
use crate::lyrics::LoadedLyrics;
use crate::practice::{random_practice_text, Language};
use crate::profile::{Achievement, Profile};
use crate::scoring::{Difficulty, ScoreEvent};
use crate::session::{Generation, Session, SessionSummary};

/// A finished run, kept for the results screen
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub summary: SessionSummary,
    pub unlocked: Vec<Achievement>,
}

/// Owns the live session and the player's profile and applies the rules that
/// tie them together. Every mutating call returns the events it produced.
#[derive(Debug)]
pub struct Game {
    session: Session,
    profile: Profile,
    session_points: u64,
    last_result: Option<RunResult>,
    history: Option<HistoryDb>,
}

fn unlocked_event(achievement: &Achievement) -> ScoreEvent {
    ScoreEvent::AchievementUnlocked {
        id: achievement.id.clone(),
        name: achievement.name.clone(),
    }
}

impl Game {
    pub fn new(session: Session, profile: Profile) -> Self {
        Self {
            session,
            profile,
            session_points: 0,
            last_result: None,
            history: None,
        }
    }

    /// Log every completed session to `history`
    pub fn with_history(mut self, history: HistoryDb) -> Self {
        self.history = Some(history);
        self
    }

    /// Feed the full typed text as it now reads
    pub fn on_input(&mut self, typed: &str, now: Instant) -> Vec<ScoreEvent> {
        self.on_input_at(typed, now, Local::now())
    }

    /// Like [`Game::on_input`] with an explicit wall-clock time for unlocks and records
    pub fn on_input_at(
        &mut self,
        typed: &str,
        now: Instant,
        at: DateTime<Local>,
    ) -> Vec<ScoreEvent> {
        let Some(result) = self
            .session
            .apply_input(typed, now, self.profile.difficulty)
        else {
            return Vec::new();
        };

        let mut events = result.keystroke.events;
        let points = result.keystroke.points_awarded;
        if points > 0 {
            self.session_points += points;
            if let Some(level) = self.profile.add_points(points) {
                info!(level, points = self.profile.points(), "level up");
                events.push(ScoreEvent::LevelUp { level });
            }
        }

        let unlocked = self.profile.observe_combo(self.session.combo(), at);
        events.extend(unlocked.iter().map(unlocked_event));

        if result.completed {
            events.extend(self.complete(at));
        }
        events
    }

    fn complete(&mut self, at: DateTime<Local>) -> Vec<ScoreEvent> {
        let summary = self
            .session
            .summary(self.session_points, self.profile.difficulty, at);
        info!(
            title = %summary.title,
            mode = %summary.mode,
            wpm = summary.wpm,
            accuracy = summary.accuracy,
            points = summary.points,
            "session complete"
        );

        let mut events = vec![ScoreEvent::SessionComplete {
            wpm: summary.wpm,
            accuracy: summary.accuracy,
        }];
        let unlocked = self.profile.record_completion(&summary);
        events.extend(unlocked.iter().map(unlocked_event));

        if let Some(history) = &self.history {
            if let Err(err) = history.record(&summary) {
                warn!(%err, "could not record session history");
            }
        }

        self.last_result = Some(RunResult { summary, unlocked });
        self.restart();
        events
    }

    /// Fresh attempt at the same text and timing
    pub fn restart(&mut self) {
        self.session.restart();
        self.session_points = 0;
    }

    pub fn load_lyrics(&mut self, title: impl Into<String>, text: &str, duration: Option<f64>) {
        self.session.load_lyrics(title, text, duration);
        self.session_points = 0;
    }

    /// Load a resolved lyric source, carrying its fallback notice over to the session
    pub fn load_resolved(
        &mut self,
        title: impl Into<String>,
        lyrics: &LoadedLyrics,
        duration: Option<f64>,
    ) {
        self.load_lyrics(title, &lyrics.text, duration);
        if let Some(advisory) = &lyrics.advisory {
            self.session.set_advisory(Some(advisory.clone()));
        }
    }

    /// Switch to a random practice text in the profile's language
    pub fn load_practice(&mut self) -> Result<()> {
        let text = random_practice_text(self.profile.language)?;
        self.session.load_practice(&text);
        self.session_points = 0;
        Ok(())
    }

    pub fn on_clock_tick(&mut self, token: Generation, now: Instant) -> bool {
        self.session.on_clock_tick(token, now)
    }

    pub fn on_playback_tick(&mut self, token: Generation, playback_time: f64) -> bool {
        self.session.on_playback_tick(token, playback_time)
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.profile.difficulty = difficulty;
    }

    pub fn set_language(&mut self, language: Language) {
        self.profile.language = language;
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Points earned in the running session
    pub fn session_points(&self) -> u64 {
        self.session_points
    }

    pub fn last_result(&self) -> Option<&RunResult> {
        self.last_result.as_ref()
    }

    pub fn history(&self) -> Option<&HistoryDb> {
        self.history.as_ref()
    }
}
