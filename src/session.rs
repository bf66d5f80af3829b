use std::time::Instant;

use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::lyrics::{
    clean_lyric_text, current_lyric_index, lyric_prompt, try_build_timed_lyrics, LyricLine,
    PLACEHOLDER_TEXT,
};
use crate::scoring::{
    compute_accuracy, compute_wpm, on_keystroke, ComboState, Difficulty, KeystrokeOutcome,
};

/// Session token. Every restart or source change moves to the next generation, and
/// timer callbacks armed under an older one are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

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
pub enum Mode {
    #[default]
    Lyrics,
    Practice,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionMetrics {
    pub typed_length: usize,
    pub error_count: usize,
    pub wpm: u32,
    pub accuracy: u8,
    pub elapsed_seconds: f64,
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self {
            typed_length: 0,
            error_count: 0,
            wpm: 0,
            accuracy: 100,
            elapsed_seconds: 0.0,
        }
    }
}

impl SessionMetrics {
    fn recompute(&mut self, typed_length: usize, error_count: usize, elapsed_seconds: f64) {
        self.typed_length = typed_length;
        self.error_count = error_count;
        self.elapsed_seconds = elapsed_seconds;
        self.wpm = compute_wpm(typed_length, elapsed_seconds, error_count);
        self.accuracy = compute_accuracy(typed_length.saturating_sub(error_count), typed_length);
    }
}

/// A point on the in-session WPM curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WpmSample {
    pub t: f64,
    pub wpm: f64,
}

impl WpmSample {
    pub fn new(t: f64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

impl From<WpmSample> for (f64, f64) {
    fn from(p: WpmSample) -> Self {
        (p.t, p.wpm)
    }
}

/// Frozen result of a completed session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub title: String,
    pub mode: Mode,
    pub difficulty: Difficulty,
    pub wpm: u32,
    pub accuracy: u8,
    pub errors: usize,
    pub typed_length: usize,
    pub elapsed_seconds: f64,
    pub max_combo: u32,
    pub max_streak: u32,
    pub points: u64,
    pub completed_at: DateTime<Local>,
    pub wpm_samples: Vec<WpmSample>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LyricTiming {
    /// No usable duration yet
    Pending,
    Ready {
        duration: f64,
        lines: Vec<LyricLine>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputResult {
    pub keystroke: KeystrokeOutcome,
    pub completed: bool,
}

/// Mutable state of one play-through of a lyric or practice text
#[derive(Debug, Clone)]
pub struct Session {
    generation: Generation,
    mode: Mode,
    title: String,
    lyric_text: String,
    target: String,
    target_len: usize,
    typed: String,
    metrics: SessionMetrics,
    combo: ComboState,
    started_at: Option<Instant>,
    completed: bool,
    timing: LyricTiming,
    current_lyric_index: usize,
    playback_time: f64,
    wpm_samples: Vec<WpmSample>,
    advisory: Option<String>,
}

impl Session {
    pub fn new(mode: Mode, title: impl Into<String>, text: &str) -> Self {
        let mut session = Self {
            generation: Generation::default(),
            mode,
            title: title.into(),
            lyric_text: String::new(),
            target: String::new(),
            target_len: 0,
            typed: String::new(),
            metrics: SessionMetrics::default(),
            combo: ComboState::default(),
            started_at: None,
            completed: false,
            timing: LyricTiming::Pending,
            current_lyric_index: 0,
            playback_time: 0.0,
            wpm_samples: Vec::new(),
            advisory: None,
        };
        session.set_text(text);
        session
    }

    fn set_text(&mut self, text: &str) {
        let cleaned = clean_lyric_text(text);
        if cleaned.is_empty() {
            self.lyric_text = PLACEHOLDER_TEXT.to_string();
            self.advisory = Some("Nothing to type, using placeholder text".to_string());
        } else {
            self.lyric_text = cleaned;
        }
        self.target = lyric_prompt(&self.lyric_text);
        self.target_len = self.target.chars().count();
    }

    /// Reset typing state for another attempt at the same text and timing
    pub fn restart(&mut self) {
        self.generation = self.generation.next();
        self.typed.clear();
        self.metrics = SessionMetrics::default();
        self.combo = ComboState::default();
        self.started_at = None;
        self.completed = false;
        self.current_lyric_index = 0;
        self.playback_time = 0.0;
        self.wpm_samples.clear();
        debug!(generation = self.generation.value(), "session restarted");
    }

    /// Swap in a new lyric source. Timing is only built once a positive duration is known.
    pub fn load_lyrics(&mut self, title: impl Into<String>, text: &str, duration: Option<f64>) {
        self.replace_source(Mode::Lyrics, title.into(), text);
        let ready = duration.is_some_and(|d| self.set_duration(d));
        if !ready {
            debug!("lyric timing deferred until the duration is known");
            if self.advisory.is_none() {
                self.advisory = Some("Song length unknown, lyrics will follow once it is".to_string());
            }
        }
    }

    /// Swap in a practice text. Practice sessions have no lyric timing.
    pub fn load_practice(&mut self, text: &str) {
        self.replace_source(Mode::Practice, "Practice".to_string(), text);
    }

    fn replace_source(&mut self, mode: Mode, title: String, text: &str) {
        self.mode = mode;
        self.title = title;
        self.advisory = None;
        self.timing = LyricTiming::Pending;
        self.set_text(text);
        self.restart();
    }

    /// Build (or rebuild) lyric timing for `duration`. Returns true when timing is ready.
    pub fn set_duration(&mut self, duration: f64) -> bool {
        if let LyricTiming::Ready { duration: built, .. } = self.timing {
            if built == duration {
                return true;
            }
        }

        match try_build_timed_lyrics(&self.lyric_text, duration) {
            Ok(lines) => {
                debug!(duration, lines = lines.len(), "lyric timing built");
                self.timing = LyricTiming::Ready { duration, lines };
                self.current_lyric_index = 0;
                true
            }
            Err(err) => {
                debug!(%err, "lyric timing deferred");
                false
            }
        }
    }

    /// Apply the full typed text as it now reads. Input past the end of the
    /// target is cut off; a completed session ignores further input.
    pub fn apply_input(
        &mut self,
        new_typed: &str,
        now: Instant,
        difficulty: Difficulty,
    ) -> Option<InputResult> {
        if self.completed {
            return None;
        }

        let new_typed: String = new_typed.chars().take(self.target_len).collect();
        let new_len = new_typed.chars().count();
        if self.started_at.is_none() && new_len > 0 {
            self.started_at = Some(now);
        }

        let keystroke = on_keystroke(&self.typed, &new_typed, &self.target, &self.combo, difficulty);
        self.combo = keystroke.combo;
        self.typed = new_typed;

        let elapsed = self.elapsed_at(now);
        self.metrics.recompute(new_len, keystroke.error_count, elapsed);

        let completed = new_len == self.target_len;
        if completed {
            self.completed = true;
            self.wpm_samples
                .push(WpmSample::new(elapsed, self.metrics.wpm as f64));
        }

        Some(InputResult {
            keystroke,
            completed,
        })
    }

    /// Periodic elapsed-time refresh. Returns false when the tick was ignored.
    pub fn on_clock_tick(&mut self, token: Generation, now: Instant) -> bool {
        if token != self.generation {
            debug!(
                token = token.value(),
                current = self.generation.value(),
                "stale clock tick ignored"
            );
            return false;
        }
        if self.completed || self.started_at.is_none() {
            return false;
        }

        let elapsed = self.elapsed_at(now);
        self.metrics
            .recompute(self.metrics.typed_length, self.metrics.error_count, elapsed);
        self.wpm_samples
            .push(WpmSample::new(elapsed, self.metrics.wpm as f64));
        true
    }

    /// Periodic playback sample. The last matched lyric index is kept between segments.
    pub fn on_playback_tick(&mut self, token: Generation, playback_time: f64) -> bool {
        if token != self.generation {
            debug!(
                token = token.value(),
                current = self.generation.value(),
                "stale playback tick ignored"
            );
            return false;
        }
        let LyricTiming::Ready { lines, .. } = &self.timing else {
            return false;
        };

        self.playback_time = playback_time;
        if let Some(idx) = current_lyric_index(lines, playback_time) {
            self.current_lyric_index = idx;
        }
        true
    }

    pub fn summary(&self, points: u64, difficulty: Difficulty, at: DateTime<Local>) -> SessionSummary {
        SessionSummary {
            title: self.title.clone(),
            mode: self.mode,
            difficulty,
            wpm: self.metrics.wpm,
            accuracy: self.metrics.accuracy,
            errors: self.metrics.error_count,
            typed_length: self.metrics.typed_length,
            elapsed_seconds: self.metrics.elapsed_seconds,
            max_combo: self.combo.max_combo,
            max_streak: self.combo.max_streak,
            points,
            completed_at: at,
            wpm_samples: self.wpm_samples.clone(),
        }
    }

    fn elapsed_at(&self, now: Instant) -> f64 {
        self.started_at
            .map(|start| now.saturating_duration_since(start).as_secs_f64())
            .unwrap_or(0.0)
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn target_len(&self) -> usize {
        self.target_len
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    pub fn combo(&self) -> &ComboState {
        &self.combo
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn timing(&self) -> &LyricTiming {
        &self.timing
    }

    pub fn lyric_lines(&self) -> &[LyricLine] {
        match &self.timing {
            LyricTiming::Ready { lines, .. } => lines,
            LyricTiming::Pending => &[],
        }
    }

    pub fn current_lyric_index(&self) -> usize {
        self.current_lyric_index
    }

    pub fn current_lyric(&self) -> Option<&LyricLine> {
        self.lyric_lines().get(self.current_lyric_index)
    }

    pub fn playback_time(&self) -> f64 {
        self.playback_time
    }

    pub fn wpm_samples(&self) -> &[WpmSample] {
        &self.wpm_samples
    }

    pub fn advisory(&self) -> Option<&str> {
        self.advisory.as_deref()
    }

    pub fn set_advisory(&mut self, advisory: Option<String>) {
        self.advisory = advisory;
    }
}
