use std::time::{Duration, Instant};

use tracing::debug;

/// The song being played alongside the lyrics.
///
/// Times are in seconds. The game only ever polls it; nothing is pushed back.
pub trait Playback {
    /// Song length, once known
    fn duration(&self) -> Option<f64>;
    /// Elapsed playback at `now`
    fn current_time(&self, now: Instant) -> f64;
    fn is_playing(&self) -> bool;
}

/// Wall-clock stand-in for a real player. Runs from `play` until `pause`,
/// clamped to the song length.
#[derive(Debug, Clone)]
pub struct SimulatedPlayback {
    duration: Option<f64>,
    /// Playback accumulated before the current run
    banked: Duration,
    playing_since: Option<Instant>,
}

impl SimulatedPlayback {
    pub fn new(duration: Option<f64>) -> Self {
        Self {
            duration: duration.filter(|d| d.is_finite() && *d > 0.0),
            banked: Duration::ZERO,
            playing_since: None,
        }
    }

    pub fn play(&mut self, now: Instant) {
        if self.playing_since.is_none() {
            debug!(at = self.current_time(now), "playback started");
            self.playing_since = Some(now);
        }
    }

    pub fn pause(&mut self, now: Instant) {
        if let Some(since) = self.playing_since.take() {
            self.banked += now.saturating_duration_since(since);
            debug!(at = self.current_time(now), "playback paused");
        }
    }

    /// Back to the start, stopped
    pub fn restart(&mut self) {
        self.banked = Duration::ZERO;
        self.playing_since = None;
    }

    fn raw_time(&self, now: Instant) -> f64 {
        let running = self
            .playing_since
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or_default();
        (self.banked + running).as_secs_f64()
    }
}

impl Playback for SimulatedPlayback {
    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn current_time(&self, now: Instant) -> f64 {
        let t = self.raw_time(now);
        match self.duration {
            Some(d) => t.min(d),
            None => t,
        }
    }

    fn is_playing(&self) -> bool {
        self.playing_since.is_some()
    }
}
