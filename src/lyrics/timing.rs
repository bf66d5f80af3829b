use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One lyric line with the playback window (in seconds) it is shown for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricLine {
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
}

impl LyricLine {
    pub fn contains(&self, time: f64) -> bool {
        self.start_time <= time && time < self.end_time
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Non-blank, trimmed lines of `text` in order
pub fn non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Spread the non-blank lines of `lyric_text` evenly over `duration_seconds`.
///
/// Segment `i` of `n` spans `[i * d / n, (i + 1) * d / n)` and the last segment
/// ends exactly at `duration_seconds`. A non-positive duration yields zero-width
/// segments, so callers holding an unknown duration should use
/// [`try_build_timed_lyrics`] or defer the call.
pub fn build_timed_lyrics(lyric_text: &str, duration_seconds: f64) -> Vec<LyricLine> {
    let lines: Vec<&str> = non_empty_lines(lyric_text).collect();
    if lines.is_empty() {
        return Vec::new();
    }

    let count = lines.len();
    let per_line = duration_seconds / count as f64;

    lines
        .into_iter()
        .enumerate()
        .map(|(idx, text)| {
            let end_time = if idx + 1 == count {
                duration_seconds
            } else {
                (idx + 1) as f64 * per_line
            };
            LyricLine {
                text: text.to_string(),
                start_time: idx as f64 * per_line,
                end_time,
            }
        })
        .collect()
}

/// Like [`build_timed_lyrics`] but refuses durations that are not positive and finite
pub fn try_build_timed_lyrics(lyric_text: &str, duration_seconds: f64) -> Result<Vec<LyricLine>> {
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return Err(Error::InvalidDuration(duration_seconds));
    }
    Ok(build_timed_lyrics(lyric_text, duration_seconds))
}

/// The segment playing at `time`, if any
pub fn current_lyric_at(segments: &[LyricLine], time: f64) -> Option<&LyricLine> {
    segments.iter().find(|segment| segment.contains(time))
}

/// Index of the segment playing at `time`, if any
pub fn current_lyric_index(segments: &[LyricLine], time: f64) -> Option<usize> {
    segments.iter().position(|segment| segment.contains(time))
}
