use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use super::timing::non_empty_lines;

/// Shown whenever neither lyrics nor a usable description are available
pub const PLACEHOLDER_TEXT: &str = "Start typing to practice with this placeholder text instead.";

/// Where a description's lyrics begin, in order of preference
static LYRICS_MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    ignore_case_literals(&[
        "lyrics:", "lyrics", "lyric:", "lyric", "words:", "words", "letra:", "letra", "가사:",
        "가사", "текст:", "текст",
    ])
});

/// Where they end, in order of preference
static END_MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    ignore_case_literals(&[
        "follow",
        "subscribe",
        "instagram",
        "facebook",
        "twitter",
        "tiktok",
        "copyright",
        "©",
        "all rights reserved",
        "official",
    ])
});

static VERSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)verse").expect("valid pattern"));
static CHORUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)chorus").expect("valid pattern"));

static PARENTHESIZED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*?\)").expect("valid pattern"));
static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").expect("valid pattern"));
static OFFICIAL_VIDEO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)official\s*(music)?\s*video").expect("valid pattern"));
static LYRICS_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)lyrics").expect("valid pattern"));

fn ignore_case_literals(words: &[&str]) -> Vec<Regex> {
    words
        .iter()
        .map(|word| {
            RegexBuilder::new(&regex::escape(word))
                .case_insensitive(true)
                .build()
                .expect("escaped literal is a valid pattern")
        })
        .collect()
}

/// Byte span of the first marker found, trying markers in order
fn first_marker(markers: &[Regex], text: &str) -> Option<(usize, usize)> {
    markers
        .iter()
        .find_map(|marker| marker.find(text))
        .map(|m| (m.start(), m.end()))
}

/// Lyrics ready for a session, plus a message for the player when we fell back
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedLyrics {
    pub text: String,
    pub advisory: Option<String>,
}

/// Strip the decorations video titles carry so the remainder names the song
pub fn clean_song_title(title: &str) -> String {
    let cleaned = PARENTHESIZED.replace_all(title, "");
    let cleaned = BRACKETED.replace_all(&cleaned, "");
    let cleaned = OFFICIAL_VIDEO.replace(&cleaned, "");
    let cleaned = LYRICS_WORD.replace(&cleaned, "");

    cleaned.trim().to_string()
}

/// Split an `Artist - Song` title. An explicit artist wins over the title's prefix.
pub fn split_artist_title(cleaned_title: &str, artist: Option<&str>) -> (String, String) {
    if let Some(artist) = artist {
        return (artist.trim().to_string(), cleaned_title.trim().to_string());
    }

    let mut parts = cleaned_title.split('-');
    let first = parts.next().unwrap_or_default().trim();
    match parts.next().map(str::trim) {
        Some(song) if !song.is_empty() => (first.to_string(), song.to_string()),
        _ => (first.to_string(), cleaned_title.trim().to_string()),
    }
}

/// Placeholder practice text used when lyrics for `song_title` cannot be found
pub fn fallback_lyrics(song_title: &str) -> String {
    format!(
        "Lyrics for \"{song_title}\" could not be loaded.\n\
         \n\
         Start typing to practice with this placeholder text instead.\n\
         The quick brown fox jumps over the lazy dog.\n\
         Pack my box with five dozen liquor jugs.\n\
         How vexingly quick daft zebras jump!"
    )
}

/// Pull the lyrics section out of a music video description, if it has one
pub fn extract_lyrics_from_description(description: &str) -> Option<String> {
    if description.trim().is_empty() {
        return None;
    }

    let Some((_, start)) = first_marker(&LYRICS_MARKERS, description) else {
        if VERSE.is_match(description) && CHORUS.is_match(description) {
            return Some(description.to_string());
        }

        let lines: Vec<&str> = description
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();
        if lines.len() > 5 {
            let short_lines = lines.iter().filter(|l| l.chars().count() < 100).count();
            if short_lines as f64 > lines.len() as f64 * 0.7 {
                return Some(lines.join("\n"));
            }
        }
        return None;
    };

    let mut content = description[start..].trim();
    if let Some((end, _)) = first_marker(&END_MARKERS, content) {
        content = content[..end].trim();
    }

    (!content.is_empty()).then(|| content.to_string())
}

/// Pick the text a session should use, degrading to a placeholder instead of failing
pub fn resolve_lyrics(raw: Option<&str>, song_title: &str) -> LoadedLyrics {
    match raw.map(|text| non_empty_lines(text).join("\n")) {
        Some(text) if !text.is_empty() => {
            debug!(chars = text.len(), "lyrics loaded");
            LoadedLyrics {
                text,
                advisory: None,
            }
        }
        Some(_) => {
            warn!(title = song_title, "loaded lyrics were empty");
            LoadedLyrics {
                text: fallback_lyrics(song_title),
                advisory: Some("Could not load lyrics for this song".to_string()),
            }
        }
        None => {
            warn!(title = song_title, "no lyrics available");
            LoadedLyrics {
                text: fallback_lyrics(song_title),
                advisory: Some("Lyrics unavailable, practicing with placeholder text".to_string()),
            }
        }
    }
}
