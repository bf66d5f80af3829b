use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

use super::timing::non_empty_lines;

/// `[Verse]`, `[Chorus 2]`, `(Hook)` and the other section markers scraped lyrics
/// carry, never meant to be typed
static SECTION_LABEL: Lazy<Regex> = Lazy::new(|| {
    let names = "Verse|Chorus|Intro|Bridge|Outro|Pre-Chorus|Hook|Refrain|Interlude";
    Regex::new(&format!(
        r"(?i)\[\s*(?:{names})(?:\s+\d+)?\s*\]|\(\s*(?:{names})(?:\s+\d+)?\s*\)"
    ))
    .expect("valid pattern")
});

/// Remove section markers from one line
pub fn strip_section_labels(line: &str) -> String {
    SECTION_LABEL.replace_all(line, "").trim().to_string()
}

/// Lyrics reduced to the lines a player types, one per line
pub fn clean_lyric_text(text: &str) -> String {
    non_empty_lines(text)
        .map(strip_section_labels)
        .filter(|line| !line.is_empty())
        .join("\n")
}

/// The single-line prompt typed for a set of lyrics
pub fn lyric_prompt(text: &str) -> String {
    non_empty_lines(text)
        .map(strip_section_labels)
        .filter(|line| !line.is_empty())
        .join(" ")
}
