pub mod labels;
pub mod source;
pub mod timing;

// Re-export the main types for convenience
pub use labels::{clean_lyric_text, lyric_prompt, strip_section_labels};
pub use source::{
    clean_song_title, extract_lyrics_from_description, fallback_lyrics, resolve_lyrics,
    split_artist_title, LoadedLyrics, PLACEHOLDER_TEXT,
};
pub use timing::{
    build_timed_lyrics, current_lyric_at, current_lyric_index, try_build_timed_lyrics, LyricLine,
};
