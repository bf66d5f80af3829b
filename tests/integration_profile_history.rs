use std::time::{Duration, Instant};

use chrono::{Local, TimeZone};
use tempfile::tempdir;

use lyrictype::history::HistoryDb;
use lyrictype::profile::achievements::{FIRST_SONG, LYRIC_GENIUS, LYRIC_GENIUS_SESSIONS};
use lyrictype::profile::{FileProfileStore, Profile, ProfileStore};
use lyrictype::scoring::{Difficulty, ScoreEvent};
use lyrictype::{Game, Mode, Session};

fn play_through(game: &mut Game, start: Instant) -> Vec<ScoreEvent> {
    let target = game.session().target().to_string();
    let at = Local.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap();
    let mut typed = String::new();
    let mut events = Vec::new();
    for (i, c) in target.chars().enumerate() {
        typed.push(c);
        let now = start + Duration::from_millis(250 * i as u64);
        events.extend(game.on_input_at(&typed, now, at));
    }
    events
}

#[test]
fn progress_survives_a_restart_of_the_app() {
    let dir = tempdir().unwrap();
    let store = FileProfileStore::with_path(dir.path().join("profile.json"));

    let mut game = Game::new(
        Session::new(Mode::Lyrics, "Song", "sing it loud"),
        store.load(),
    );
    game.set_difficulty(Difficulty::Easy);
    play_through(&mut game, Instant::now());
    store.save(game.profile()).unwrap();

    let reloaded = store.load();
    assert_eq!(reloaded.difficulty, Difficulty::Easy);
    assert_eq!(reloaded.completed_sessions, 1);
    assert_eq!(reloaded.points(), game.profile().points());
    assert!(reloaded.is_unlocked(FIRST_SONG));
    assert_eq!(reloaded.high_scores.len(), 1);
    assert_eq!(reloaded.high_scores.best().unwrap().mode, Mode::Lyrics);
}

#[test]
fn many_songs_unlock_lyric_genius_once() {
    let mut game = Game::new(Session::new(Mode::Lyrics, "Song", "la"), Profile::default());

    let mut unlocks = 0;
    for _ in 0..LYRIC_GENIUS_SESSIONS + 2 {
        unlocks += play_through(&mut game, Instant::now())
            .iter()
            .filter(|e| matches!(e, ScoreEvent::AchievementUnlocked { id, .. } if id == LYRIC_GENIUS))
            .count();
    }

    assert_eq!(unlocks, 1);
    assert!(game.profile().is_unlocked(LYRIC_GENIUS));
    assert_eq!(game.profile().high_scores.len(), 10);
}

#[test]
fn history_keeps_every_session_and_exports_it() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("state").join("history.db");

    {
        let mut game = Game::new(Session::new(Mode::Practice, "Practice", "abc"), Profile::default())
            .with_history(HistoryDb::open(&db_path).unwrap());
        play_through(&mut game, Instant::now());
        play_through(&mut game, Instant::now());
    }

    let db = HistoryDb::open(&db_path).unwrap();
    assert_eq!(db.count().unwrap(), 2);
    assert!(db.best_wpm().unwrap().is_some());

    let mut out = Vec::new();
    assert_eq!(db.export_csv(&mut out).unwrap(), 2);
    let csv = String::from_utf8(out).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("completed_at,title,mode"));
    assert_eq!(lines.filter(|l| l.contains(",Practice,practice,")).count(), 2);
}

#[test]
fn history_outgrows_the_capped_high_scores() {
    let mut game = Game::new(Session::new(Mode::Lyrics, "Song", "la la"), Profile::default())
        .with_history(HistoryDb::open_in_memory().unwrap());

    for _ in 0..12 {
        play_through(&mut game, Instant::now());
    }

    assert_eq!(game.history().unwrap().count().unwrap(), 12);
    assert_eq!(game.profile().high_scores.len(), 10);
    assert_eq!(game.profile().completed_sessions, 12);
}
