mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use lyrictype::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    feedback::{cue_for, Sound},
    history::HistoryDb,
    lyrics::{clean_song_title, extract_lyrics_from_description, resolve_lyrics, PLACEHOLDER_TEXT},
    playback::{Playback, SimulatedPlayback},
    practice::Language,
    profile::{FileProfileStore, Profile, ProfileStore},
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner, SessionTimers, TimerFired},
    scoring::{Difficulty, ScoreEvent},
    Game, Mode, Session,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, File, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::ui::screen::current_screen;

const TICK_RATE_MS: u64 = 100;

/// type along to song lyrics in your terminal
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    version,
    about,
    long_about = "A terminal typing game: type song lyrics while the song plays, build combos, level up and unlock achievements."
)]
pub struct Cli {
    /// plain-text lyrics file, one lyric line per line
    #[clap(short = 'l', long, value_name = "FILE")]
    lyrics: Option<PathBuf>,

    /// song title, usually "Artist - Song"
    #[clap(short = 't', long)]
    title: Option<String>,

    /// video description file to pull the lyrics out of
    #[clap(long, value_name = "FILE")]
    description: Option<PathBuf>,

    /// song length in seconds (defaults to the configured length)
    #[clap(short = 'd', long, value_name = "SECS")]
    duration: Option<f64>,

    /// type a built-in practice text instead of lyrics
    #[clap(short = 'p', long)]
    practice: bool,

    /// scales combo bonuses
    #[clap(long, value_enum)]
    difficulty: Option<Difficulty>,

    /// language of the practice texts
    #[clap(long, value_enum)]
    language: Option<Language>,

    /// turn sound cues off
    #[clap(short = 'm', long)]
    mute: bool,

    /// keep this run's settings for next time
    #[clap(long)]
    save_config: bool,

    /// write every recorded session to a CSV file and exit
    #[clap(long, value_name = "FILE")]
    export_history: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Typing,
    Results,
    Achievements,
    HighScores,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveBanner {
    pub text: String,
    pub until: Instant,
}

/// What the main loop should do after a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// A session just finished; the profile has changed
    Finished,
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub game: Game,
    pub state: AppState,
    pub config: Config,
    pub playback: SimulatedPlayback,
    pub timers: SessionTimers,
    pub banner: Option<ActiveBanner>,
    pub last_sound: Option<Sound>,
}

impl App {
    pub fn new(game: Game, config: Config, duration: Option<f64>, now: Instant) -> Self {
        let timers = SessionTimers::arm(
            config.playback_poll_interval(),
            config.clock_tick_interval(),
            now,
            game.session().generation(),
        );
        Self {
            game,
            state: AppState::Typing,
            config,
            playback: SimulatedPlayback::new(duration),
            timers,
            banner: None,
            last_sound: None,
        }
    }

    pub fn restart(&mut self, now: Instant) {
        self.game.restart();
        self.playback.restart();
        self.timers.rearm(now, self.game.session().generation());
        self.banner = None;
        self.last_sound = None;
        self.state = AppState::Typing;
    }

    fn back(&mut self) {
        self.state = if self.game.last_result().is_some() {
            AppState::Results
        } else {
            AppState::Typing
        };
    }

    fn type_text(&mut self, typed: &str, now: Instant) -> Flow {
        let events = self.game.on_input(typed, now);
        if self.game.session().mode() == Mode::Lyrics
            && self.game.session().has_started()
            && !self.playback.is_playing()
        {
            self.playback.play(now);
        }
        self.dispatch(&events, now)
    }

    /// Turn score events into cues and screen changes
    fn dispatch(&mut self, events: &[ScoreEvent], now: Instant) -> Flow {
        let mut flow = Flow::Continue;
        for event in events {
            let cue = cue_for(event, self.config.sound_enabled);
            if let Some(sound) = cue.sound {
                debug!(kind = %sound.kind, volume = sound.volume, rate = sound.playback_rate, "cue");
                self.last_sound = Some(sound);
            }
            if let Some(banner) = cue.banner {
                self.banner = Some(ActiveBanner {
                    text: banner.text,
                    until: now + banner.lasts,
                });
            }
            if let ScoreEvent::SessionComplete { .. } = event {
                self.playback.pause(now);
                self.playback.restart();
                self.timers.rearm(now, self.game.session().generation());
                self.state = AppState::Results;
                flow = Flow::Finished;
            }
        }
        flow
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> Flow {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('c') if ctrl => return Flow::Quit,
            KeyCode::Char('r') if ctrl => {
                self.restart(now);
                return Flow::Continue;
            }
            KeyCode::Left => {
                self.restart(now);
                return Flow::Continue;
            }
            _ => {}
        }

        match self.state {
            AppState::Typing => match key.code {
                KeyCode::Backspace => {
                    let mut typed = self.game.session().typed().to_string();
                    if typed.pop().is_some() {
                        return self.type_text(&typed, now);
                    }
                }
                KeyCode::Char(c) if !ctrl => {
                    let mut typed = self.game.session().typed().to_string();
                    typed.push(c);
                    return self.type_text(&typed, now);
                }
                _ => {}
            },
            AppState::Results | AppState::Achievements | AppState::HighScores => match key.code {
                KeyCode::Char('r') => self.restart(now),
                KeyCode::Char('a') => self.state = AppState::Achievements,
                KeyCode::Char('h') => self.state = AppState::HighScores,
                KeyCode::Char('b') | KeyCode::Backspace => self.back(),
                _ => {}
            },
        }
        Flow::Continue
    }

    /// Expire banners and run whichever session timers are due
    pub fn on_tick(&mut self, now: Instant) {
        if self.banner.as_ref().is_some_and(|b| now >= b.until) {
            self.banner = None;
        }

        let generation = self.game.session().generation();
        if self.timers.token() != generation {
            self.timers.rearm(now, generation);
        }

        for fired in self.timers.due(now) {
            match fired {
                TimerFired::Playback(token) => {
                    let t = self.playback.current_time(now);
                    self.game.on_playback_tick(token, t);
                }
                TimerFired::Clock(token) => {
                    self.game.on_clock_tick(token, now);
                }
            }
        }
    }
}

fn title_from_path(path: &std::path::Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

/// Build the game for this run from the CLI sources
fn build_game(cli: &Cli, config: &Config, profile: Profile) -> lyrictype::Result<(Game, Option<f64>)> {
    let mut game = Game::new(Session::new(Mode::Practice, "Practice", PLACEHOLDER_TEXT), profile);
    if cli.practice {
        game.load_practice()?;
        return Ok((game, None));
    }

    let title = cli
        .title
        .clone()
        .or_else(|| cli.lyrics.as_deref().and_then(title_from_path))
        .unwrap_or_else(|| "Unknown Song".to_string());

    let raw = match (&cli.lyrics, &cli.description) {
        (Some(path), _) => Some(fs::read_to_string(path)?),
        (None, Some(path)) => extract_lyrics_from_description(&fs::read_to_string(path)?),
        (None, None) => None,
    };

    let duration = cli
        .duration
        .or(Some(config.default_duration_secs))
        .filter(|d| d.is_finite() && *d > 0.0);
    let loaded = resolve_lyrics(raw.as_deref(), &title);
    game.load_resolved(clean_song_title(&title), &loaded, duration);
    Ok((game, duration))
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lyrictype=info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn open_history() -> Option<HistoryDb> {
    let path = AppDirs::history_db_path()?;
    match HistoryDb::open(&path) {
        Ok(db) => Some(db),
        Err(err) => {
            warn!(path = %path.display(), %err, "history disabled");
            None
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let history = open_history();
    if let Some(path) = &cli.export_history {
        let Some(db) = &history else {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::Io, "history database is unavailable").exit();
        };
        let written = db.export_csv(File::create(path)?)?;
        println!("exported {written} sessions to {}", path.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    if cli.mute {
        config.sound_enabled = false;
    }

    let profile_store = FileProfileStore::new();
    let mut profile = profile_store.load();
    if let Some(difficulty) = cli.difficulty {
        profile.difficulty = difficulty;
    }
    if let Some(language) = cli.language {
        profile.language = language;
    }
    if cli.save_config {
        config_store.save(&config)?;
        profile_store.save(&profile)?;
    }

    let (game, duration) = build_game(&cli, &config, profile)?;
    let game = match history {
        Some(db) => game.with_history(db),
        None => game,
    };
    info!(title = game.session().title(), mode = %game.session().mode(), "starting");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(game, config, duration, Instant::now());
    let res = start_tui(&mut terminal, &mut app, &profile_store);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    if let Err(err) = profile_store.save(app.game.profile()) {
        warn!(%err, "could not save profile");
    }

    res
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    profile_store: &impl ProfileStore,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| ui(app, f))?;

        let event = runner.step();
        let now = Instant::now();
        if let AppEvent::Key(key) = event {
            if key.kind == KeyEventKind::Press {
                match app.on_key(key, now) {
                    Flow::Quit => break,
                    Flow::Finished => {
                        if let Err(err) = profile_store.save(app.game.profile()) {
                            warn!(%err, "could not save profile");
                        }
                    }
                    Flow::Continue => {}
                }
            }
        }
        app.on_tick(now);
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    current_screen(app.state).render(app, f);
}
