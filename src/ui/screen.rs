use ratatui::Frame;

use crate::{App, AppState};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
    /// Keys this screen responds to, for the legend and tests
    fn legend(&self) -> &'static str;
}

/// Typing and results share the App widget
pub struct TypingScreen;

impl Screen for TypingScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }

    fn legend(&self) -> &'static str {
        "(ctrl+r) restart / (esc)ape"
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }

    fn legend(&self) -> &'static str {
        "(r)etry / (a)chievements / (h)igh scores / (esc)ape"
    }
}

pub struct AchievementsScreen;

impl Screen for AchievementsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        crate::ui::records::render_achievements(app, f.area(), f.buffer_mut());
    }

    fn legend(&self) -> &'static str {
        "(b)ack / (h)igh scores / (r)etry / (esc)ape"
    }
}

pub struct HighScoresScreen;

impl Screen for HighScoresScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        crate::ui::records::render_high_scores(app, f.area(), f.buffer_mut());
    }

    fn legend(&self) -> &'static str {
        "(b)ack / (a)chievements / (r)etry / (esc)ape"
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: AppState) -> Box<dyn Screen> {
    match state {
        AppState::Typing => Box::new(TypingScreen),
        AppState::Results => Box::new(ResultsScreen),
        AppState::Achievements => Box::new(AchievementsScreen),
        AppState::HighScores => Box::new(HighScoresScreen),
    }
}
