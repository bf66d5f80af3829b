use chrono::{DateTime, Local};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget, Wrap},
};
use time_humanize::HumanTime;

use lyrictype::{
    history::HistoryDb,
    profile::{Achievement, HighScoreEntry},
};

use crate::ui::screen::current_screen;
use crate::App;

/// "3 hours ago" style age of `date` as seen at `now`
pub fn unlocked_ago(date: DateTime<Local>, now: DateTime<Local>) -> String {
    let secs = (now - date).num_seconds().max(0);
    HumanTime::from_seconds(-secs).to_string()
}

/// Pure presenter for a single achievement row
pub fn present_achievement(achievement: &Achievement, now: DateTime<Local>) -> Row<'static> {
    let (status, style) = match (achievement.unlocked, achievement.unlocked_date) {
        (true, Some(date)) => (
            format!("unlocked {}", unlocked_ago(date, now)),
            Style::default().fg(Color::Green),
        ),
        (true, None) => ("unlocked".to_string(), Style::default().fg(Color::Green)),
        (false, _) => (
            "locked".to_string(),
            Style::default().add_modifier(Modifier::DIM),
        ),
    };

    Row::new(vec![
        Cell::from(achievement.icon.clone()),
        Cell::from(achievement.name.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(achievement.description.clone()),
        Cell::from(status).style(style),
    ])
}

/// Pure presenter for a single high score row
pub fn present_high_score(rank: usize, entry: &HighScoreEntry) -> Row<'static> {
    let wpm_color = if rank == 0 {
        Color::Yellow
    } else {
        Color::Reset
    };

    Row::new(vec![
        Cell::from(format!("#{}", rank + 1)),
        Cell::from(entry.wpm.to_string()).style(Style::default().fg(wpm_color)),
        Cell::from(format!("{}%", entry.accuracy)),
        Cell::from(entry.mode.to_string()),
        Cell::from(entry.points.to_string()),
        Cell::from(entry.date.format("%Y-%m-%d %H:%M").to_string()),
    ])
}

fn layout(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Table
            Constraint::Length(2), // Summary
            Constraint::Length(1), // Instructions
        ])
        .split(area)
}

fn render_title(text: String, area: Rect, buf: &mut Buffer) {
    Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_instructions(app: &App, area: Rect, buf: &mut Buffer) {
    Paragraph::new(current_screen(app.state).legend())
        .alignment(Alignment::Center)
        .render(area, buf);
}

/// Lifetime figures and the latest logged session
fn history_lines(db: &HistoryDb) -> Option<Vec<Line<'static>>> {
    let count = db.count().ok()?;
    let lifetime = match (db.best_wpm().ok()?, db.average_wpm().ok()?) {
        (Some(best), Some(average)) => {
            format!("{count} sessions logged   best {best} wpm   average {average:.0} wpm")
        }
        _ => format!("{count} sessions logged"),
    };

    let mut lines = vec![Line::from(lifetime)];
    if let Some(last) = db.recent(1).ok()?.first() {
        lines.push(Line::from(format!(
            "last: {} at {} wpm, {}% ({})",
            last.title,
            last.wpm,
            last.accuracy,
            last.completed_at.format("%Y-%m-%d %H:%M")
        )));
    }
    Some(lines)
}

fn header(cells: &[&'static str]) -> Row<'static> {
    Row::new(cells.iter().map(|c| Cell::from(*c)).collect::<Vec<_>>()).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )
}

/// Render the achievements screen
pub fn render_achievements(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = layout(area);
    let achievements = &app.game.profile().achievements;
    let unlocked = achievements.iter().filter(|a| a.unlocked).count();

    render_title(
        format!("Achievements ({unlocked}/{})", achievements.len()),
        chunks[0],
        buf,
    );

    let now = Local::now();
    let rows: Vec<Row> = achievements
        .iter()
        .map(|a| present_achievement(a, now))
        .collect();
    let widths = [
        Constraint::Length(3),
        Constraint::Length(18),
        Constraint::Min(20),
        Constraint::Length(24),
    ];
    Table::new(rows, widths)
        .header(header(&["", "Name", "Description", "Status"]))
        .block(Block::default().borders(Borders::ALL).title("Achievements"))
        .column_spacing(2)
        .render(chunks[1], buf);

    let profile = app.game.profile();
    Paragraph::new(format!(
        "{} songs completed   level {}   longest streak {}   best combo {}",
        profile.completed_sessions,
        profile.level(),
        profile.max_streak,
        profile.max_combo
    ))
    .style(Style::default().fg(Color::Gray))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks[2], buf);

    render_instructions(app, chunks[3], buf);
}

/// Render the high score table, with lifetime history figures underneath
pub fn render_high_scores(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = layout(area);
    render_title("High Scores".to_string(), chunks[0], buf);

    let scores = app.game.profile().high_scores.entries();
    if scores.is_empty() {
        Paragraph::new("No high scores yet. Finish a song to set one.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray))
            .render(chunks[1], buf);
    } else {
        let rows: Vec<Row> = scores
            .iter()
            .enumerate()
            .map(|(rank, entry)| present_high_score(rank, entry))
            .collect();
        let widths = [
            Constraint::Length(4),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Min(16),
        ];
        Table::new(rows, widths)
            .header(header(&["Rank", "WPM", "Acc", "Mode", "Points", "Date"]))
            .block(Block::default().borders(Borders::ALL).title("Top 10"))
            .column_spacing(2)
            .render(chunks[1], buf);
    }

    if let Some(lines) = app.game.history().and_then(history_lines) {
        Paragraph::new(lines)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
    }

    render_instructions(app, chunks[3], buf);
}
