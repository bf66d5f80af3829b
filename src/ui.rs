pub mod charting;
pub mod records;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthChar;

use lyrictype::{feedback::SoundKind, lyrics::split_artist_title, Mode};

use crate::{App, AppState};
use screen::current_screen;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const PROMPT_ROWS: u16 = 4;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

/// Split styled characters into rows no wider than `width` cells
fn wrap_chars(chars: Vec<(char, Style)>, width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut row: Vec<Span> = Vec::new();
    let mut used = 0;

    for (c, style) in chars {
        let w = c.width().unwrap_or(0);
        if used + w > width && !row.is_empty() {
            rows.push(Line::from(std::mem::take(&mut row)));
            used = 0;
        }
        row.push(Span::styled(c.to_string(), style));
        used += w;
    }
    if !row.is_empty() {
        rows.push(Line::from(row));
    }
    rows
}

/// Styled prompt rows and the row holding the cursor
pub fn prompt_lines(target: &str, typed: &str, width: usize) -> (Vec<Line<'static>>, usize) {
    let green = bold().fg(Color::Green);
    let red = bold().fg(Color::Red);
    let dim = bold().add_modifier(Modifier::DIM);
    let cursor = dim.add_modifier(Modifier::UNDERLINED);

    let typed: Vec<char> = typed.chars().collect();
    let mut cursor_cell = 0;
    let mut cells = 0;
    let chars: Vec<(char, Style)> = target
        .chars()
        .enumerate()
        .map(|(idx, expected)| {
            let styled = match typed.get(idx) {
                Some(&c) if c == expected => (expected, green),
                Some(&' ') => ('·', red),
                Some(&c) => (c, red),
                None if idx == typed.len() => {
                    cursor_cell = cells;
                    (expected, cursor)
                }
                None => (expected, dim),
            };
            cells += styled.0.width().unwrap_or(0);
            styled
        })
        .collect();

    let rows = wrap_chars(chars, width);
    let cursor_row = if width == 0 { 0 } else { cursor_cell / width };
    let last_row = rows.len().saturating_sub(1);
    (rows, cursor_row.min(last_row))
}

/// Song name first, artist after it when the title names one
fn title_spans(title: &str) -> Vec<Span<'static>> {
    let (artist, song) = split_artist_title(title, None);
    let mut spans = vec![Span::styled(song.clone(), bold().fg(Color::Cyan))];
    if artist != song {
        spans.push(Span::styled(
            format!(" by {artist}"),
            Style::default().add_modifier(Modifier::ITALIC),
        ));
    }
    spans
}

fn sound_marker(kind: SoundKind) -> Span<'static> {
    let color = match kind {
        SoundKind::Correct => Color::Green,
        SoundKind::Error => Color::Red,
        SoundKind::Combo => Color::Magenta,
        SoundKind::Achievement | SoundKind::LevelUp => Color::Yellow,
    };
    Span::styled(" ♪", Style::default().fg(color))
}

impl App {
    fn render_typing(&self, area: Rect, buf: &mut Buffer) {
        let session = self.game.session();
        let profile = self.game.profile();
        let metrics = session.metrics();
        let combo = session.combo();
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(1)
            .constraints([
                Constraint::Length(1),           // title
                Constraint::Length(1),           // stats
                Constraint::Min(1),              // padding
                Constraint::Length(2),           // current lyric
                Constraint::Length(PROMPT_ROWS), // prompt
                Constraint::Min(1),              // padding
                Constraint::Length(1),           // banner
                Constraint::Length(1),           // footer
                Constraint::Length(1),           // legend
            ])
            .split(area);

        let mut title = title_spans(session.title());
        title.push(Span::styled(
            format!("  [{} / {}]", session.mode(), profile.difficulty),
            dim_style,
        ));
        if let Some(sound) = self.last_sound {
            title.push(sound_marker(sound.kind));
        }
        Paragraph::new(Line::from(title))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let stats = format!(
            "{} wpm   {}% acc   {:.0}s   combo {} (x{})",
            metrics.wpm, metrics.accuracy, metrics.elapsed_seconds, combo.combo, combo.multiplier
        );
        Paragraph::new(Span::styled(stats, bold()))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        if session.mode() == Mode::Lyrics {
            let lines = session.lyric_lines();
            let lyric = match session.current_lyric() {
                Some(line) => vec![
                    Line::from(Span::styled(
                        line.text.clone(),
                        italic_style.fg(Color::Magenta),
                    )),
                    Line::from(Span::styled(
                        format!(
                            "line {}/{}   {:.0}s",
                            session.current_lyric_index() + 1,
                            lines.len(),
                            session.playback_time()
                        ),
                        dim_style,
                    )),
                ],
                None => vec![Line::from(Span::styled("waiting for the song...", dim_style))],
            };
            Paragraph::new(lyric)
                .alignment(Alignment::Center)
                .render(chunks[3], buf);
        }

        let width = chunks[4].width as usize;
        let (rows, cursor_row) = prompt_lines(session.target(), session.typed(), width);
        let first = cursor_row.saturating_sub(1);
        let visible: Vec<Line> = rows
            .into_iter()
            .skip(first)
            .take(PROMPT_ROWS as usize)
            .collect();
        let single_row = visible.len() == 1;
        Paragraph::new(visible)
            .alignment(if single_row {
                Alignment::Center
            } else {
                Alignment::Left
            })
            .render(chunks[4], buf);

        let notice = match (&self.banner, session.advisory()) {
            (Some(banner), _) => Some(Span::styled(
                banner.text.clone(),
                bold().fg(Color::Yellow),
            )),
            (None, Some(advisory)) => Some(Span::styled(
                advisory.to_string(),
                italic_style.fg(Color::Gray),
            )),
            (None, None) => None,
        };
        if let Some(notice) = notice {
            Paragraph::new(notice)
                .alignment(Alignment::Center)
                .render(chunks[6], buf);
        }

        let footer = format!(
            "level {}   {} points   streak {}   best combo {}",
            profile.level(),
            profile.points(),
            combo.streak,
            profile.max_combo.max(combo.max_combo)
        );
        Paragraph::new(Span::styled(footer, Style::default().fg(Color::Cyan)))
            .alignment(Alignment::Center)
            .render(chunks[7], buf);

        Paragraph::new(Span::styled(
            current_screen(self.state).legend(),
            italic_style,
        ))
        .render(chunks[8], buf);
    }

    fn render_results(&self, area: Rect, buf: &mut Buffer) {
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);
        let magenta_style = Style::default().fg(Color::Magenta);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(1),    // chart
                Constraint::Length(1), // stats
                Constraint::Length(1), // progress
                Constraint::Length(2), // unlocks
                Constraint::Length(1), // padding
                Constraint::Length(1), // legend
            ])
            .split(area);

        let Some(result) = self.game.last_result() else {
            Paragraph::new("No finished run yet")
                .alignment(Alignment::Center)
                .render(chunks[0], buf);
            return;
        };
        let summary = &result.summary;

        let tuples: Vec<(f64, f64)> = summary.wpm_samples.iter().copied().map(Into::into).collect();
        let (overall_duration, highest_wpm) =
            charting::compute_chart_params(&tuples, Some(summary.elapsed_seconds));
        let datasets = vec![Dataset::default()
            .marker(ratatui::symbols::Marker::Braille)
            .style(magenta_style)
            .graph_type(GraphType::Line)
            .data(&tuples)];

        Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .title("seconds")
                    .bounds([0.0, overall_duration])
                    .labels(vec![
                        Span::styled("0", bold()),
                        Span::styled(charting::format_label(overall_duration), bold()),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title("wpm")
                    .bounds([0.0, highest_wpm.max(1.0)])
                    .labels(vec![
                        Span::styled("0", bold()),
                        Span::styled(charting::format_label(highest_wpm), bold()),
                    ]),
            )
            .render(chunks[0], buf);

        let stats = format!(
            "{} wpm   {}% acc   {} errors   {:.1}s",
            summary.wpm, summary.accuracy, summary.errors, summary.elapsed_seconds
        );
        Paragraph::new(Span::styled(stats, bold()))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        let progress = format!(
            "+{} points   max combo {}   level {}",
            summary.points,
            summary.max_combo,
            self.game.profile().level()
        );
        Paragraph::new(Span::styled(
            progress,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        if !result.unlocked.is_empty() {
            let unlocked = result
                .unlocked
                .iter()
                .map(|a| format!("{} {}", a.icon, a.name))
                .collect::<Vec<_>>()
                .join("   ");
            Paragraph::new(Span::styled(
                format!("New achievements: {unlocked}"),
                bold().fg(Color::Yellow),
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[3], buf);
        }

        Paragraph::new(Span::styled(
            current_screen(self.state).legend(),
            italic_style,
        ))
        .render(chunks[5], buf);
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Typing => self.render_typing(area, buf),
            AppState::Results => self.render_results(area, buf),
            AppState::Achievements => records::render_achievements(self, area, buf),
            AppState::HighScores => records::render_high_scores(self, area, buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_prompt_lines_wrap_and_cursor() {
        let (rows, cursor_row) = prompt_lines("abcdefghij", "abcdef", 4);

        assert_eq!(rows.len(), 3);
        assert_eq!(row_text(&rows[0]), "abcd");
        assert_eq!(row_text(&rows[2]), "ij");
        assert_eq!(cursor_row, 1);
    }

    #[test]
    fn test_prompt_lines_marks_errors() {
        let (rows, _) = prompt_lines("a b", "x ", 10);
        let spans = &rows[0].spans;

        assert_eq!(spans[0].content, "x");
        assert_eq!(spans[0].style.fg, Some(Color::Red));
        assert_eq!(spans[1].style.fg, Some(Color::Green));
        assert!(spans[2].style.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn test_title_puts_song_first() {
        let spans = title_spans("Queen - Bohemian Rhapsody");
        assert_eq!(row_text(&Line::from(spans)), "Bohemian Rhapsody by Queen");

        let spans = title_spans("Practice");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "Practice");
    }

    #[test]
    fn test_prompt_lines_space_error_is_visible() {
        let (rows, _) = prompt_lines("ab", " ", 10);
        assert_eq!(rows[0].spans[0].content, "·");
    }
}
