pub mod email;
pub mod history;
pub mod home;
pub mod practice;
pub mod practice_stats;
pub mod report;

use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use time_humanize::HumanTime;

use crate::{App, Screen};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // The bottom row is reserved for banners and confirmation prompts.
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)].as_ref())
            .split(area);

        match self.screen {
            Screen::Home => home::render(self, chunks[0], buf),
            Screen::Practice => practice::render(self, chunks[0], buf),
            Screen::PracticeStats => practice_stats::render(self, chunks[0], buf),
            Screen::History => history::render(self, chunks[0], buf),
            Screen::Report => report::render(self, chunks[0], buf),
            Screen::Email => email::render(self, chunks[0], buf),
        }

        render_status_line(self, chunks[1], buf);
    }
}

/// A pending confirmation wins over a transient banner.
fn render_status_line(app: &App, area: Rect, buf: &mut Buffer) {
    let (text, style) = if let Some(message) = app.confirm_message() {
        (
            message.to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    } else if let Some(text) = app.banner_text() {
        (
            text.to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::ITALIC),
        )
    } else {
        return;
    };

    Paragraph::new(Span::styled(text, style))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

/// Evenly split row of bordered stat tiles.
pub(crate) fn render_tiles(tiles: &[(&str, String)], area: Rect, buf: &mut Buffer) {
    if tiles.is_empty() {
        return;
    }
    let constraints = vec![Constraint::Ratio(1, tiles.len() as u32); tiles.len()];
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (chunk, (label, value)) in chunks.iter().zip(tiles) {
        let tile = Paragraph::new(Span::styled(
            value.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .block(Block::default().borders(Borders::ALL).title(*label))
        .alignment(Alignment::Center);
        tile.render(*chunk, buf);
    }
}

pub(crate) fn render_legend(text: &str, area: Rect, buf: &mut Buffer) {
    Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

/// "2 hours ago" style label for a session timestamp.
pub(crate) fn relative_date(when: DateTime<Utc>) -> String {
    let secs = (Utc::now() - when).num_seconds();
    HumanTime::from(-secs).to_string()
}
