use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::{App, HOME_ENTRIES};

pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(super::HORIZONTAL_MARGIN)
        .vertical_margin(super::VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Length(4),
                Constraint::Min(HOME_ENTRIES.len() as u16),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            "taipu",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "terminal typing tracker",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ])
    .alignment(Alignment::Center);
    title.render(chunks[0], buf);

    let entries: Vec<Line> = HOME_ENTRIES
        .iter()
        .enumerate()
        .map(|(idx, (_, label))| {
            let text = format!("{} {label}", idx + 1);
            if idx == app.home_index {
                Line::from(Span::styled(
                    format!("> {text}"),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(Span::raw(format!("  {text}")))
            }
        })
        .collect();

    Paragraph::new(entries)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    super::render_legend("(↑/↓) select  (enter) open  (1-5) jump  (q) quit", chunks[2], buf);
}
