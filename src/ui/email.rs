use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::{App, EmailField};

pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(super::HORIZONTAL_MARGIN)
        .vertical_margin(super::VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(EmailField::ALL.len() as u16),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    let intro = Paragraph::new(vec![
        Line::from(Span::styled(
            "Email Settings",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Reports go out through EmailJS; keys live on your EmailJS dashboard.",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ])
    .alignment(Alignment::Center);
    intro.render(chunks[0], buf);

    let fields: Vec<Line> = EmailField::ALL
        .iter()
        .map(|field| {
            let selected = *field == app.email_field;
            let marker = if selected { "> " } else { "  " };
            let label_style = if selected {
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let value = app.email_field_value(*field);
            let value_span = if value.is_empty() {
                Span::styled(
                    "(not set)".to_string(),
                    Style::default().add_modifier(Modifier::DIM),
                )
            } else {
                Span::styled(
                    value.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                )
            };
            Line::from(vec![
                Span::styled(
                    format!("{marker}{:<22}", format!("{}:", field.label())),
                    label_style,
                ),
                value_span,
            ])
        })
        .collect();

    Paragraph::new(fields).render(chunks[1], buf);

    super::render_legend("(↑/↓) field  (enter) save  (esc) home", chunks[2], buf);
}
