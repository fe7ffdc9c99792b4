use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};

use crate::stats::session_accuracy;
use crate::App;

pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(super::HORIZONTAL_MARGIN)
        .vertical_margin(super::VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    let aggregate = &app.aggregate;
    let (score, time, accuracy) = if aggregate.total_sessions == 0 {
        ("N/A".to_string(), "N/A".to_string(), "N/A".to_string())
    } else {
        (
            format!("{:.1}", aggregate.avg_score),
            format!("{:.1}s", aggregate.avg_time),
            format!("{:.1}%", aggregate.avg_accuracy),
        )
    };

    super::render_tiles(
        &[
            ("Total Sessions", aggregate.total_sessions.to_string()),
            ("Average Score", score),
            ("Average Time", time),
            ("Average Accuracy", accuracy),
        ],
        chunks[0],
        buf,
    );

    if app.sessions.is_empty() {
        let no_data = Paragraph::new("No typing sessions recorded yet.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        no_data.render(chunks[1], buf);
    } else {
        let header = Row::new(vec![
            Cell::from("When"),
            Cell::from("Score"),
            Cell::from("Time"),
            Cell::from("Keys"),
            Cell::from("Miss"),
            Cell::from("Accuracy"),
            Cell::from("Section"),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let table_height = chunks[1].height.saturating_sub(3) as usize;
        // Newest first, with the scroll offset clamped by the key handler.
        let rows: Vec<Row> = app
            .sessions
            .iter()
            .rev()
            .skip(app.history_scroll)
            .take(table_height)
            .map(|session| {
                let (score, time, keys, miss, acc) = match &session.result {
                    Some(result) => (
                        result.score.to_string(),
                        format!("{:.1}s", result.time),
                        result.total_keystrokes.to_string(),
                        result.mistakes.to_string(),
                        format!("{:.1}%", session_accuracy(result)),
                    ),
                    None => (
                        "-".to_string(),
                        "-".to_string(),
                        "-".to_string(),
                        "-".to_string(),
                        "-".to_string(),
                    ),
                };
                Row::new(vec![
                    Cell::from(super::relative_date(session.start_time)),
                    Cell::from(score).style(Style::default().add_modifier(Modifier::BOLD)),
                    Cell::from(time),
                    Cell::from(keys),
                    Cell::from(miss),
                    Cell::from(acc),
                    Cell::from(session.section.clone().unwrap_or_else(|| "-".to_string())),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(18),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Min(10),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Sessions ({})", app.sessions.len())),
            )
            .column_spacing(2);

        table.render(chunks[1], buf);
    }

    super::render_legend(
        "(↑/↓) scroll  (r)efresh  (e)mail report  (d)ashboard  (c)lear  (esc) home",
        chunks[2],
        buf,
    );
}
