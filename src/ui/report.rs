use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{BarChart, Block, Borders, Paragraph, Widget},
};

use crate::App;

pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(super::HORIZONTAL_MARGIN)
        .vertical_margin(super::VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    let filter_line = Paragraph::new(Span::styled(
        format!("Showing {}", app.range),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    filter_line.render(chunks[0], buf);

    let aggregate = &app.report_aggregate;
    let (score, accuracy) = if aggregate.total_sessions == 0 {
        ("N/A".to_string(), "N/A".to_string())
    } else {
        (
            format!("{:.1}", aggregate.avg_score),
            format!("{:.1}%", aggregate.avg_accuracy),
        )
    };

    super::render_tiles(
        &[
            ("Sessions", aggregate.total_sessions.to_string()),
            ("Average Score", score),
            ("Average Accuracy", accuracy),
        ],
        chunks[1],
        buf,
    );

    if app.report_counts.is_empty() {
        let no_data = Paragraph::new("No sessions in this range.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        no_data.render(chunks[2], buf);
    } else {
        let data: Vec<(&str, u64)> = app
            .report_counts
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
            .collect();

        let chart = BarChart::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Sessions per day"),
            )
            .data(&data)
            .bar_width(5)
            .bar_gap(1)
            .bar_style(Style::default().fg(Color::Magenta))
            .value_style(Style::default().add_modifier(Modifier::BOLD));

        chart.render(chunks[2], buf);
    }

    super::render_legend(
        "(f) change range  (e)xport csv  (r)efresh  (esc) home",
        chunks[3],
        buf,
    );
}
