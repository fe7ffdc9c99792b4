use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};

use crate::App;

pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let stats = &app.practice_stats;

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

    super::render_tiles(
        &[
            ("Average WPM", stats.average_wpm.to_string()),
            ("Average Accuracy", format!("{}%", stats.average_accuracy)),
            ("Best WPM", stats.best_wpm.to_string()),
            ("Best Accuracy", format!("{}%", stats.best_accuracy)),
        ],
        chunks[0],
        buf,
    );

    if stats.results.is_empty() {
        let no_data = Paragraph::new("No practice results yet. Run a drill to collect stats.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        no_data.render(chunks[1], buf);
    } else {
        let header = Row::new(vec![
            Cell::from("When"),
            Cell::from("WPM"),
            Cell::from("Accuracy"),
            Cell::from("Text"),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let table_height = chunks[1].height.saturating_sub(3) as usize;
        let rows: Vec<Row> = stats
            .results
            .iter()
            .rev()
            .take(table_height)
            .map(|result| {
                Row::new(vec![
                    Cell::from(super::relative_date(result.date)),
                    Cell::from(result.wpm.to_string())
                        .style(Style::default().add_modifier(Modifier::BOLD)),
                    Cell::from(format!("{}%", result.accuracy)),
                    Cell::from(truncate(&result.text, 40)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(18),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Min(20),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Recent Practices ({} total)",
                stats.total_practices
            )))
            .column_spacing(2);

        table.render(chunks[1], buf);
    }

    super::render_legend("(p) practice  (c) clear stats  (b/esc) home", chunks[2], buf);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{practice_aggregate, PracticeResult};
    use crate::store::Store;
    use crate::Screen;
    use chrono::Utc;
    use ratatui::{buffer::Buffer, layout::Rect};

    fn render_stats(app: &App) -> String {
        let area = Rect::new(0, 0, 100, 30);
        let mut buffer = Buffer::empty(area);
        render(app, area, &mut buffer);
        buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    fn test_app() -> App {
        App::new(
            Store::open_in_memory().unwrap(),
            vec!["ab".to_string()],
            Screen::PracticeStats,
        )
    }

    #[test]
    fn empty_stats_show_placeholder() {
        let app = test_app();

        let rendered = render_stats(&app);

        assert!(rendered.contains("Average WPM"));
        assert!(rendered.contains("No practice results yet"));
    }

    #[test]
    fn results_fill_the_table() {
        let mut app = test_app();
        app.practice_stats = practice_aggregate(vec![
            PracticeResult {
                date: Utc::now(),
                wpm: 41,
                accuracy: 92,
                text: "the quick brown fox".to_string(),
            },
            PracticeResult {
                date: Utc::now(),
                wpm: 63,
                accuracy: 88,
                text: "pack my box".to_string(),
            },
        ]);

        let rendered = render_stats(&app);

        assert!(rendered.contains("Recent Practices (2 total)"));
        assert!(rendered.contains("63"));
        assert!(rendered.contains("pack my box"));
    }

    #[test]
    fn long_texts_are_truncated() {
        assert_eq!(truncate("short", 40), "short");

        let long = "x".repeat(60);
        let cut = truncate(&long, 40);
        assert_eq!(cut.chars().count(), 40);
        assert!(cut.ends_with('…'));
    }
}
