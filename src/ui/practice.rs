use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::practice::Outcome;
use crate::App;

pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let drill = &app.drill;

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);
    let underlined_dim_bold_style = Style::default()
        .patch(dim_bold_style)
        .add_modifier(Modifier::UNDERLINED);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    if drill.has_finished() {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(super::HORIZONTAL_MARGIN)
            .vertical_margin(super::VERTICAL_MARGIN)
            .constraints(
                [
                    Constraint::Min(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                ]
                .as_ref(),
            )
            .split(area);

        let stats = Paragraph::new(Span::styled(
            format!(
                "{} wpm   {}% acc   {:.1}s",
                drill.wpm(),
                drill.accuracy(),
                drill.elapsed_secs()
            ),
            bold_style,
        ))
        .alignment(Alignment::Center);
        stats.render(chunks[1], buf);

        let legend = Paragraph::new(Span::styled(
            "(r)etry / (n)ew text / (s)tats / (esc) home",
            italic_style,
        ))
        .alignment(Alignment::Center);
        legend.render(chunks[3], buf);
        return;
    }

    let max_chars_per_line = area.width.saturating_sub(super::HORIZONTAL_MARGIN * 2).max(1);
    let mut prompt_occupied_lines =
        ((drill.prompt.width() as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16;

    if drill.prompt.width() <= max_chars_per_line as usize {
        prompt_occupied_lines = 1;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(super::HORIZONTAL_MARGIN)
        .constraints(
            [
                Constraint::Length(
                    ((area.height as f64 - prompt_occupied_lines as f64) / 2.0) as u16,
                ),
                Constraint::Length(2),
                Constraint::Length(prompt_occupied_lines),
                Constraint::Length(
                    ((area.height as f64 - prompt_occupied_lines as f64) / 2.0) as u16,
                ),
            ]
            .as_ref(),
        )
        .split(area);

    let mut spans = drill
        .input
        .iter()
        .enumerate()
        .map(|(idx, input)| match input.outcome {
            Outcome::Incorrect => Span::styled(
                match input.char {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                red_bold_style,
            ),
            Outcome::Correct => Span::styled(drill.expected_char(idx).to_string(), green_bold_style),
        })
        .collect::<Vec<Span>>();

    spans.push(Span::styled(
        drill.expected_char(drill.cursor_pos()).to_string(),
        underlined_dim_bold_style,
    ));

    let remainder: String = drill.prompt.chars().skip(drill.cursor_pos() + 1).collect();
    spans.push(Span::styled(remainder, dim_bold_style));

    let widget = Paragraph::new(Line::from(spans))
        .alignment(if prompt_occupied_lines == 1 {
            // when the prompt is small enough to fit on one line
            // centering the text gives a nice zen feeling
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true });

    widget.render(chunks[2], buf);

    if drill.has_started() {
        let timer = Paragraph::new(Span::styled(
            format!("{:.1}", drill.elapsed_secs()),
            dim_bold_style,
        ))
        .alignment(Alignment::Center);

        timer.render(chunks[1], buf);
    }
}
