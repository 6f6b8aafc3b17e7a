use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::models::Quiz;

use super::format_clock;

pub fn render(frame: &mut Frame, area: Rect, quiz: &Quiz) {
    let chunks = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(12),
        Constraint::Fill(1),
    ])
    .split(area);

    let time_limit = match quiz.time_limit() {
        Some(limit) => format!("{} limit", format_clock(limit)),
        None => "No time limit".to_string(),
    };
    let dim = Style::default().fg(Color::DarkGray);
    let timed_questions = quiz
        .questions
        .iter()
        .filter(|q| q.time_limit().is_some())
        .count();

    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            quiz.title.to_uppercase(),
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("{} Questions · {}", quiz.total_questions(), time_limit),
            dim,
        )),
    ];
    if timed_questions > 0 {
        content.push(Line::from(Span::styled(
            format!("{} timed question(s) advance automatically", timed_questions),
            dim,
        )));
    }
    if let Some(score) = quiz.passing_score {
        content.push(Line::from(Span::styled(format!("Pass mark {}%", score), dim)));
    }
    if let Some(description) = &quiz.description {
        content.push(Line::from(""));
        content.push(Line::from(description.as_str().fg(Color::Gray)));
    }
    content.extend([
        Line::from(""),
        Line::from(Span::styled(
            "ENTER",
            Style::default().fg(Color::Green).bold(),
        )),
        Line::from("to start  ·  q to quit".fg(Color::DarkGray)),
    ]);

    let widget = Paragraph::new(content)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Color::DarkGray),
        );

    frame.render_widget(widget, chunks[1]);
}
