use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph},
};

use crate::app::App;
use crate::engine::Delivery;
use crate::grading::{GradeReport, Verdict};
use crate::submission::AttemptSink;

use super::format_clock;

const QUESTION_PREVIEW_LENGTH: usize = 55;

pub fn render<S: AttemptSink>(frame: &mut Frame, area: Rect, app: &App<S>) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(7),
        Constraint::Fill(1),
        Constraint::Length(2),
    ])
    .margin(1)
    .split(area);

    render_summary(frame, chunks[1], app);
    render_question_breakdown(frame, chunks[2], app);
    render_controls(frame, chunks[3], app.delivery() == Some(Delivery::Failed));
}

fn get_grade_color(percentage: f64) -> Color {
    match percentage as u32 {
        90..=100 => Color::Green,
        70..=89 => Color::Cyan,
        50..=69 => Color::Yellow,
        _ => Color::Red,
    }
}

fn render_summary<S: AttemptSink>(frame: &mut Frame, area: Rect, app: &App<S>) {
    let time_spent = app
        .runner()
        .and_then(|runner| runner.submission())
        .map(|payload| format_clock(payload.time_spent_seconds))
        .unwrap_or_else(|| "--:--".to_string());

    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "SUBMITTED",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(format!("Time spent {}", time_spent).fg(Color::DarkGray)),
    ];

    if let Some(report) = app.grade() {
        content.push(score_line(report));
    } else {
        content.push(Line::from(""));
    }

    content.push(delivery_line(app.delivery(), app.delivery_error()));

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, area);
}

fn score_line(report: &GradeReport) -> Line<'static> {
    let verdict = match report.passed {
        Some(true) => "  PASSED",
        Some(false) => "  NOT PASSED",
        None => "",
    };
    Line::from(Span::styled(
        format!(
            "{} / {}  ({:.0}%){}",
            report.correct, report.gradable, report.percentage, verdict
        ),
        Style::default()
            .fg(get_grade_color(report.percentage))
            .bold(),
    ))
}

fn delivery_line(delivery: Option<Delivery>, error: Option<&str>) -> Line<'static> {
    match (delivery, error) {
        (Some(Delivery::Failed), Some(error)) => Line::from(Span::styled(
            format!("Delivery failed: {}", error),
            Style::default().fg(Color::Red),
        )),
        (Some(Delivery::Delivered), _) => Line::from("Answers saved".fg(Color::Green)),
        _ => Line::from("Saving answers...".fg(Color::DarkGray)),
    }
}

fn render_question_breakdown<S: AttemptSink>(frame: &mut Frame, area: Rect, app: &App<S>) {
    let verdicts = app.grade().map(|report| report.verdicts.as_slice());
    let Some(session) = app.session() else {
        return;
    };

    let lines: Vec<Line> = session
        .questions()
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let verdict = verdicts
                .and_then(|v| v.get(index).copied())
                .unwrap_or(Verdict::Ungraded);
            let (symbol, color) = match verdict {
                Verdict::Correct => ("+", Color::Green),
                Verdict::Incorrect => ("-", Color::Red),
                Verdict::Ungraded => ("·", Color::DarkGray),
            };
            let picked = session
                .answers_for(index)
                .map(|set| set.len())
                .unwrap_or(0);

            Line::from(vec![
                Span::styled(format!(" {} ", symbol), Style::default().fg(color)),
                Span::styled(
                    format!("{:2}. ", index + 1),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(truncate_question(&question.text), Style::default().fg(Color::Gray)),
                Span::styled(
                    format!("  ({} selected)", picked),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();

    let widget = Paragraph::new(lines)
        .block(Block::default().padding(Padding::horizontal(1)))
        .scroll((app.result_scroll() as u16, 0));
    frame.render_widget(widget, area);
}

fn truncate_question(text: &str) -> String {
    let char_count = text.chars().count();
    if char_count > QUESTION_PREVIEW_LENGTH {
        let truncated: String = text.chars().take(QUESTION_PREVIEW_LENGTH).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}

fn render_controls(frame: &mut Frame, area: Rect, can_redeliver: bool) {
    let text = if can_redeliver {
        "j/k scroll  ·  d retry delivery  ·  r restart  ·  q quit"
    } else {
        "j/k scroll  ·  r restart  ·  q quit"
    };
    let widget = Paragraph::new(text)
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
