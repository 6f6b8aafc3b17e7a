use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
};

use crate::app::App;
use crate::engine::QuizSession;
use crate::models::{QuestionKind, QuestionOption};
use crate::submission::AttemptSink;

use super::format_clock;

pub fn render<S: AttemptSink>(frame: &mut Frame, area: Rect, app: &App<S>) {
    let Some(session) = app.session() else {
        return;
    };
    let question = session.current_question();
    let chunks = create_layout(area, question.code.is_some());

    render_status(frame, chunks[0], session);
    render_question_text(frame, chunks[1], &question.text);

    let mut next = 2;
    if let Some(code) = &question.code {
        render_code_block(frame, chunks[next], code);
        next += 1;
    }

    render_options(
        frame,
        chunks[next],
        session,
        &question.options,
        question.kind,
        app.cursor(),
    );
    render_notice(frame, chunks[next + 1], app.notice());
    render_controls(frame, chunks[next + 2], session);
}

fn create_layout(area: Rect, has_code: bool) -> std::rc::Rc<[Rect]> {
    if has_code {
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(8),
            Constraint::Length(10),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .margin(1)
        .split(area)
    } else {
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(4),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .margin(2)
        .split(area)
    }
}

fn render_status(frame: &mut Frame, area: Rect, session: &QuizSession) {
    let [clocks, progress] =
        Layout::horizontal([Constraint::Fill(1), Constraint::Length(12)]).areas(area);

    let quiz_clock = match session.quiz_remaining_seconds() {
        Some(remaining) => Span::styled(
            format!("Quiz {}", format_clock(remaining)),
            clock_style(remaining, session.quiz_time_up()),
        ),
        None => Span::styled(
            format!("Elapsed {}", format_clock(session.quiz_elapsed_seconds())),
            Style::default().fg(Color::DarkGray),
        ),
    };

    let mut spans = vec![quiz_clock];
    if let Some(remaining) = session.question_remaining_seconds() {
        let time_up = session.question_time_up();
        spans.push(Span::raw("  ·  ").fg(Color::DarkGray));
        spans.push(Span::styled(
            format!("Question {}", format_clock(remaining)),
            clock_style(remaining, time_up),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), clocks);

    let widget = Paragraph::new(format!(
        "{}/{}",
        session.current_question_index() + 1,
        session.total_questions()
    ))
    .alignment(Alignment::Right)
    .fg(Color::DarkGray);
    frame.render_widget(widget, progress);
}

fn clock_style(remaining: u64, time_up: bool) -> Style {
    match (time_up, remaining) {
        (true, _) => Style::default().fg(Color::Red).bold(),
        (false, 0..=10) => Style::default().fg(Color::Yellow),
        _ => Style::default().fg(Color::Gray),
    }
}

fn render_question_text(frame: &mut Frame, area: Rect, text: &str) {
    let widget = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .fg(Color::White)
        .bold();
    frame.render_widget(widget, area);
}

fn render_code_block(frame: &mut Frame, area: Rect, code: &str) {
    let code_lines: Vec<Line> = code
        .lines()
        .map(|line| Line::from(Span::styled(line, Style::default().fg(Color::Yellow))))
        .collect();

    let widget = Paragraph::new(code_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Color::DarkGray)
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(widget, area);
}

fn render_options(
    frame: &mut Frame,
    area: Rect,
    session: &QuizSession,
    options: &[QuestionOption],
    kind: QuestionKind,
    cursor: usize,
) {
    let index = session.current_question_index();
    let mut lines: Vec<Line> = Vec::with_capacity(options.len() * 2);

    for (position, option) in options.iter().enumerate() {
        let under_cursor = position == cursor;
        let chosen = session.is_selected(index, &option.id);
        let style = match (under_cursor, chosen) {
            (true, _) => Style::default().fg(Color::Cyan).bold(),
            (false, true) => Style::default().fg(Color::Green),
            (false, false) => Style::default().fg(Color::Gray),
        };
        let pointer = if under_cursor { ">" } else { " " };
        let marker = match (kind, chosen) {
            (QuestionKind::SingleChoice, true) => "(•)",
            (QuestionKind::SingleChoice, false) => "( )",
            (QuestionKind::MultipleChoice, true) => "[x]",
            (QuestionKind::MultipleChoice, false) => "[ ]",
        };

        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", pointer), style),
            Span::styled(format!("{} ", marker), style),
            Span::styled(option.text.as_str(), style),
        ]));
        lines.push(Line::from(""));
    }

    if kind == QuestionKind::MultipleChoice {
        lines.push(Line::from("Select all that apply".fg(Color::DarkGray)));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_notice(frame: &mut Frame, area: Rect, notice: Option<&str>) {
    if let Some(message) = notice {
        let widget = Paragraph::new(message)
            .alignment(Alignment::Center)
            .fg(Color::Red)
            .bold();
        frame.render_widget(widget, area);
    }
}

fn render_controls(frame: &mut Frame, area: Rect, session: &QuizSession) {
    let dim = Style::default().fg(Color::DarkGray);
    let submit = if session.can_submit() {
        Span::styled("s submit", Style::default().fg(Color::Green).bold())
    } else {
        Span::styled(
            format!("submit ({} unanswered)", session.unanswered().len()),
            dim.add_modifier(Modifier::CROSSED_OUT),
        )
    };

    let widget = Paragraph::new(Line::from(vec![
        Span::styled("j/k move  ·  space select  ·  p/n prev/next  ·  ", dim),
        submit,
        Span::styled("  ·  q exit", dim),
    ]))
    .alignment(Alignment::Center);
    frame.render_widget(widget, area);
}
