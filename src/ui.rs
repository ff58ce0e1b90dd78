use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::{App, TextStatus},
    difficulty::Difficulty,
    metrics::CharStatus,
    session::TypingSession,
};

const HORIZONTAL_MARGIN: u16 = 5;
const STATUS_LINES: u16 = 3;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    bold().add_modifier(Modifier::DIM)
}

fn style_for(status: CharStatus) -> Style {
    match status {
        CharStatus::Correct => bold().fg(Color::Green),
        CharStatus::Incorrect => bold().fg(Color::Red),
        CharStatus::Cursor => dim().add_modifier(Modifier::UNDERLINED | Modifier::REVERSED),
        CharStatus::Pending => dim(),
    }
}

/// Reference text as spans, one span per run of equal status.
pub fn prompt_spans(session: &TypingSession) -> Vec<Span<'static>> {
    let snapshot = session.snapshot();
    let runs = session
        .reference()
        .iter()
        .enumerate()
        .chunk_by(|(idx, _)| snapshot.character_status(*idx));

    let mut spans = Vec::new();
    for (status, run) in &runs {
        let text: String = run
            // a mistyped space would otherwise be invisible
            .map(|(_, &c)| {
                if status == CharStatus::Incorrect && c == ' ' {
                    '·'
                } else {
                    c
                }
            })
            .collect();
        spans.push(Span::styled(text, style_for(status)));
    }
    spans
}

fn difficulty_span(difficulty: Difficulty, locked: bool) -> Span<'static> {
    let style = match difficulty {
        Difficulty::Death => bold().fg(Color::Red),
        _ => bold(),
    };
    let style = if locked {
        style.add_modifier(Modifier::DIM)
    } else {
        style
    };
    let label = if locked {
        format!("  {difficulty}  ")
    } else {
        format!("◀ {difficulty} ▶")
    };
    Span::styled(label, style)
}

fn status_line(app: &App) -> Line<'static> {
    let session = &app.session;
    let separator = Span::styled("  |  ", dim());

    let mut spans = vec![
        Span::styled("English", dim()),
        separator.clone(),
        difficulty_span(app.selected_difficulty, session.has_started()),
        separator.clone(),
    ];

    if session.has_started() {
        let metrics = session.metrics();
        spans.push(Span::styled(format!("WPM: {}", metrics.wpm), bold()));
        spans.push(separator.clone());
        spans.push(Span::styled(
            format!("Accuracy: {}%", metrics.accuracy),
            bold(),
        ));
        spans.push(separator);
        spans.push(Span::styled("tab reset", dim()));
    } else {
        spans.push(Span::styled("Get Set Go!", bold()));
    }

    Line::from(spans)
}

fn hint_line(app: &App) -> Line<'static> {
    let text = match &app.status {
        TextStatus::Unavailable(error) => {
            return Line::from(Span::styled(
                format!("text unavailable: {error}  (enter to retry)"),
                Style::default().fg(Color::Yellow),
            ))
        }
        _ if app.session.is_complete() => "done!  tab to retry  ·  enter for new text",
        _ if app.session.has_started() => "",
        _ => "←/→ difficulty  ·  enter new text  ·  esc quit",
    };
    Line::from(Span::styled(text, Style::default().add_modifier(Modifier::ITALIC)))
}

fn render_prompt(app: &App, area: Rect, buf: &mut Buffer) {
    let message = match &app.status {
        TextStatus::Loading => Some("Loading..."),
        TextStatus::Unavailable(_) if !app.session.has_text() => Some("No text available"),
        _ if !app.session.has_text() => Some("The word source returned no text"),
        _ => None,
    };

    if let Some(message) = message {
        Paragraph::new(Span::styled(message, bold().fg(Color::Gray)))
            .alignment(Alignment::Center)
            .render(area, buf);
        return;
    }

    // when the prompt fits on one line centering it gives a nice zen feeling
    let fits_one_line = app.session.reference_text().width() <= area.width as usize;

    Paragraph::new(Line::from(prompt_spans(&app.session)))
        .alignment(if fits_one_line {
            Alignment::Center
        } else {
            Alignment::Left
        })
        // trimming would drop the cursor when it sits on a space at a wrap point
        .wrap(Wrap { trim: false })
        .render(area, buf);
}

fn render_unfocused_overlay(area: Rect, buf: &mut Buffer) {
    let width = area.width.min(48);
    let height = area.height.min(3);
    let overlay = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );

    Clear.render(overlay, buf);
    Paragraph::new(Span::styled(
        "focus lost - click or press any key to resume",
        bold().fg(Color::Yellow),
    ))
    .alignment(Alignment::Center)
    .block(Block::bordered())
    .render(overlay, buf);
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let text_width = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
        let prompt_lines = ((self.session.reference_text().width() as f64 / text_width as f64)
            .ceil() as u16)
            .clamp(1, area.height.saturating_sub(STATUS_LINES).max(1));
        let padding = area.height.saturating_sub(prompt_lines + STATUS_LINES) / 2;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(padding),
                Constraint::Length(prompt_lines),
                Constraint::Length(1), // spacer
                Constraint::Length(1), // status
                Constraint::Length(1), // hint
                Constraint::Min(0),
            ])
            .split(area);

        render_prompt(self, chunks[1], buf);

        Paragraph::new(status_line(self))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        Paragraph::new(hint_line(self))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);

        if !self.focused {
            render_unfocused_overlay(area, buf);
        }
    }
}
