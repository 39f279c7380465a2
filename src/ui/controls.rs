//! Readiness indicator, sustain button, instructions, and volume slider.

use crate::app::App;
use crate::piano::KEY_BINDINGS;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Width of the sustain button including its border.
const SUSTAIN_BUTTON_WIDTH: u16 = 16;

/// Renders the readiness indicator, status message, and sustain button.
///
/// Returns the sustain button's area for hit testing.
pub fn render_controls(frame: &mut Frame, area: Rect, app: &App) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(18),                   // Readiness
            Constraint::Min(10),                      // Status message
            Constraint::Length(SUSTAIN_BUTTON_WIDTH), // Sustain button
        ])
        .split(area);

    let readiness = if app.controller.is_ready() {
        Span::styled(
            "Ready to play!",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled("Loading...", Style::default().fg(Color::LightRed))
    };
    frame.render_widget(
        Paragraph::new(Line::from(readiness)),
        Rect::new(chunks[0].x + 1, chunks[0].y + 1, chunks[0].width.saturating_sub(1), 1)
            .intersection(chunks[0]),
    );

    if let Some((message, _)) = &app.status_message {
        frame.render_widget(
            Paragraph::new(message.as_str())
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray)),
            Rect::new(chunks[1].x, chunks[1].y + 1, chunks[1].width, 1).intersection(chunks[1]),
        );
    }

    let sustain = app.controller.state().sustain_enabled();
    let (label, style) = if sustain {
        (
            "Sustain ON",
            Style::default()
                .fg(Color::White)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        ("Sustain OFF", Style::default().fg(Color::Gray))
    };
    frame.render_widget(
        Paragraph::new(label)
            .alignment(Alignment::Center)
            .style(style)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(if sustain {
                        Color::Magenta
                    } else {
                        Color::DarkGray
                    })),
            ),
        chunks[2],
    );

    chunks[2]
}

/// Renders the help lines under the keyboard, plus a warning when the
/// terminal cannot report key releases.
pub fn render_instructions(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = Style::default().fg(Color::Yellow);
    let desc_style = Style::default().fg(Color::DarkGray);

    let keys = KEY_BINDINGS
        .iter()
        .map(|(k, _)| k.to_ascii_uppercase().to_string())
        .collect::<Vec<_>>()
        .join(" ");

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Use your keyboard: ", desc_style),
            Span::styled(keys, key_style),
        ]),
        Line::from(vec![
            Span::styled("[", desc_style),
            Span::styled("Space", key_style),
            Span::styled("] Sustain  ", desc_style),
            Span::styled("[", desc_style),
            Span::styled("Up/Down", key_style),
            Span::styled("] Volume  ", desc_style),
            Span::styled("[", desc_style),
            Span::styled("Esc", key_style),
            Span::styled("] Quit", desc_style),
        ]),
    ];

    if let Some(timeout) = app.release_fallback() {
        lines.push(Line::from(Span::styled(
            format!(
                "No key-release reporting: keys stop {} ms after you let go, and re-taps within that time play once",
                timeout.as_millis()
            ),
            Style::default().fg(Color::LightRed),
        )));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

/// Renders the volume slider.
///
/// Returns the track area (the part that responds to clicks).
pub fn render_volume(frame: &mut Frame, area: Rect, app: &App) -> Rect {
    let volume = app.controller.volume();
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(5),  // "Vol "
            Constraint::Length(24), // Track
            Constraint::Length(6),  // Percentage
        ])
        .split(area);
    let track = chunks[2];

    let filled = (track.width as u32 * volume.percent() as u32 / 100) as usize;
    let empty = (track.width as usize).saturating_sub(filled);

    frame.render_widget(
        Paragraph::new(Span::styled("Vol ", Style::default().fg(Color::Gray)))
            .alignment(Alignment::Right),
        chunks[1],
    );
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("━".repeat(filled), Style::default().fg(Color::Magenta)),
            Span::styled("─".repeat(empty), Style::default().fg(Color::DarkGray)),
        ])),
        track,
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!("{:>4}", volume.to_string()),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        chunks[3],
    );

    track
}
