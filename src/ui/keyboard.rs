//! Piano keyboard widget.
//!
//! Draws 14 white keys with the 10 black keys laid over their upper part,
//! highlights active notes, and maps screen cells back to notes for mouse
//! input. Drawing and hit testing share [`KeyboardGeometry`] so a click
//! always lands on the key that was drawn there.

use crate::app::App;
use crate::piano::{key_hint, Note, WHITE_KEY_COUNT};
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Narrowest white key that still fits a border and a label.
const MIN_WHITE_KEY_WIDTH: u16 = 3;

/// Shortest keyboard that leaves room below the black keys.
const MIN_KEYBOARD_HEIGHT: u16 = 4;

/// Screen placement of every key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardGeometry {
    /// Area actually covered by keys (centered in the space given).
    area: Rect,
    white_width: u16,
    black_width: u16,
    black_height: u16,
}

impl KeyboardGeometry {
    /// Lays the keyboard out in `area`, or returns `None` if it does not fit.
    pub fn new(area: Rect) -> Option<Self> {
        let white_width = area.width / WHITE_KEY_COUNT as u16;
        if white_width < MIN_WHITE_KEY_WIDTH || area.height < MIN_KEYBOARD_HEIGHT {
            return None;
        }

        let used = white_width * WHITE_KEY_COUNT as u16;
        let area = Rect::new(area.x + (area.width - used) / 2, area.y, used, area.height);

        Some(Self {
            area,
            white_width,
            black_width: (white_width * 2 / 3).max(2),
            black_height: area.height * 3 / 5,
        })
    }

    /// The cells covered by `note`'s key.
    pub fn key_rect(&self, note: Note) -> Rect {
        if let Some(index) = note.white_key_index() {
            return Rect::new(
                self.area.x + index as u16 * self.white_width,
                self.area.y,
                self.white_width,
                self.area.height,
            );
        }

        // Black keys straddle the boundary after their slot, leaning left
        let slot = note.black_key_slot().unwrap_or_default() as u16;
        let center = self.area.x + (slot + 1) * self.white_width - self.white_width * 3 / 10;
        Rect::new(
            center.saturating_sub(self.black_width / 2),
            self.area.y,
            self.black_width,
            self.black_height,
        )
        .intersection(self.area)
    }

    /// The note drawn at a screen position. Black keys sit on top.
    pub fn note_at(&self, x: u16, y: u16) -> Option<Note> {
        Note::black_keys()
            .chain(Note::white_keys())
            .find(|&note| contains(self.key_rect(note), x, y))
    }
}

fn contains(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

/// Pads `lines` at the top so they sit at the bottom of `height` rows.
fn bottom_aligned(mut lines: Vec<Line<'static>>, height: u16) -> Vec<Line<'static>> {
    let padding = (height as usize).saturating_sub(lines.len());
    let mut padded = vec![Line::default(); padding];
    padded.append(&mut lines);
    padded
}

fn white_key(note: Note, active: bool, height: u16) -> Paragraph<'static> {
    let (bg, fg, hint_fg) = if active {
        (Color::Blue, Color::White, Color::White)
    } else {
        (Color::White, Color::DarkGray, Color::Blue)
    };

    let mut lines = vec![Line::from(Span::styled(note.name(), Style::default().fg(fg)))];
    if let Some(hint) = key_hint(note) {
        lines.push(Line::from(Span::styled(
            hint.to_string(),
            Style::default().fg(hint_fg).add_modifier(Modifier::BOLD),
        )));
    }
    // One row of padding under the labels
    lines.push(Line::default());

    Paragraph::new(bottom_aligned(lines, height))
        .alignment(Alignment::Center)
        .style(Style::default().bg(bg))
        .block(
            Block::default()
                .borders(Borders::RIGHT)
                .border_style(Style::default().fg(Color::Gray).bg(bg)),
        )
}

fn black_key(note: Note, active: bool, height: u16) -> Paragraph<'static> {
    let bg = if active { Color::Magenta } else { Color::Black };

    let mut lines = vec![Line::from(Span::styled(
        note.name(),
        Style::default().fg(Color::White),
    ))];
    if let Some(hint) = key_hint(note) {
        lines.push(Line::from(Span::styled(
            hint.to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
    }

    Paragraph::new(bottom_aligned(lines, height))
        .alignment(Alignment::Center)
        .style(Style::default().bg(bg))
}

/// Renders the keyboard and returns its geometry for hit testing.
pub fn render_keyboard(frame: &mut Frame, area: Rect, app: &App) -> Option<KeyboardGeometry> {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(geometry) = KeyboardGeometry::new(inner) else {
        frame.render_widget(
            Paragraph::new("Terminal too small for the keyboard")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return None;
    };

    let state = app.controller.state();
    for note in Note::white_keys() {
        let rect = geometry.key_rect(note);
        frame.render_widget(white_key(note, state.is_active(note), rect.height), rect);
    }
    for note in Note::black_keys() {
        let rect = geometry.key_rect(note);
        frame.render_widget(black_key(note, state.is_active(note), rect.height), rect);
    }

    Some(geometry)
}
