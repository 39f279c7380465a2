//! Terminal user interface.
//!
//! One screen: title, readiness and sustain controls, the keyboard,
//! instructions, and the volume slider.

mod controls;
mod keyboard;

use crate::app::{App, LayoutRegions};
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

pub use controls::{render_controls, render_instructions, render_volume};
pub use keyboard::{render_keyboard, KeyboardGeometry};

/// Renders the complete UI and updates the app's layout regions.
pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(3), // Readiness + sustain
            Constraint::Min(6),    // Keyboard
            Constraint::Length(3), // Instructions
            Constraint::Length(1), // Volume
        ])
        .split(frame.area());

    frame.render_widget(
        Paragraph::new("Terminal Piano")
            .alignment(Alignment::Center)
            .style(
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        chunks[0],
    );

    let sustain_button = render_controls(frame, chunks[1], app);
    let keyboard = render_keyboard(frame, chunks[2], app);
    render_instructions(frame, chunks[3], app);
    let volume_slider = render_volume(frame, chunks[4], app);

    app.update_layout(LayoutRegions {
        keyboard,
        sustain_button,
        volume_slider,
    });
}
