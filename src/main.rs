//! pianotui - a virtual piano in the terminal.
//!
//! Plays piano samples from a SoundFont in response to the computer keyboard
//! or mouse clicks on the drawn keys, with sustain and volume controls.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- piano.sf2
//! cargo run -- --config piano.json --volume 50
//! ```

use pianotui::{ui, App, Settings};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::fs::File;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// A virtual piano for the terminal.
///
/// Key releases are only seen on terminals that speak the kitty keyboard
/// protocol, such as kitty, WezTerm and foot. Elsewhere a held key counts as
/// released once it has been silent for the hold timeout (750 ms by default,
/// `hold_timeout_ms` in the config file), and tapping the same key again
/// inside that window plays it only once.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// SoundFont (.sf2) with the piano samples.
    soundfont: Option<PathBuf>,

    /// JSON settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Starting volume, 0-100.
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    volume: Option<u8>,

    /// General MIDI program to play (0 = Acoustic Grand Piano).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=127))]
    program: Option<u8>,

    /// Write logs here instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Builds the session settings: flags override the config file, which
    /// overrides the defaults.
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(soundfont) = &self.soundfont {
            settings.soundfont = Some(soundfont.clone());
        }
        if let Some(volume) = self.volume {
            settings.volume = volume;
        }
        if let Some(program) = self.program {
            settings.program = program;
        }
        Ok(settings.normalized())
    }
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env());

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

/// Main entry point.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    let settings = cli.settings().context("Failed to load settings")?;
    info!(?settings, "starting");

    let (mut terminal, release_events) = setup_terminal().context("Failed to setup terminal")?;

    let mut app = App::new(settings, release_events);
    let result = run_app(&mut terminal, &mut app);
    app.shutdown();

    restore_terminal(&mut terminal, release_events).context("Failed to restore terminal")?;

    result
}

/// Sets up the terminal for TUI rendering.
///
/// Returns the terminal and whether key release events were enabled.
fn setup_terminal() -> Result<(Terminal<CrosstermBackend<Stdout>>, bool)> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;

    // Release and repeat reporting need the kitty keyboard protocol
    let release_events = supports_keyboard_enhancement().unwrap_or(false)
        && execute!(
            stdout,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .is_ok();

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok((terminal, release_events))
}

/// Restores the terminal to its original state.
fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    release_events: bool,
) -> Result<()> {
    if release_events {
        // Pop before leaving the alternate screen
        if let Err(e) = execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags) {
            warn!("Failed to restore keyboard flags: {}", e);
        }
    }
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.update(Instant::now());
        app.clear_expired_status();

        terminal.draw(|frame| ui::render(frame, app))?;

        // Short timeout so readiness and hold expiry are picked up promptly
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    if app.handle_key(key) {
                        break;
                    }
                }
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                _ => {}
            }
        }
    }

    Ok(())
}
