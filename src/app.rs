//! Application state and event handling.
//!
//! Wires terminal input to the key router and note controller, loads the
//! samples in the background, and tracks the screen regions the mouse can
//! hit.

use crate::audio::{load_synthesizer, Readiness, SoundEngine, SynthEngine, Volume};
use crate::config::Settings;
use crate::controller::NoteController;
use crate::error::PianoError;
use crate::input::{InputEvent, KeyRouter, PointerPhase};
use crate::piano::Note;
use crate::ui::KeyboardGeometry;
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Volume step for keys and the scroll wheel, in percent.
const VOLUME_STEP: i16 = 5;

/// How long status messages stay on screen.
const STATUS_DURATION: Duration = Duration::from_secs(2);

/// Layout regions for mouse hit testing, updated every frame.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegions {
    /// Key placement, or `None` if the terminal is too small to draw keys.
    pub keyboard: Option<KeyboardGeometry>,
    pub sustain_button: Rect,
    /// The slider track.
    pub volume_slider: Rect,
}

impl LayoutRegions {
    pub fn note_at(&self, x: u16, y: u16) -> Option<Note> {
        self.keyboard.as_ref()?.note_at(x, y)
    }

    pub fn is_on_sustain_button(&self, x: u16, y: u16) -> bool {
        contains(self.sustain_button, x, y)
    }

    pub fn is_on_volume_slider(&self, x: u16, y: u16) -> bool {
        contains(self.volume_slider, x, y)
    }

    /// Volume for a pointer at column `x`, clamped to the slider's ends.
    pub fn slider_volume(&self, x: u16) -> Volume {
        let track = self.volume_slider;
        if track.width <= 1 {
            return Volume::MAX;
        }
        let offset = x.saturating_sub(track.x).min(track.width - 1) as u32;
        Volume::new((offset * 100 / (track.width as u32 - 1)) as u8)
    }
}

fn contains(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

/// Polled once per frame until it hands over a ready engine.
pub type EngineSource<E> = Box<dyn FnMut() -> Option<E>>;

/// Main application state.
pub struct App<E: SoundEngine = SynthEngine> {
    pub controller: NoteController<E>,
    router: KeyRouter,
    /// `None` once the engine is attached.
    engine_source: Option<EngineSource<E>>,
    /// Layout regions for mouse hit testing (updated each frame).
    pub layout: LayoutRegions,
    /// Key under the pressed mouse button.
    pointer_note: Option<Note>,
    /// Whether the mouse is dragging the volume slider.
    dragging_volume: bool,
    /// Status message to display.
    pub status_message: Option<(String, Instant)>,
}

impl App<SynthEngine> {
    /// Creates the app and starts loading samples in the background.
    ///
    /// `release_events` says whether the terminal reports key releases; if
    /// not, held keys are released after the configured hold timeout.
    pub fn new(settings: Settings, release_events: bool) -> Self {
        let soundfont = settings.soundfont.clone();
        let program = settings.program;
        let mut loader = Readiness::spawn(move || {
            let path = soundfont.ok_or(PianoError::NoSoundFont)?;
            info!(path = %path.display(), "loading samples");
            load_synthesizer(path, program)
        });

        let engine_settings = settings.clone();
        let source = move || {
            let synth = loader.poll()?;
            match SynthEngine::start(synth, &engine_settings) {
                Ok(engine) => Some(engine),
                Err(e) => {
                    error!("failed to start audio: {}", e);
                    None
                }
            }
        };

        Self::with_engine_source(&settings, release_events, Box::new(source))
    }
}

impl<E: SoundEngine> App<E> {
    /// Creates the app with a custom way of obtaining the sound engine.
    ///
    /// Notes are dropped until `source` first returns an engine.
    pub fn with_engine_source(
        settings: &Settings,
        release_events: bool,
        source: EngineSource<E>,
    ) -> Self {
        let router = if release_events {
            KeyRouter::new()
        } else {
            info!(
                timeout_ms = settings.hold_timeout_ms,
                "terminal does not report key releases, using hold timeout"
            );
            KeyRouter::with_hold_timeout(settings.hold_timeout())
        };

        Self {
            controller: NoteController::new(Volume::new(settings.volume)),
            router,
            engine_source: Some(source),
            layout: LayoutRegions::default(),
            pointer_note: None,
            dragging_volume: false,
            status_message: None,
        }
    }

    /// The hold timeout in use when the terminal cannot report key
    /// releases, or `None` when it can.
    pub fn release_fallback(&self) -> Option<Duration> {
        (!self.router.reports_releases()).then(|| self.router.hold_timeout())
    }

    pub fn update_layout(&mut self, layout: LayoutRegions) {
        self.layout = layout;
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    pub fn clear_expired_status(&mut self) {
        if let Some((_, set_at)) = &self.status_message {
            if set_at.elapsed() > STATUS_DURATION {
                self.status_message = None;
            }
        }
    }

    /// Per-frame housekeeping: picks up loaded samples and releases keys
    /// whose release the terminal will never report.
    pub fn update(&mut self, now: Instant) {
        if let Some(source) = self.engine_source.as_mut() {
            if let Some(engine) = source() {
                self.engine_source = None;
                self.controller.attach_engine(engine);
            }
        }

        for intent in self.router.expire(now) {
            self.controller.apply(intent);
        }
    }

    fn route(&mut self, event: InputEvent) {
        if let Some(intent) = self.router.route(event, Instant::now()) {
            self.controller.apply(intent);
        }
    }

    /// Handles a key event.
    ///
    /// # Returns
    ///
    /// `true` if the application should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let pressed = key.kind != KeyEventKind::Release;
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => true,
            KeyCode::Esc => pressed,
            KeyCode::Up | KeyCode::Char('+') | KeyCode::Char('=') => {
                if pressed {
                    self.adjust_volume(VOLUME_STEP);
                }
                false
            }
            KeyCode::Down | KeyCode::Char('-') => {
                if pressed {
                    self.adjust_volume(-VOLUME_STEP);
                }
                false
            }
            KeyCode::Char(c) => {
                self.route(InputEvent::Key {
                    key: c,
                    phase: key.kind.into(),
                });
                false
            }
            _ => false,
        }
    }

    /// Handles mouse events over the keys, sustain button, and slider.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (x, y) = (mouse.column, mouse.row);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(note) = self.layout.note_at(x, y) {
                    self.pointer_note = Some(note);
                    self.route(InputEvent::Pointer {
                        note,
                        phase: PointerPhase::Down,
                    });
                } else if self.layout.is_on_sustain_button(x, y) {
                    self.controller.toggle_sustain();
                } else if self.layout.is_on_volume_slider(x, y) {
                    self.dragging_volume = true;
                    self.set_volume(self.layout.slider_volume(x));
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if self.dragging_volume {
                    self.set_volume(self.layout.slider_volume(x));
                } else if let Some(note) = self.pointer_note {
                    if self.layout.note_at(x, y) != Some(note) {
                        self.pointer_note = None;
                        self.route(InputEvent::Pointer {
                            note,
                            phase: PointerPhase::Leave,
                        });
                    }
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.dragging_volume = false;
                if let Some(note) = self.pointer_note.take() {
                    self.route(InputEvent::Pointer {
                        note,
                        phase: PointerPhase::Up,
                    });
                }
            }
            MouseEventKind::ScrollUp => self.adjust_volume(VOLUME_STEP),
            MouseEventKind::ScrollDown => self.adjust_volume(-VOLUME_STEP),
            _ => {}
        }
    }

    pub fn adjust_volume(&mut self, delta: i16) {
        self.set_volume(self.controller.volume().adjusted(delta));
    }

    pub fn set_volume(&mut self, volume: Volume) {
        if volume == self.controller.volume() {
            return;
        }
        self.controller.set_volume(volume);
        self.set_status(format!("Volume {} ({:.1} dB)", volume, volume.decibels()));
    }

    /// Releases everything still held and disposes of the sound engine.
    pub fn shutdown(&mut self) {
        for intent in self.router.release_all() {
            self.controller.apply(intent);
        }
        self.controller.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{Call, RecordingEngine};

    fn regions() -> LayoutRegions {
        LayoutRegions {
            keyboard: KeyboardGeometry::new(Rect::new(0, 4, 70, 10)),
            sustain_button: Rect::new(60, 1, 16, 3),
            volume_slider: Rect::new(40, 20, 21, 1),
        }
    }

    #[test]
    fn test_slider_volume() {
        let layout = regions();
        assert_eq!(layout.slider_volume(40).percent(), 0);
        assert_eq!(layout.slider_volume(50).percent(), 50);
        assert_eq!(layout.slider_volume(60).percent(), 100);
        // Dragging past either end clamps
        assert_eq!(layout.slider_volume(10).percent(), 0);
        assert_eq!(layout.slider_volume(90).percent(), 100);
    }

    #[test]
    fn test_hit_regions() {
        let layout = regions();
        assert!(layout.is_on_sustain_button(61, 2));
        assert!(!layout.is_on_sustain_button(59, 2));
        assert!(layout.is_on_volume_slider(45, 20));
        assert!(!layout.is_on_volume_slider(45, 21));
        assert_eq!(layout.note_at(0, 13), Note::from_name("F3"));
        assert_eq!(layout.note_at(0, 2), None);
    }

    #[test]
    fn test_no_keyboard() {
        let layout = LayoutRegions::default();
        assert_eq!(layout.note_at(0, 0), None);
        assert_eq!(layout.slider_volume(0), Volume::MAX);
    }

    fn note(name: &str) -> Note {
        Note::from_name(name).unwrap()
    }

    fn ready_app() -> App<RecordingEngine> {
        let mut app = App::with_engine_source(
            &Settings::default(),
            true,
            Box::new(|| Some(RecordingEngine::default())),
        );
        app.update(Instant::now());
        app.update_layout(regions());
        app
    }

    fn engine(app: &App<RecordingEngine>) -> &RecordingEngine {
        app.controller.engine().unwrap()
    }

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, kind)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_engine_attaches_when_source_delivers() {
        let mut polls = 0;
        let mut app = App::with_engine_source(
            &Settings::default(),
            true,
            Box::new(move || {
                polls += 1;
                (polls >= 2).then(RecordingEngine::default)
            }),
        );

        app.update(Instant::now());
        assert!(!app.controller.is_ready());
        app.handle_key(key(KeyCode::Char('a'), KeyEventKind::Press));
        assert!(!app.controller.state().is_active(note("F3")));

        app.update(Instant::now());
        assert!(app.controller.is_ready());
        assert_eq!(engine(&app).calls, vec![Call::Volume(70)]);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = ready_app();
        assert!(app.handle_key(key(KeyCode::Esc, KeyEventKind::Press)));
        assert!(!app.handle_key(key(KeyCode::Esc, KeyEventKind::Release)));
        assert!(app.handle_key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!app.handle_key(key(KeyCode::Char('c'), KeyEventKind::Press)));
    }

    #[test]
    fn test_note_keys_play_and_stop() {
        let mut app = ready_app();
        let f3 = note("F3");

        assert!(!app.handle_key(key(KeyCode::Char('a'), KeyEventKind::Press)));
        assert!(app.controller.state().is_active(f3));
        app.handle_key(key(KeyCode::Char('a'), KeyEventKind::Repeat));
        app.handle_key(key(KeyCode::Char('a'), KeyEventKind::Release));
        assert!(!app.controller.state().is_active(f3));
        assert_eq!(
            engine(&app).note_calls(),
            vec![Call::Attack(f3), Call::Release(f3)]
        );
    }

    #[test]
    fn test_volume_keys() {
        let mut app = ready_app();

        app.handle_key(key(KeyCode::Up, KeyEventKind::Press));
        assert_eq!(app.controller.volume().percent(), 75);
        assert_eq!(engine(&app).calls.last(), Some(&Call::Volume(75)));
        assert!(app.status_message.is_some());

        // Releasing the arrow key changes nothing
        app.handle_key(key(KeyCode::Up, KeyEventKind::Release));
        assert_eq!(app.controller.volume().percent(), 75);

        app.handle_key(key(KeyCode::Down, KeyEventKind::Press));
        app.handle_key(key(KeyCode::Char('-'), KeyEventKind::Press));
        assert_eq!(app.controller.volume().percent(), 65);
        assert!(engine(&app).note_calls().is_empty());
    }

    #[test]
    fn test_click_and_release_key() {
        let mut app = ready_app();
        let f3 = note("F3");

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 0, 13));
        assert!(app.controller.state().is_active(f3));
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 0, 13));
        assert!(!app.controller.state().is_active(f3));
        assert_eq!(
            engine(&app).note_calls(),
            vec![Call::Attack(f3), Call::Release(f3)]
        );
    }

    #[test]
    fn test_drag_off_key_releases_once() {
        let mut app = ready_app();
        let f3 = note("F3");

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 0, 13));
        // Still on the same key
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 2, 13));
        assert!(app.controller.state().is_active(f3));

        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 12, 13));
        assert!(!app.controller.state().is_active(f3));
        // Entering A3 does not start it
        assert!(!app.controller.state().is_active(note("A3")));

        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 12, 13));
        assert_eq!(
            engine(&app).note_calls(),
            vec![Call::Attack(f3), Call::Release(f3)]
        );
    }

    #[test]
    fn test_sustain_button_toggles() {
        let mut app = ready_app();
        let f3 = note("F3");

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 61, 2));
        assert!(app.controller.state().sustain_enabled());

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 0, 13));
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 0, 13));
        assert!(app.controller.state().is_active(f3));

        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 61, 2));
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 61, 2));
        assert!(!app.controller.state().sustain_enabled());
        assert!(!app.controller.state().is_active(f3));
        assert_eq!(engine(&app).count(Call::Release(f3)), 1);
    }

    #[test]
    fn test_volume_slider_and_scroll() {
        let mut app = ready_app();

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 50, 20));
        assert_eq!(app.controller.volume().percent(), 50);
        // Dragging keeps following the pointer, even off the track
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 70, 22));
        assert_eq!(app.controller.volume().percent(), 100);
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 70, 22));

        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 40, 20));
        assert_eq!(app.controller.volume().percent(), 100);

        app.handle_mouse(mouse(MouseEventKind::ScrollDown, 0, 0));
        assert_eq!(app.controller.volume().percent(), 95);
        assert_eq!(engine(&app).calls.last(), Some(&Call::Volume(95)));
        assert!(engine(&app).note_calls().is_empty());
    }

    #[test]
    fn test_release_fallback_expires_held_keys() {
        let settings = Settings::default();
        let mut app = App::with_engine_source(
            &settings,
            false,
            Box::new(|| Some(RecordingEngine::default())),
        );
        assert_eq!(app.release_fallback(), Some(settings.hold_timeout()));
        assert_eq!(ready_app().release_fallback(), None);

        app.update(Instant::now());
        app.handle_key(key(KeyCode::Char('a'), KeyEventKind::Press));
        assert!(app.controller.state().is_active(note("F3")));

        app.update(Instant::now() + settings.hold_timeout() * 2);
        assert!(!app.controller.state().is_active(note("F3")));
    }

    #[test]
    fn test_shutdown_disposes_engine() {
        let mut app = ready_app();
        app.handle_key(key(KeyCode::Char('a'), KeyEventKind::Press));
        app.shutdown();
        assert!(!app.controller.is_ready());
        assert!(app.controller.state().active().is_empty());
    }
}
