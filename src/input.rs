//! Key-event routing.
//!
//! Turns raw key and pointer events into note intents. The router owns the
//! only input-side state: which physical keys are currently held, used to
//! drop auto-repeat.

use crate::piano::{note_for_key, Note, SUSTAIN_KEY};
use crossterm::event::KeyEventKind;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::trace;

/// Transition of a physical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPhase {
    Press,
    /// Operating-system key repeat while the key is held.
    Repeat,
    Release,
}

impl From<KeyEventKind> for KeyPhase {
    fn from(kind: KeyEventKind) -> Self {
        match kind {
            KeyEventKind::Press => KeyPhase::Press,
            KeyEventKind::Repeat => KeyPhase::Repeat,
            KeyEventKind::Release => KeyPhase::Release,
        }
    }
}

/// Transition of a pointer over a drawn key.
///
/// Touch input reaches the terminal as left-button mouse events, so it
/// arrives here through the same phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Up,
    /// The pointer moved off the key while pressed.
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key { key: char, phase: KeyPhase },
    Pointer { note: Note, phase: PointerPhase },
}

/// What the player asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    NoteOn(Note),
    NoteOff(Note),
    ToggleSustain,
}

/// Maps input events to intents.
///
/// When the terminal reports key releases, repeats arrive as
/// [`KeyPhase::Repeat`] and every press is a new physical press. Otherwise
/// repeats show up as more presses and releases never come, so each held key
/// is stamped with the time it was last seen, presses of a held key are
/// dropped, and [`expire`](KeyRouter::expire) releases keys that have gone
/// quiet. In that mode a key tapped again within the hold timeout plays
/// only once.
#[derive(Debug)]
pub struct KeyRouter {
    /// Held keys (lowercased) and when each was last seen.
    held: HashMap<char, Instant>,
    release_events: bool,
    hold_timeout: Duration,
}

impl KeyRouter {
    /// Router for a terminal that reports key releases.
    pub fn new() -> Self {
        Self {
            held: HashMap::new(),
            release_events: true,
            hold_timeout: Duration::ZERO,
        }
    }

    /// Router for a terminal without release reporting.
    pub fn with_hold_timeout(hold_timeout: Duration) -> Self {
        Self {
            held: HashMap::new(),
            release_events: false,
            hold_timeout,
        }
    }

    /// Whether key releases come from the terminal rather than the timeout.
    pub fn reports_releases(&self) -> bool {
        self.release_events
    }

    /// How long a held key may stay silent before it counts as released.
    /// Only used when the terminal does not report releases.
    pub fn hold_timeout(&self) -> Duration {
        self.hold_timeout
    }

    /// Resolves one event to at most one intent.
    pub fn route(&mut self, event: InputEvent, now: Instant) -> Option<Intent> {
        match event {
            InputEvent::Key { key, phase } => self.route_key(key.to_ascii_lowercase(), phase, now),
            InputEvent::Pointer { note, phase } => Some(match phase {
                PointerPhase::Down => Intent::NoteOn(note),
                PointerPhase::Up | PointerPhase::Leave => Intent::NoteOff(note),
            }),
        }
    }

    fn route_key(&mut self, key: char, phase: KeyPhase, now: Instant) -> Option<Intent> {
        let note = note_for_key(key);
        if note.is_none() && key != SUSTAIN_KEY {
            return None;
        }

        match phase {
            KeyPhase::Press => {
                if self.release_events {
                    // A release may have been lost (focus change); never stick
                    self.held.insert(key, now);
                    return Some(note.map_or(Intent::ToggleSustain, Intent::NoteOn));
                }
                if let Some(seen) = self.held.get_mut(&key) {
                    trace!(%key, "suppressed repeat");
                    *seen = now;
                    return None;
                }
                self.held.insert(key, now);
                Some(note.map_or(Intent::ToggleSustain, Intent::NoteOn))
            }
            KeyPhase::Repeat => {
                if let Some(seen) = self.held.get_mut(&key) {
                    *seen = now;
                }
                None
            }
            KeyPhase::Release => {
                self.held.remove(&key);
                note.map(Intent::NoteOff)
            }
        }
    }

    /// Releases keys that have not been seen within the hold timeout.
    ///
    /// Does nothing when the terminal reports releases itself.
    pub fn expire(&mut self, now: Instant) -> Vec<Intent> {
        if self.release_events {
            return Vec::new();
        }

        let timeout = self.hold_timeout;
        let mut expired: Vec<char> = self
            .held
            .iter()
            .filter(|(_, seen)| now.saturating_duration_since(**seen) > timeout)
            .map(|(&key, _)| key)
            .collect();
        expired.sort_unstable();

        expired
            .into_iter()
            .filter_map(|key| {
                self.held.remove(&key);
                note_for_key(key).map(Intent::NoteOff)
            })
            .collect()
    }

    /// Forgets every held key, returning note-offs for the bound ones.
    pub fn release_all(&mut self) -> Vec<Intent> {
        let mut keys: Vec<char> = self.held.drain().map(|(key, _)| key).collect();
        keys.sort_unstable();
        keys.into_iter()
            .filter_map(note_for_key)
            .map(Intent::NoteOff)
            .collect()
    }
}

impl Default for KeyRouter {
    fn default() -> Self {
        Self::new()
    }
}
