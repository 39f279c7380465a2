//! Sound output for the piano.
//!
//! The note logic talks to audio only through the [`SoundEngine`] trait.
//! [`SynthEngine`] implements it with a rustysynth SoundFont sampler streamed
//! through rodio. Samples load on a background thread; [`Readiness`] carries
//! the result back to the UI thread exactly once.

pub mod engine;
pub mod loader;
#[cfg(test)]
pub(crate) mod testing;

pub use engine::{load_synthesizer, SynthEngine, SAMPLE_RATE};
pub use loader::Readiness;

use crate::piano::Note;
use std::fmt;

/// Capability interface for anything that can sound piano notes.
///
/// Disposal is `Drop`: dropping an engine silences it and frees its
/// output resources.
pub trait SoundEngine {
    /// Starts the note's envelope.
    fn attack(&mut self, note: Note);

    /// Ends the note's envelope. The engine may let the note ring out.
    fn release(&mut self, note: Note);

    /// Sets the master output level.
    fn set_volume(&mut self, volume: Volume);
}

/// Master volume as a percentage, always within 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Volume(u8);

impl Volume {
    pub const MAX: Volume = Volume(100);

    /// Creates a volume, clamping anything above 100.
    pub fn new(percent: u8) -> Self {
        Self(percent.min(100))
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    /// Linear output gain (0.0 to 1.0).
    pub fn gain(self) -> f32 {
        self.0 as f32 / 100.0
    }

    /// Gain in decibels relative to full scale. Silence is negative infinity.
    pub fn decibels(self) -> f32 {
        20.0 * self.gain().log10()
    }

    /// Returns the volume moved by `delta` percent, saturating at the ends.
    pub fn adjusted(self, delta: i16) -> Self {
        Self::new((self.0 as i16 + delta).clamp(0, 100) as u8)
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
