//! Sound engine double for tests.

use super::{SoundEngine, Volume};
use crate::piano::Note;

/// One call made on a [`RecordingEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Call {
    Attack(Note),
    Release(Note),
    Volume(u8),
}

/// Engine that records every call instead of making sound.
#[derive(Debug, Default)]
pub(crate) struct RecordingEngine {
    pub calls: Vec<Call>,
}

impl RecordingEngine {
    pub fn count(&self, call: Call) -> usize {
        self.calls.iter().filter(|&&c| c == call).count()
    }

    /// Calls with the volume changes left out.
    pub fn note_calls(&self) -> Vec<Call> {
        self.calls
            .iter()
            .copied()
            .filter(|c| !matches!(c, Call::Volume(_)))
            .collect()
    }
}

impl SoundEngine for RecordingEngine {
    fn attack(&mut self, note: Note) {
        self.calls.push(Call::Attack(note));
    }

    fn release(&mut self, note: Note) {
        self.calls.push(Call::Release(note));
    }

    fn set_volume(&mut self, volume: Volume) {
        self.calls.push(Call::Volume(volume.percent()));
    }
}
