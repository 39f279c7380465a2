//! Note identifiers for the two-octave keyboard.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of playable notes.
pub const NOTE_COUNT: usize = 24;

/// Number of white keys on the keyboard.
pub const WHITE_KEY_COUNT: usize = 14;

/// The playable pitches in keyboard order (F3 to E5).
pub const NOTE_NAMES: [&str; NOTE_COUNT] = [
    "F3", "F#3", "G3", "G#3", "A3", "A#3", "B3", "C4", "C#4", "D4", "D#4", "E4", //
    "F4", "F#4", "G4", "G#4", "A4", "A#4", "B4", "C5", "C#5", "D5", "D#5", "E5",
];

/// MIDI note number of the lowest key (F3).
const LOWEST_PITCH: u8 = 53;

/// A key on the keyboard, identified by its position in [`NOTE_NAMES`].
///
/// Ordering follows pitch, so sets of notes iterate from low to high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Note(u8);

/// Error returned when a string is not one of the playable pitch names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a playable note: {0:?}")]
pub struct ParseNoteError(String);

impl Note {
    /// Returns the note at `index` in keyboard order.
    pub fn from_index(index: usize) -> Option<Self> {
        (index < NOTE_COUNT).then_some(Self(index as u8))
    }

    /// Looks up a note by pitch name such as `"F#3"`.
    pub fn from_name(name: &str) -> Option<Self> {
        NOTE_NAMES
            .iter()
            .position(|&n| n == name)
            .and_then(Self::from_index)
    }

    /// Iterates over every playable note from low to high.
    pub fn all() -> impl Iterator<Item = Note> {
        (0..NOTE_COUNT as u8).map(Note)
    }

    /// Iterates over the white keys from left to right.
    pub fn white_keys() -> impl Iterator<Item = Note> {
        Self::all().filter(|n| !n.is_black())
    }

    /// Iterates over the black keys from left to right.
    pub fn black_keys() -> impl Iterator<Item = Note> {
        Self::all().filter(|n| n.is_black())
    }

    /// Position in keyboard order.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Pitch name such as `"C4"`.
    pub fn name(self) -> &'static str {
        NOTE_NAMES[self.index()]
    }

    /// MIDI note number. 60 = Middle C (C4).
    pub fn midi_pitch(self) -> u8 {
        LOWEST_PITCH + self.0
    }

    pub fn is_black(self) -> bool {
        self.name().contains('#')
    }

    /// Index among the white keys, or `None` for a black key.
    pub fn white_key_index(self) -> Option<usize> {
        if self.is_black() {
            return None;
        }
        Some(Self::all().take(self.index()).filter(|n| !n.is_black()).count())
    }

    /// For a black key, the index of the white key it sits to the right of.
    ///
    /// Every black key follows a white key in this range, so this is the
    /// white-key index of the note one semitone below.
    pub fn black_key_slot(self) -> Option<usize> {
        if !self.is_black() {
            return None;
        }
        Self::from_index(self.index().checked_sub(1)?)?.white_key_index()
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Note {
    type Err = ParseNoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s.trim()).ok_or_else(|| ParseNoteError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_range() {
        assert_eq!(Note::all().count(), NOTE_COUNT);
        assert_eq!(Note::white_keys().count(), WHITE_KEY_COUNT);
        assert_eq!(Note::black_keys().count(), NOTE_COUNT - WHITE_KEY_COUNT);

        let first = Note::from_index(0).unwrap();
        assert_eq!(first.name(), "F3");
        assert_eq!(first.midi_pitch(), 53);
        let last = Note::from_index(NOTE_COUNT - 1).unwrap();
        assert_eq!(last.name(), "E5");
        assert_eq!(last.midi_pitch(), 76);
        assert!(Note::from_index(NOTE_COUNT).is_none());
    }

    #[test]
    fn test_lookup_by_name_and_pitch() {
        let c4: Note = "C4".parse().unwrap();
        assert_eq!(c4.midi_pitch(), 60);
        assert_eq!(Note::from_name("A4").unwrap().midi_pitch(), 69);
        assert_eq!(Note::from_name("F#3").unwrap().midi_pitch(), 54);
        assert!("C3".parse::<Note>().is_err());
        assert!("H4".parse::<Note>().is_err());
        assert_eq!(c4.to_string(), "C4");
    }

    #[test]
    fn test_black_keys() {
        assert!(Note::from_name("F#3").unwrap().is_black());
        assert!(!Note::from_name("E4").unwrap().is_black());
    }

    #[test]
    fn test_white_key_index() {
        assert_eq!(Note::from_name("F3").unwrap().white_key_index(), Some(0));
        assert_eq!(Note::from_name("C4").unwrap().white_key_index(), Some(4));
        assert_eq!(Note::from_name("E5").unwrap().white_key_index(), Some(13));
        assert_eq!(Note::from_name("C#4").unwrap().white_key_index(), None);
    }

    #[test]
    fn test_black_key_slots() {
        let expected = [
            ("F#3", 0),
            ("G#3", 1),
            ("A#3", 2),
            ("C#4", 4),
            ("D#4", 5),
            ("F#4", 7),
            ("G#4", 8),
            ("A#4", 9),
            ("C#5", 11),
            ("D#5", 12),
        ];
        for (name, slot) in expected {
            assert_eq!(
                Note::from_name(name).unwrap().black_key_slot(),
                Some(slot),
                "{name}"
            );
        }
        assert_eq!(Note::from_name("G3").unwrap().black_key_slot(), None);
    }
}
