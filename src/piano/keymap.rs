//! Computer keyboard to note bindings.

use super::Note;

/// Key that toggles sustain.
pub const SUSTAIN_KEY: char = ' ';

/// Computer key to note mapping, laid out along the home row.
///
/// White keys sit on the home row, black keys on the row above.
pub const KEY_BINDINGS: [(char, &str); 18] = [
    ('a', "F3"),
    ('w', "F#3"),
    ('s', "G3"),
    ('e', "G#3"),
    ('d', "A3"),
    ('f', "A#3"),
    ('t', "B3"),
    ('g', "C4"),
    ('y', "C#4"),
    ('h', "D4"),
    ('u', "D#4"),
    ('j', "A4"),
    ('k', "B4"),
    ('o', "F#4"),
    ('l', "C5"),
    ('p', "G#4"),
    (';', "D5"),
    ('\'', "E5"),
];

/// Resolves a pressed key to its note. Letters match in either case.
pub fn note_for_key(key: char) -> Option<Note> {
    let key = key.to_ascii_lowercase();
    KEY_BINDINGS
        .iter()
        .find(|(k, _)| *k == key)
        .and_then(|(_, name)| Note::from_name(name))
}

/// The key label drawn on a piano key, if that note has a binding.
pub fn key_hint(note: Note) -> Option<char> {
    KEY_BINDINGS
        .iter()
        .find(|(_, name)| *name == note.name())
        .map(|(k, _)| k.to_ascii_uppercase())
}
