//! Piano data: the playable notes and the computer-keyboard bindings.
//!
//! The keyboard spans two octaves starting at F3. Both the note range and the
//! key table are fixed for the whole session.

mod keymap;
mod note;

pub use keymap::{key_hint, note_for_key, KEY_BINDINGS, SUSTAIN_KEY};
pub use note::{Note, ParseNoteError, NOTE_COUNT, NOTE_NAMES, WHITE_KEY_COUNT};
