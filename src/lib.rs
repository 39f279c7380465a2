//! pianotui - a virtual piano for the terminal.
//!
//! This library holds the note logic (key routing, note state, sustain),
//! the SoundFont sound engine, and the terminal UI.

pub mod app;
pub mod audio;
pub mod config;
pub mod controller;
pub mod error;
pub mod input;
pub mod piano;
pub mod ui;

// Re-export commonly used types
pub use app::App;
pub use audio::{SoundEngine, SynthEngine, Volume};
pub use config::Settings;
pub use controller::{Command, NoteController, NoteState, Transition};
pub use error::PianoError;
pub use input::{InputEvent, Intent, KeyPhase, KeyRouter, PointerPhase};
pub use piano::Note;
