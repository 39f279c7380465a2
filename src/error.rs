//! Error types for loading sound assets and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing the piano for playback.
///
/// None of these reach the player directly: a failed load leaves the
/// readiness indicator in its loading state and the error goes to the log.
#[derive(Debug, Error)]
pub enum PianoError {
    /// No SoundFont was given on the command line or in the config file.
    #[error("no SoundFont configured")]
    NoSoundFont,

    /// The SoundFont file could not be opened.
    #[error("failed to open SoundFont {}", path.display())]
    SoundFontOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The SoundFont file is not a valid SF2 bank.
    #[error("failed to load SoundFont: {0}")]
    SoundFontParse(String),

    /// The synthesizer rejected the SoundFont or settings.
    #[error("failed to create synthesizer: {0}")]
    Synthesizer(String),

    /// No audio output device could be opened.
    #[error("failed to open audio output")]
    AudioOutput(#[from] rodio::StreamError),

    /// The output stream refused the synthesizer source.
    #[error("failed to start audio playback")]
    Playback(#[from] rodio::PlayError),

    /// The loader thread ended without sending a result.
    #[error("sample loader stopped before finishing")]
    LoaderStopped,

    /// The config file could not be read.
    #[error("failed to read config {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for [`crate::config::Settings`].
    #[error("invalid config {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, PianoError>;
