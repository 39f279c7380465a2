//! Session settings.
//!
//! Settings come from three layers, highest priority first: command-line
//! flags, an optional JSON config file, and built-in defaults. Nothing is
//! ever written back.

use crate::error::{PianoError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Starting volume in percent.
pub const DEFAULT_VOLUME: u8 = 70;

/// Default note velocity (0-127).
pub const DEFAULT_VELOCITY: u8 = 100;

/// How long a key may go unseen before it counts as released, on terminals
/// that never report key releases. Must exceed the OS key-repeat delay
/// (660 ms by default on X11, 500 ms on Windows and macOS).
pub const DEFAULT_HOLD_TIMEOUT_MS: u64 = 750;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SoundFont (.sf2) holding the piano samples.
    pub soundfont: Option<PathBuf>,
    /// Initial volume, 0-100.
    pub volume: u8,
    /// General MIDI program to play (0 = Acoustic Grand Piano).
    pub program: u8,
    /// Velocity used for every attack.
    pub velocity: u8,
    /// Release fallback delay in milliseconds.
    pub hold_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            soundfont: None,
            volume: DEFAULT_VOLUME,
            program: 0,
            velocity: DEFAULT_VELOCITY,
            hold_timeout_ms: DEFAULT_HOLD_TIMEOUT_MS,
        }
    }
}

impl Settings {
    /// Loads settings from a JSON file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PianoError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| PianoError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_json(text: &str) -> serde_json::Result<Self> {
        let settings: Self = serde_json::from_str(text)?;
        Ok(settings.normalized())
    }

    /// Clamps values into their valid ranges.
    pub fn normalized(mut self) -> Self {
        self.volume = self.volume.min(100);
        self.program = self.program.min(127);
        self.velocity = self.velocity.min(127);
        self
    }

    pub fn hold_timeout(&self) -> Duration {
        Duration::from_millis(self.hold_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.soundfont, None);
        assert_eq!(settings.volume, 70);
        assert_eq!(settings.program, 0);
        assert_eq!(settings.velocity, 100);
        assert_eq!(settings.hold_timeout(), Duration::from_millis(750));
    }

    #[test]
    fn test_partial_file() {
        let settings =
            Settings::from_json(r#"{ "soundfont": "piano.sf2", "volume": 40 }"#).unwrap();
        assert_eq!(settings.soundfont, Some(PathBuf::from("piano.sf2")));
        assert_eq!(settings.volume, 40);
        assert_eq!(settings.velocity, DEFAULT_VELOCITY);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let settings =
            Settings::from_json(r#"{ "volume": 250, "program": 200, "velocity": 255 }"#).unwrap();
        assert_eq!(settings.volume, 100);
        assert_eq!(settings.program, 127);
        assert_eq!(settings.velocity, 127);
    }

    #[test]
    fn test_bad_json() {
        assert!(Settings::from_json("{ volume: }").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::load("does/not/exist.json").unwrap_err();
        assert!(matches!(err, PianoError::ConfigRead { .. }));
    }
}
