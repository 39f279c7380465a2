//! SoundFont sampler engine.
//!
//! Plays notes with rustysynth and streams the rendered audio through rodio.

use super::{SoundEngine, Volume};
use crate::config::Settings;
use crate::error::{PianoError, Result};
use crate::piano::Note;
use rodio::{OutputStream, OutputStreamHandle, Source};
use rustysynth::{SoundFont, Synthesizer, SynthesizerSettings};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Sample rate for audio synthesis (44.1 kHz standard).
pub const SAMPLE_RATE: u32 = 44100;

/// Audio buffer size for low-latency playback.
/// Smaller = lower latency but higher CPU usage.
const BUFFER_SIZE: usize = 256;

/// All notes play on the first MIDI channel.
const CHANNEL: i32 = 0;

/// Loads a SoundFont and builds a synthesizer with the configured instrument.
///
/// This does the slow part of startup (reading and decoding the sample bank)
/// and is meant to run off the UI thread.
pub fn load_synthesizer<P: AsRef<Path>>(soundfont_path: P, program: u8) -> Result<Synthesizer> {
    let path = soundfont_path.as_ref();
    let mut file = BufReader::new(File::open(path).map_err(|source| {
        PianoError::SoundFontOpen {
            path: path.to_path_buf(),
            source,
        }
    })?);
    let soundfont = Arc::new(
        SoundFont::new(&mut file).map_err(|e| PianoError::SoundFontParse(format!("{:?}", e)))?,
    );

    let settings = SynthesizerSettings::new(SAMPLE_RATE as i32);
    let mut synth = Synthesizer::new(&soundfont, &settings)
        .map_err(|e| PianoError::Synthesizer(format!("{:?}", e)))?;
    // Program change is MIDI command 0xC0
    synth.process_midi_message(CHANNEL, 0xC0, program as i32, 0);
    Ok(synth)
}

/// Audio source that pulls samples from the synthesizer.
struct SynthSource {
    synth: Arc<Mutex<Synthesizer>>,
    /// Master gain as `f32` bits, written by the UI thread.
    gain: Arc<AtomicU32>,
    left_buf: Vec<f32>,
    right_buf: Vec<f32>,
    buf_pos: usize,
    /// Current channel (0 = left, 1 = right).
    channel: usize,
}

impl SynthSource {
    fn new(synth: Arc<Mutex<Synthesizer>>, gain: Arc<AtomicU32>) -> Self {
        Self {
            synth,
            gain,
            left_buf: vec![0.0; BUFFER_SIZE],
            right_buf: vec![0.0; BUFFER_SIZE],
            buf_pos: BUFFER_SIZE, // Start at end to trigger first render
            channel: 0,
        }
    }

    fn render(&mut self) {
        if let Ok(mut synth) = self.synth.lock() {
            synth.render(&mut self.left_buf, &mut self.right_buf);
        } else {
            self.left_buf.fill(0.0);
            self.right_buf.fill(0.0);
        }
        self.buf_pos = 0;
    }
}

impl Iterator for SynthSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.buf_pos >= BUFFER_SIZE {
            self.render();
        }

        // Interleave stereo samples: L, R, L, R, ...
        let sample = if self.channel == 0 {
            self.left_buf[self.buf_pos]
        } else {
            self.right_buf[self.buf_pos]
        };

        self.channel = 1 - self.channel;
        if self.channel == 0 {
            self.buf_pos += 1;
        }

        let gain = f32::from_bits(self.gain.load(Ordering::Relaxed));
        Some(sample * gain)
    }
}

impl Source for SynthSource {
    fn current_frame_len(&self) -> Option<usize> {
        None // Continuous stream
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Sound engine backed by a SoundFont synthesizer.
///
/// Owns the audio output stream; dropping the engine silences every voice
/// and closes the stream.
pub struct SynthEngine {
    synth: Arc<Mutex<Synthesizer>>,
    gain: Arc<AtomicU32>,
    velocity: u8,
    /// Audio output stream (must be kept alive).
    _stream: OutputStream,
    _stream_handle: OutputStreamHandle,
}

impl SynthEngine {
    /// Opens the default audio output and starts streaming from `synth`.
    ///
    /// `OutputStream` is tied to the thread that opens it, so this must be
    /// called on the UI thread after the synthesizer has loaded.
    ///
    /// # Errors
    ///
    /// Returns error if no output device is available or the stream
    /// rejects the source.
    pub fn start(synth: Synthesizer, settings: &Settings) -> Result<Self> {
        let synth = Arc::new(Mutex::new(synth));
        let gain = Arc::new(AtomicU32::new(
            Volume::new(settings.volume).gain().to_bits(),
        ));

        let (stream, stream_handle) = OutputStream::try_default()?;
        stream_handle.play_raw(SynthSource::new(Arc::clone(&synth), Arc::clone(&gain)))?;

        Ok(Self {
            synth,
            gain,
            velocity: settings.velocity,
            _stream: stream,
            _stream_handle: stream_handle,
        })
    }
}

impl SoundEngine for SynthEngine {
    fn attack(&mut self, note: Note) {
        if let Ok(mut synth) = self.synth.lock() {
            synth.note_on(CHANNEL, note.midi_pitch() as i32, self.velocity as i32);
        }
    }

    fn release(&mut self, note: Note) {
        if let Ok(mut synth) = self.synth.lock() {
            synth.note_off(CHANNEL, note.midi_pitch() as i32);
        }
    }

    fn set_volume(&mut self, volume: Volume) {
        self.gain.store(volume.gain().to_bits(), Ordering::Relaxed);
    }
}

impl Drop for SynthEngine {
    fn drop(&mut self) {
        debug!("disposing synth engine");
        if let Ok(mut synth) = self.synth.lock() {
            synth.note_off_all(true);
        }
    }
}
