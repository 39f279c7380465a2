//! Note state and the commands that drive the sound engine.
//!
//! [`NoteState`] holds the notes that are highlighted (active), the notes
//! that owe a release when sustain turns off (sustained), and the sustain
//! flag. Its transitions are pure: each returns the next state together with
//! the attack/release commands it implies. [`NoteController`] owns the
//! current state and forwards those commands to a [`SoundEngine`] once one
//! is ready.
//!
//! Invariant: every sustained note is also active.

use crate::audio::{SoundEngine, Volume};
use crate::input::Intent;
use crate::piano::Note;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// A command for the sound engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Attack(Note),
    Release(Note),
}

/// The result of a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: NoteState,
    /// Commands to issue, in order.
    pub commands: Vec<Command>,
}

impl Transition {
    fn unchanged(state: &NoteState) -> Self {
        Self {
            state: state.clone(),
            commands: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteState {
    active: BTreeSet<Note>,
    sustained: BTreeSet<Note>,
    sustain: bool,
}

impl NoteState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notes currently highlighted, low to high.
    pub fn active(&self) -> &BTreeSet<Note> {
        &self.active
    }

    /// Notes held past their physical release by sustain.
    pub fn sustained(&self) -> &BTreeSet<Note> {
        &self.sustained
    }

    pub fn is_active(&self, note: Note) -> bool {
        self.active.contains(&note)
    }

    pub fn sustain_enabled(&self) -> bool {
        self.sustain
    }

    /// Attacks `note` and marks it active, and sustained if sustain is on.
    ///
    /// Pressing a note that is already sounding attacks it again.
    pub fn play_note(&self, note: Note) -> Transition {
        let mut state = self.clone();
        state.active.insert(note);
        if state.sustain {
            state.sustained.insert(note);
        }
        Transition {
            state,
            commands: vec![Command::Attack(note)],
        }
    }

    /// Releases `note` unless sustain is holding it.
    pub fn stop_note(&self, note: Note) -> Transition {
        if self.sustain && self.sustained.contains(&note) {
            return Transition::unchanged(self);
        }
        let mut state = self.clone();
        state.active.remove(&note);
        Transition {
            state,
            commands: vec![Command::Release(note)],
        }
    }

    /// Flips sustain.
    ///
    /// Turning sustain off releases each sustained note once and clears
    /// every highlight. Turning it on changes nothing else.
    pub fn toggle_sustain(&self) -> Transition {
        if !self.sustain {
            let mut state = self.clone();
            state.sustain = true;
            return Transition {
                state,
                commands: Vec::new(),
            };
        }

        let commands = self.sustained.iter().copied().map(Command::Release).collect();
        Transition {
            state: NoteState::default(),
            commands,
        }
    }
}

/// Owns the note state and, once samples are ready, the sound engine.
///
/// Until [`attach_engine`](NoteController::attach_engine) is called, note
/// on/off requests are dropped without touching state.
pub struct NoteController<E: SoundEngine> {
    state: NoteState,
    engine: Option<E>,
    volume: Volume,
}

impl<E: SoundEngine> NoteController<E> {
    pub fn new(volume: Volume) -> Self {
        Self {
            state: NoteState::new(),
            engine: None,
            volume,
        }
    }

    pub fn state(&self) -> &NoteState {
        &self.state
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    /// Whether samples have loaded and notes can play.
    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    /// Marks the controller ready and brings the engine to the current volume.
    pub fn attach_engine(&mut self, mut engine: E) {
        engine.set_volume(self.volume);
        self.engine = Some(engine);
        info!("sound engine ready");
    }

    pub fn play_note(&mut self, note: Note) {
        if !self.is_ready() {
            debug!(%note, "dropped note on before samples loaded");
            return;
        }
        let transition = self.state.play_note(note);
        self.commit(transition);
    }

    pub fn stop_note(&mut self, note: Note) {
        if !self.is_ready() {
            return;
        }
        let transition = self.state.stop_note(note);
        self.commit(transition);
    }

    pub fn toggle_sustain(&mut self) {
        let transition = self.state.toggle_sustain();
        self.commit(transition);
        debug!(sustain = self.state.sustain, "sustain toggled");
    }

    /// Sets the master volume. Never starts or stops a note.
    pub fn set_volume(&mut self, volume: Volume) {
        self.volume = volume;
        if let Some(engine) = self.engine.as_mut() {
            engine.set_volume(volume);
        }
    }

    /// Carries out a routed intent.
    pub fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::NoteOn(note) => self.play_note(note),
            Intent::NoteOff(note) => self.stop_note(note),
            Intent::ToggleSustain => self.toggle_sustain(),
        }
    }

    /// Disposes of the engine. The controller is back to not ready.
    pub fn teardown(&mut self) {
        if self.engine.take().is_some() {
            info!("sound engine disposed");
        }
        self.state = NoteState::new();
    }

    fn commit(&mut self, transition: Transition) {
        if let Some(engine) = self.engine.as_mut() {
            for command in &transition.commands {
                match *command {
                    Command::Attack(note) => engine.attack(note),
                    Command::Release(note) => engine.release(note),
                }
            }
        }
        self.state = transition.state;
    }
}
