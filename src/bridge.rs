//! Thread-safe bridge between a control thread and the audio engine.
//!
//! # Architecture
//!
//! - **Control thread** (UI, host parameter callbacks, transport) owns
//!   [`SettingsHandle`] with a local [`Settings`] mirror
//! - **Audio thread** owns [`EngineHandle`] with the [`Engine`]
//! - Commands travel over an MPSC channel; readback uses atomics
//!
//! # Usage
//!
//! ```ignore
//! let (mut control, mut audio) = create_bridge(Engine::new(Settings::default(), 48_000.0));
//!
//! // Control thread
//! control.set_mode(VoiceMode::Orbit);
//! control.reset(); // transport stopped
//!
//! // Audio thread, once per callback
//! audio.process_commands();
//! audio.process_block(&mut midi, frames);
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
    mpsc::{self, Receiver, Sender, TryRecvError},
};

use log::debug;

use crate::chord::TriadType;
use crate::engine::Engine;
use crate::event::EventBuffer;
use crate::mapper::VoiceMode;
use crate::quantizer::Scale;
use crate::state::{Command, Settings};

/// Read-only engine state for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineReadback {
    /// T-voice events waiting in the delay queue.
    pub pending_events: usize,

    /// Orbit parity counter.
    pub orbit_counter: u64,

    /// Blocks processed since creation.
    pub blocks_processed: u64,

    /// Sample position since the last reset.
    pub sample_position: u64,
}

/// Lock-free shared state for engine -> control readback.
struct SharedReadback {
    pending_events: AtomicU64,
    orbit_counter: AtomicU64,
    blocks_processed: AtomicU64,
    sample_position: AtomicU64,
}

impl SharedReadback {
    fn new() -> Self {
        Self {
            pending_events: AtomicU64::new(0),
            orbit_counter: AtomicU64::new(0),
            blocks_processed: AtomicU64::new(0),
            sample_position: AtomicU64::new(0),
        }
    }
}

/// Handle for the control thread.
pub struct SettingsHandle {
    /// Local mirror of the settings the engine will see.
    settings: Settings,

    /// Channel to send commands to the engine.
    command_tx: Sender<Command>,

    /// Shared readback state (updated by engine).
    readback: Arc<SharedReadback>,
}

/// Handle for the audio thread containing the engine.
pub struct EngineHandle {
    engine: Engine,

    /// Channel to receive commands from the control thread.
    command_rx: Receiver<Command>,

    /// Shared readback state (written by engine).
    readback: Arc<SharedReadback>,
}

/// Create a linked pair of handles around `engine`.
///
/// The control-side mirror starts from the engine's current settings.
pub fn create_bridge(engine: Engine) -> (SettingsHandle, EngineHandle) {
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let readback = Arc::new(SharedReadback::new());

    let settings_handle = SettingsHandle {
        settings: engine.settings().clone(),
        command_tx: cmd_tx,
        readback: Arc::clone(&readback),
    };

    let engine_handle = EngineHandle {
        engine,
        command_rx: cmd_rx,
        readback,
    };

    (settings_handle, engine_handle)
}

// ═══════════════════════════════════════════════════════════════════
// SettingsHandle - Control Thread API
// ═══════════════════════════════════════════════════════════════════

impl SettingsHandle {
    /// Settings as last sent (unclamped).
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Send a command to the engine.
    ///
    /// Also updates the local mirror for immediate feedback.
    pub fn send(&mut self, cmd: Command) {
        cmd.apply(&mut self.settings);

        // Engine gone means the audio side was shut down; nothing to do.
        let _ = self.command_tx.send(cmd);
    }

    pub fn readback(&self) -> EngineReadback {
        EngineReadback {
            pending_events: self.readback.pending_events.load(Ordering::Relaxed) as usize,
            orbit_counter: self.readback.orbit_counter.load(Ordering::Relaxed),
            blocks_processed: self.readback.blocks_processed.load(Ordering::Relaxed),
            sample_position: self.readback.sample_position.load(Ordering::Relaxed),
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Convenience methods
    // ───────────────────────────────────────────────────────────────

    pub fn set_settings(&mut self, settings: Settings) {
        self.send(Command::SetSettings(settings));
    }

    pub fn set_root_note(&mut self, root: i32) {
        self.send(Command::SetRootNote(root));
    }

    pub fn set_triad(&mut self, triad: TriadType) {
        self.send(Command::SetTriad(triad));
    }

    pub fn set_mode(&mut self, mode: VoiceMode) {
        self.send(Command::SetMode(mode));
    }

    pub fn set_scale(&mut self, scale: Scale) {
        self.send(Command::SetScale(scale));
    }

    pub fn set_tempo(&mut self, bpm: f64) {
        self.send(Command::SetTempo(bpm));
    }

    /// Transport started, stopped or seeked.
    pub fn reset(&mut self) {
        self.send(Command::Reset);
    }
}

// ═══════════════════════════════════════════════════════════════════
// EngineHandle - Audio Thread API
// ═══════════════════════════════════════════════════════════════════

impl EngineHandle {
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Apply all queued commands. Call at the start of each block.
    ///
    /// Returns the number of commands applied.
    pub fn process_commands(&mut self) -> usize {
        let mut applied = 0;

        loop {
            match self.command_rx.try_recv() {
                Ok(cmd) => {
                    self.apply(cmd);
                    applied += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }

        if applied > 0 {
            self.publish();
        }
        applied
    }

    fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Reset => self.engine.reset(),
            Command::SetTempo(bpm) => self.engine.set_tempo(bpm),
            other => {
                let mut settings = self.engine.settings().clone();
                if other.apply(&mut settings) {
                    self.engine.set_settings(settings);
                } else {
                    debug!("ignoring command {:?}", other);
                }
            }
        }
    }

    /// Process one block and publish readback.
    pub fn process_block(&mut self, midi: &mut EventBuffer, num_samples: usize) {
        self.engine.process_block(midi, num_samples);
        self.readback.blocks_processed.fetch_add(1, Ordering::Relaxed);
        self.publish();
    }

    fn publish(&self) {
        self.readback
            .pending_events
            .store(self.engine.pending_events() as u64, Ordering::Relaxed);
        self.readback
            .orbit_counter
            .store(self.engine.orbit_counter(), Ordering::Relaxed);
        self.readback
            .sample_position
            .store(self.engine.transport().sample_pos, Ordering::Relaxed);
    }
}
