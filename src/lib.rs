// src/lib.rs
//
// Library entry point for plugin hosts and FFI consumers.
//
// Turns an incoming melody (the M-voice) into a tintinnabuli counter-voice
// (the T-voice) restricted to the tones of a triad, and delays it by a
// sample-accurate rhythmic displacement.

mod bridge;
mod chord;
mod displacement;
mod engine;
mod event;
mod mapper;
mod quantizer;
mod scheduler;
mod state;
mod transport;
mod velocity;

#[cfg(feature = "ios")]
pub mod ffi;

#[cfg(feature = "web")]
pub mod wasm;


// Re-export key types for Rust consumers
pub use bridge::{EngineHandle, EngineReadback, SettingsHandle, create_bridge};
pub use chord::{Chord, TriadType};
pub use displacement::{Displacement, DisplacementMode, SYNC_BEATS, SYNC_LABELS, sync_beats};
pub use engine::Engine;
pub use event::{EventBuffer, MidiEvent, TimedEvent};
pub use mapper::{
    Direction, HeldVoices, VoiceLeader, VoiceMode, resolve, step_down, step_up, t_voice_note,
};
pub use quantizer::{Scale, quantize};
pub use scheduler::{MAX_PENDING, Scheduler};
pub use state::{Command, Settings, SettingsError, SettingsResult};
pub use transport::Transport;
pub use velocity::{VelocityMode, VelocityPolicy};
