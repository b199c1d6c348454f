// src/state/mod.rs
//
// Declarative settings layer.
//
// This module holds the *desired* configuration of the engine. The control
// thread edits it freely; the bridge forwards changes to the audio thread
// as Commands, and the engine works from a clamped per-block copy.

mod command;
mod settings;

pub use command::*;
pub use settings::*;
