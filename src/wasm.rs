//! WebAssembly bindings via wasm-bindgen for browser hosts.
//!
//! This module is only compiled when the `web` feature is enabled.
//!
//! # Usage
//!
//! Build with wasm-pack:
//! ```bash
//! wasm-pack build --target web --features web
//! ```
//!
//! # JavaScript Example
//!
//! ```javascript
//! import init, { tintin_init, TintinProcessor } from './tintin.js';
//!
//! await init();
//! tintin_init();
//!
//! const tintin = new TintinProcessor(sampleRate);
//! tintin.set_mode(5); // orbit
//!
//! // Inside the AudioWorklet, per render quantum:
//! // events are flat [offset, status, data1, data2, ...]
//! const out = tintin.process(new Uint32Array([0, 0x90, 61, 100]), 128);
//! ```

use wasm_bindgen::prelude::*;

use crate::chord::TriadType;
use crate::displacement::DisplacementMode;
use crate::engine::Engine;
use crate::event::{EventBuffer, MidiEvent};
use crate::mapper::VoiceMode;
use crate::quantizer::Scale;
use crate::state::Settings;
use crate::velocity::VelocityMode;

const DEFAULT_SAMPLE_RATE: f64 = 48_000.0;

/// Words per event in the flat event arrays.
const EVENT_STRIDE: usize = 4;

// ═══════════════════════════════════════════════════════════════════════════
// Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the wasm module. Call this once before using anything else.
/// Sets up panic hooks and console logging.
#[wasm_bindgen]
pub fn tintin_init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Processor
// ═══════════════════════════════════════════════════════════════════════════

#[wasm_bindgen]
pub struct TintinProcessor {
    engine: Engine,
    scratch: EventBuffer,
}

impl TintinProcessor {
    fn update(&mut self, f: impl FnOnce(&mut Settings)) {
        let mut settings = self.engine.settings().clone();
        f(&mut settings);
        self.engine.set_settings(settings);
    }
}

#[wasm_bindgen]
impl TintinProcessor {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64) -> TintinProcessor {
        let sample_rate = if sample_rate > 0.0 {
            sample_rate
        } else {
            DEFAULT_SAMPLE_RATE
        };
        Self {
            engine: Engine::new(Settings::default(), sample_rate),
            scratch: EventBuffer::with_capacity(128),
        }
    }

    /// Load a TOML preset. Throws on malformed input.
    pub fn load_preset(&mut self, toml: &str) -> Result<(), JsValue> {
        let settings =
            Settings::from_toml_str(toml).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.engine.set_settings(settings);
        Ok(())
    }

    /// Current (clamped) settings as TOML.
    pub fn preset(&self) -> Result<String, JsValue> {
        self.engine
            .settings()
            .to_toml_string()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    // -------------------------------
    // Settings (host indices, clamped)
    // -------------------------------

    pub fn set_root_note(&mut self, root: i32) {
        self.update(|s| s.root_note = root);
    }

    pub fn set_triad(&mut self, index: i32) {
        self.update(|s| s.triad = TriadType::from_index(index));
    }

    pub fn set_mode(&mut self, index: i32) {
        self.update(|s| s.mode = VoiceMode::from_index(index));
    }

    pub fn set_octave_offset(&mut self, octaves: i32) {
        self.update(|s| s.octave_offset = octaves);
    }

    pub fn set_velocity(&mut self, mode: i32, scale: f32, fixed: i32) {
        self.update(|s| {
            s.velocity_mode = VelocityMode::from_index(mode);
            s.velocity_scale = scale;
            s.fixed_velocity = fixed;
        });
    }

    pub fn set_displacement(&mut self, mode: i32, sync_index: i32, ms: f64) {
        self.update(|s| {
            s.displacement_mode = DisplacementMode::from_index(mode);
            s.sync_index = sync_index;
            s.displacement_ms = ms;
        });
    }

    pub fn set_scale(&mut self, index: i32) {
        self.update(|s| s.scale = Scale::from_index(index));
    }

    pub fn set_m_voice(&mut self, on: bool) {
        self.update(|s| s.m_voice_on = on);
    }

    pub fn set_tempo(&mut self, bpm: f64) {
        self.engine.set_tempo(bpm);
    }

    // -------------------------------
    // Processing
    // -------------------------------

    /// Process one block of flat `[offset, status, data1, data2]` events and
    /// return the output in the same layout.
    pub fn process(&mut self, events: &[u32], num_samples: u32) -> Vec<u32> {
        self.scratch.clear();
        for chunk in events.chunks_exact(EVENT_STRIDE) {
            let event = MidiEvent::from_bytes([chunk[1] as u8, chunk[2] as u8, chunk[3] as u8]);
            self.scratch.add(event, chunk[0] as usize);
        }

        self.engine
            .process_block(&mut self.scratch, num_samples as usize);

        let mut out = Vec::with_capacity(self.scratch.len() * EVENT_STRIDE);
        for timed in self.scratch.iter() {
            let [status, data1, data2] = timed.event.to_bytes();
            out.extend_from_slice(&[
                timed.offset as u32,
                u32::from(status),
                u32::from(data1),
                u32::from(data2),
            ]);
        }
        out
    }

    /// Transport start/stop/seek.
    pub fn reset(&mut self) {
        self.engine.reset();
    }

    pub fn pending_events(&self) -> u32 {
        self.engine.pending_events() as u32
    }
}
