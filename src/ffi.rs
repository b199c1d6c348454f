// C-compatible FFI bindings for native plugin hosts (iOS AUv3 and friends).
//
// Safety requirements:
// - All pointers must be non-null unless documented otherwise
// - All handles must be created by this module and not fabricated
// - Caller must call `tintin_engine_destroy` for each `tintin_engine_create`
// - All functions on one handle must be called from the same thread

use crate::chord::TriadType;
use crate::displacement::DisplacementMode;
use crate::engine::Engine;
use crate::event::{EventBuffer, MidiEvent};
use crate::mapper::VoiceMode;
use crate::quantizer::Scale;
use crate::state::Settings;
use crate::velocity::VelocityMode;

use log::{LevelFilter, debug, warn};
use oslog::OsLogger;

const DEFAULT_SAMPLE_RATE: f64 = 48_000.0;
const INPUT_CAPACITY: usize = 256;

// Logger subsystem identifier
const LOG_SUBSYSTEM: &str = "com.tintin.engine";

// ═══════════════════════════════════════════════════════════════════════════
// Logger Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the oslog logger.
///
/// Call once at startup. Output shows up in Console.app and Xcode.
#[unsafe(no_mangle)]
pub extern "C" fn tintin_init_logger() {
    OsLogger::new(LOG_SUBSYSTEM)
        .level_filter(LevelFilter::Debug)
        .init()
        .ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════════════════════

/// Opaque engine handle.
pub struct TintinEngine {
    inner: Engine,
    scratch: EventBuffer,
}

/// A raw MIDI message at a block offset.
#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct TintinMidiEvent {
    pub offset: u32,
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
}

/// Flat settings snapshot. Enum fields are host indices and are clamped.
#[repr(C)]
pub struct TintinSettings {
    pub root_note: i32,
    /// 0 = major, 1 = minor
    pub triad: i32,
    /// 0 = none, 1 = +1, 2 = +2, 3 = -1, 4 = -2, 5 = orbit
    pub mode: i32,
    pub octave_offset: i32,
    /// 0 = follow, 1 = scaled, 2 = fixed
    pub velocity_mode: i32,
    pub velocity_scale: f32,
    pub fixed_velocity: i32,
    /// 0 = none, 1 = sync, 2 = absolute
    pub displacement_mode: i32,
    pub sync_index: i32,
    pub displacement_ms: f64,
    /// 0 = chromatic, 1..=9 scales
    pub scale_index: i32,
    pub feedback_repeats: u32,
    pub t_voices: u32,
    pub bpm: f64,
    pub m_voice_on: bool,
}

impl From<&Settings> for TintinSettings {
    fn from(s: &Settings) -> Self {
        Self {
            root_note: s.root_note,
            triad: s.triad as i32,
            mode: s.mode.index(),
            octave_offset: s.octave_offset,
            velocity_mode: s.velocity_mode as i32,
            velocity_scale: s.velocity_scale,
            fixed_velocity: s.fixed_velocity,
            displacement_mode: s.displacement_mode as i32,
            sync_index: s.sync_index,
            displacement_ms: s.displacement_ms,
            scale_index: s.scale.index(),
            feedback_repeats: s.feedback_repeats,
            t_voices: s.t_voices,
            bpm: s.bpm,
            m_voice_on: s.m_voice_on,
        }
    }
}

impl From<&TintinSettings> for Settings {
    fn from(s: &TintinSettings) -> Self {
        Settings {
            root_note: s.root_note,
            triad: TriadType::from_index(s.triad),
            mode: VoiceMode::from_index(s.mode),
            octave_offset: s.octave_offset,
            velocity_mode: VelocityMode::from_index(s.velocity_mode),
            velocity_scale: s.velocity_scale,
            fixed_velocity: s.fixed_velocity,
            displacement_mode: DisplacementMode::from_index(s.displacement_mode),
            sync_index: s.sync_index,
            displacement_ms: s.displacement_ms,
            scale: Scale::from_index(s.scale_index),
            feedback_repeats: s.feedback_repeats,
            t_voices: s.t_voices,
            bpm: s.bpm,
            m_voice_on: s.m_voice_on,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Lifecycle
// ═══════════════════════════════════════════════════════════════════════════

/// Default settings, for hosts to start from.
#[unsafe(no_mangle)]
pub extern "C" fn tintin_default_settings() -> TintinSettings {
    TintinSettings::from(&Settings::default())
}

/// Create an engine. A non-positive sample rate falls back to 48 kHz.
///
/// Returns an opaque pointer that must be freed with `tintin_engine_destroy`.
#[unsafe(no_mangle)]
pub extern "C" fn tintin_engine_create(sample_rate: f64) -> *mut TintinEngine {
    let sample_rate = if sample_rate > 0.0 {
        sample_rate
    } else {
        warn!("invalid sample rate {}, using default", sample_rate);
        DEFAULT_SAMPLE_RATE
    };
    debug!("creating engine at {} Hz", sample_rate);

    Box::into_raw(Box::new(TintinEngine {
        inner: Engine::new(Settings::default(), sample_rate),
        scratch: EventBuffer::with_capacity(INPUT_CAPACITY),
    }))
}

/// Destroy an engine.
///
/// # Safety
/// `engine` must be a pointer returned by `tintin_engine_create`, or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tintin_engine_destroy(engine: *mut TintinEngine) {
    if !engine.is_null() {
        unsafe { drop(Box::from_raw(engine)) };
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════

/// Replace the settings snapshot.
///
/// # Safety
/// `engine` and `settings` must be valid pointers or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tintin_engine_set_settings(
    engine: *mut TintinEngine,
    settings: *const TintinSettings,
) {
    if engine.is_null() || settings.is_null() {
        return;
    }
    unsafe {
        (*engine).inner.set_settings(Settings::from(&*settings));
    }
}

/// Read back the clamped settings the engine is using.
///
/// # Safety
/// `engine` must be a valid pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tintin_engine_get_settings(engine: *const TintinEngine) -> TintinSettings {
    if engine.is_null() {
        return tintin_default_settings();
    }
    unsafe { TintinSettings::from((*engine).inner.settings()) }
}

/// Update host tempo.
///
/// # Safety
/// `engine` must be a valid pointer or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tintin_engine_set_tempo(engine: *mut TintinEngine, bpm: f64) {
    if engine.is_null() {
        return;
    }
    unsafe { (*engine).inner.set_tempo(bpm) };
}

/// Update sample rate.
///
/// # Safety
/// `engine` must be a valid pointer or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tintin_engine_set_sample_rate(engine: *mut TintinEngine, sample_rate: f64) {
    if engine.is_null() || sample_rate <= 0.0 {
        return;
    }
    unsafe { (*engine).inner.set_sample_rate(sample_rate) };
}

// ═══════════════════════════════════════════════════════════════════════════
// Processing
// ═══════════════════════════════════════════════════════════════════════════

/// Process one block.
///
/// Reads `input_len` events from `input`, writes up to `output_capacity`
/// events to `output`, and returns how many were written. Events beyond
/// the capacity are dropped.
///
/// # Safety
/// - `engine` must be a valid pointer
/// - `input` must point to `input_len` events (may be NULL if `input_len` is 0)
/// - `output` must point to space for `output_capacity` events
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tintin_engine_process(
    engine: *mut TintinEngine,
    input: *const TintinMidiEvent,
    input_len: u32,
    output: *mut TintinMidiEvent,
    output_capacity: u32,
    num_samples: u32,
) -> u32 {
    if engine.is_null() {
        return 0;
    }
    let engine = unsafe { &mut *engine };

    engine.scratch.clear();
    if !input.is_null() {
        let input = unsafe { std::slice::from_raw_parts(input, input_len as usize) };
        for e in input {
            let event = MidiEvent::from_bytes([e.status, e.data1, e.data2]);
            engine.scratch.add(event, e.offset as usize);
        }
    }

    engine
        .inner
        .process_block(&mut engine.scratch, num_samples as usize);

    if output.is_null() {
        return 0;
    }
    let output = unsafe { std::slice::from_raw_parts_mut(output, output_capacity as usize) };

    let mut written = 0;
    for (slot, timed) in output.iter_mut().zip(engine.scratch.iter()) {
        let [status, data1, data2] = timed.event.to_bytes();
        *slot = TintinMidiEvent {
            offset: timed.offset as u32,
            status,
            data1,
            data2,
        };
        written += 1;
    }

    if engine.scratch.len() > written {
        warn!(
            "output buffer too small: dropped {} events",
            engine.scratch.len() - written
        );
    }
    written as u32
}

/// Transport start/stop/seek: drop in-flight events and zero orbit parity.
///
/// # Safety
/// `engine` must be a valid pointer or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tintin_engine_reset(engine: *mut TintinEngine) {
    if engine.is_null() {
        return;
    }
    unsafe { (*engine).inner.reset() };
}

/// Number of T-voice events waiting in the delay queue.
///
/// # Safety
/// `engine` must be a valid pointer or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tintin_engine_pending(engine: *const TintinEngine) -> u32 {
    if engine.is_null() {
        return 0;
    }
    unsafe { (*engine).inner.pending_events() as u32 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_round_trip() {
        let engine = tintin_engine_create(48_000.0);
        let input = [TintinMidiEvent {
            offset: 4,
            status: 0x90,
            data1: 61,
            data2: 100,
        }];
        let mut output = [TintinMidiEvent::default(); 8];

        let written = unsafe {
            tintin_engine_process(engine, input.as_ptr(), 1, output.as_mut_ptr(), 8, 64)
        };

        assert_eq!(written, 2);
        assert_eq!(output[0].data1, 61);
        assert_eq!(output[1].data1, 64);
        assert_eq!(output[1].offset, 4);

        unsafe { tintin_engine_destroy(engine) };
    }

    #[test]
    fn test_settings_indices_clamp() {
        let engine = tintin_engine_create(48_000.0);
        let mut settings = tintin_default_settings();
        settings.mode = 99;
        settings.scale_index = 42;
        settings.sync_index = -7;

        unsafe { tintin_engine_set_settings(engine, &settings) };
        let back = unsafe { tintin_engine_get_settings(engine) };

        assert_eq!(back.mode, 5);
        assert_eq!(back.scale_index, 0);
        assert_eq!(back.sync_index, 0);

        unsafe { tintin_engine_destroy(engine) };
    }
}
