// src/state/settings.rs
//
// Settings snapshot consumed by the engine once per block.
//
// The host/UI owns the authoritative values; the engine only ever sees a
// clamped copy. Presets can be read from TOML for the demo binary and
// tests; any field left out takes its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chord::TriadType;
use crate::displacement::{Displacement, DisplacementMode, SYNC_TABLE_LEN};
use crate::mapper::VoiceMode;
use crate::quantizer::Scale;
use crate::velocity::{MAX_VELOCITY, MIN_VELOCITY, VelocityMode, VelocityPolicy};

pub const OCTAVE_RANGE: i32 = 3;
pub const MIN_DISPLACEMENT_MS: f64 = 10.0;
pub const MAX_DISPLACEMENT_MS: f64 = 2000.0;
pub const MAX_FEEDBACK_REPEATS: u32 = 8;
pub const MAX_T_VOICES: u32 = 4;

/// Error while loading a settings preset.
#[derive(Debug)]
pub enum SettingsError {
    /// The preset file could not be read.
    Io(std::io::Error),

    /// The preset is not valid TOML or has mistyped fields.
    Parse(toml::de::Error),

    /// The settings could not be written as TOML.
    Serialize(toml::ser::Error),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "Failed to read settings: {}", e),
            SettingsError::Parse(e) => write!(f, "Invalid settings preset: {}", e),
            SettingsError::Serialize(e) => write!(f, "Failed to write settings: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Parse(e) => Some(e),
            SettingsError::Serialize(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<toml::de::Error> for SettingsError {
    fn from(e: toml::de::Error) -> Self {
        SettingsError::Parse(e)
    }
}

impl From<toml::ser::Error> for SettingsError {
    fn from(e: toml::ser::Error) -> Self {
        SettingsError::Serialize(e)
    }
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Everything the engine reads from the outside world for one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Tonic, as a MIDI note (0..=127).
    pub root_note: i32,

    pub triad: TriadType,

    pub mode: VoiceMode,

    /// T-voice transposition in octaves (-3..=3).
    pub octave_offset: i32,

    pub velocity_mode: VelocityMode,

    /// Factor for `VelocityMode::Scaled` (0..=1).
    pub velocity_scale: f32,

    /// Value for `VelocityMode::Fixed` (1..=127).
    pub fixed_velocity: i32,

    pub displacement_mode: DisplacementMode,

    /// Index into the sync table (0..=15).
    pub sync_index: i32,

    /// Delay for `DisplacementMode::Absolute` (10..=2000 ms).
    pub displacement_ms: f64,

    pub scale: Scale,

    /// Echoes of each T-voice event at multiples of the delay.
    pub feedback_repeats: u32,

    /// Simultaneous T-voices, stacked on successive chord tones.
    pub t_voices: u32,

    /// Host tempo.
    pub bpm: f64,

    /// Whether the M-voice is passed through to the output.
    pub m_voice_on: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_note: 60,
            triad: TriadType::Major,
            mode: VoiceMode::Plus1,
            octave_offset: 0,
            velocity_mode: VelocityMode::Follow,
            velocity_scale: 1.0,
            fixed_velocity: 90,
            displacement_mode: DisplacementMode::None,
            sync_index: 0,
            displacement_ms: 250.0,
            scale: Scale::Chromatic,
            feedback_repeats: 0,
            t_voices: 1,
            bpm: 120.0,
            m_voice_on: true,
        }
    }
}

impl Settings {
    /// Copy with every numeric field pulled into its valid range.
    pub fn clamped(&self) -> Self {
        let velocity_scale = if self.velocity_scale.is_nan() {
            1.0
        } else {
            self.velocity_scale.clamp(0.0, 1.0)
        };
        let displacement_ms = if self.displacement_ms.is_nan() {
            MIN_DISPLACEMENT_MS
        } else {
            self.displacement_ms
                .clamp(MIN_DISPLACEMENT_MS, MAX_DISPLACEMENT_MS)
        };

        Self {
            root_note: self.root_note.clamp(0, 127),
            octave_offset: self.octave_offset.clamp(-OCTAVE_RANGE, OCTAVE_RANGE),
            velocity_scale,
            fixed_velocity: self
                .fixed_velocity
                .clamp(i32::from(MIN_VELOCITY), i32::from(MAX_VELOCITY)),
            sync_index: self.sync_index.clamp(0, SYNC_TABLE_LEN as i32 - 1),
            displacement_ms,
            feedback_repeats: self.feedback_repeats.min(MAX_FEEDBACK_REPEATS),
            t_voices: self.t_voices.clamp(1, MAX_T_VOICES),
            ..self.clone()
        }
    }

    pub fn velocity_policy(&self) -> VelocityPolicy {
        VelocityPolicy {
            mode: self.velocity_mode,
            scale: self.velocity_scale,
            fixed: self.fixed_velocity,
        }
    }

    pub fn displacement(&self) -> Displacement {
        Displacement {
            mode: self.displacement_mode,
            sync_index: self.sync_index,
            absolute_ms: self.displacement_ms,
        }
    }

    // -------------------------------
    // MARK: Presets
    // -------------------------------

    pub fn from_toml_str(text: &str) -> SettingsResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> SettingsResult<String> {
        Ok(toml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_preset_keeps_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            root_note = 62
            triad = "minor"
            mode = "orbit"
            displacement_mode = "sync"
            sync_index = 6
            scale = "dorian"
            "#,
        )
        .unwrap();

        assert_eq!(settings.root_note, 62);
        assert_eq!(settings.triad, TriadType::Minor);
        assert_eq!(settings.mode, VoiceMode::Orbit);
        assert_eq!(settings.displacement_mode, DisplacementMode::Sync);
        assert_eq!(settings.scale, Scale::Dorian);
        assert_eq!(settings.fixed_velocity, 90);
        assert!(settings.m_voice_on);
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = Settings {
            mode: VoiceMode::Minus2,
            velocity_mode: VelocityMode::Scaled,
            velocity_scale: 0.5,
            scale: Scale::PentatonicMinor,
            ..Settings::default()
        };
        let text = settings.to_toml_string().unwrap();
        assert_eq!(Settings::from_toml_str(&text).unwrap(), settings);
    }

    #[test]
    fn test_bad_preset_is_parse_error() {
        let err = Settings::from_toml_str("mode = \"sideways\"").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
        assert!(err.to_string().starts_with("Invalid settings preset"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Settings::load("/nonexistent/tintin/preset.toml").unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }

    #[test]
    fn test_clamped() {
        let wild = Settings {
            root_note: 300,
            octave_offset: -9,
            velocity_scale: 4.0,
            fixed_velocity: 0,
            sync_index: 40,
            displacement_ms: 0.0,
            feedback_repeats: 100,
            t_voices: 0,
            ..Settings::default()
        };

        let c = wild.clamped();
        assert_eq!(c.root_note, 127);
        assert_eq!(c.octave_offset, -3);
        assert_eq!(c.velocity_scale, 1.0);
        assert_eq!(c.fixed_velocity, 1);
        assert_eq!(c.sync_index, 15);
        assert_eq!(c.displacement_ms, 10.0);
        assert_eq!(c.feedback_repeats, MAX_FEEDBACK_REPEATS);
        assert_eq!(c.t_voices, 1);
    }

    #[test]
    fn test_default_is_already_clamped() {
        let settings = Settings::default();
        assert_eq!(settings.clamped(), settings);
    }
}
