// Commands from the control thread to the engine.
//
// Commands are the ONLY way a UI or host wrapper mutates engine settings
// while audio is running. They are queued and applied at the start of the
// next block.

use super::Settings;
use crate::chord::TriadType;
use crate::displacement::DisplacementMode;
use crate::mapper::VoiceMode;
use crate::quantizer::Scale;
use crate::velocity::VelocityMode;

/// A command from the control thread to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ═══════════════════════════════════════════
    // Settings
    // ═══════════════════════════════════════════
    /// Replace the whole snapshot.
    SetSettings(Settings),

    SetRootNote(i32),

    SetTriad(TriadType),

    SetMode(VoiceMode),

    SetOctaveOffset(i32),

    SetVelocity {
        mode: VelocityMode,
        scale: f32,
        fixed: i32,
    },

    SetDisplacement {
        mode: DisplacementMode,
        sync_index: i32,
        ms: f64,
    },

    SetScale(Scale),

    SetFeedbackRepeats(u32),

    SetTVoices(u32),

    SetMVoice(bool),

    // ═══════════════════════════════════════════
    // Transport
    // ═══════════════════════════════════════════
    /// Host tempo changed.
    SetTempo(f64),

    /// Playback (re)started, stopped or seeked: drop in-flight events and
    /// zero orbit parity.
    Reset,
}

impl Command {
    /// Apply to a settings snapshot.
    ///
    /// Returns `false` for commands that do not touch settings.
    pub fn apply(&self, settings: &mut Settings) -> bool {
        match self {
            Command::SetSettings(s) => *settings = s.clone(),
            Command::SetRootNote(root) => settings.root_note = *root,
            Command::SetTriad(triad) => settings.triad = *triad,
            Command::SetMode(mode) => settings.mode = *mode,
            Command::SetOctaveOffset(octave) => settings.octave_offset = *octave,
            Command::SetVelocity { mode, scale, fixed } => {
                settings.velocity_mode = *mode;
                settings.velocity_scale = *scale;
                settings.fixed_velocity = *fixed;
            }
            Command::SetDisplacement {
                mode,
                sync_index,
                ms,
            } => {
                settings.displacement_mode = *mode;
                settings.sync_index = *sync_index;
                settings.displacement_ms = *ms;
            }
            Command::SetScale(scale) => settings.scale = *scale,
            Command::SetFeedbackRepeats(n) => settings.feedback_repeats = *n,
            Command::SetTVoices(n) => settings.t_voices = *n,
            Command::SetMVoice(on) => settings.m_voice_on = *on,
            Command::SetTempo(bpm) => settings.bpm = *bpm,
            Command::Reset => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_updates_fields() {
        let mut settings = Settings::default();

        assert!(Command::SetMode(VoiceMode::Orbit).apply(&mut settings));
        assert!(
            Command::SetDisplacement {
                mode: DisplacementMode::Absolute,
                sync_index: 3,
                ms: 125.0,
            }
            .apply(&mut settings)
        );
        assert!(Command::SetTempo(90.0).apply(&mut settings));

        assert_eq!(settings.mode, VoiceMode::Orbit);
        assert_eq!(settings.displacement_mode, DisplacementMode::Absolute);
        assert_eq!(settings.displacement_ms, 125.0);
        assert_eq!(settings.bpm, 90.0);
    }

    #[test]
    fn test_reset_leaves_settings_alone() {
        let mut settings = Settings::default();
        assert!(!Command::Reset.apply(&mut settings));
        assert_eq!(settings, Settings::default());
    }
}
