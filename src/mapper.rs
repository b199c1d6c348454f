// src/mapper.rs
//
// Voice-leading: maps M-voice pitches onto tones of the active triad.
//
// The mapping itself is a pure function of (note, direction, steps, chord).
// `VoiceLeader` holds the only state: the orbit parity counter and the
// T-voice pitches each held note started, so a note-off releases exactly
// those pitches even if the settings changed while the note was held.

use serde::{Deserialize, Serialize};

use crate::chord::Chord;
use crate::quantizer::pitch_class;
use crate::state::MAX_T_VOICES;

const CHANNELS: usize = 16;
const NOTES: usize = 128;

/// T-voice mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceMode {
    /// T-voice is silent.
    None,
    #[default]
    Plus1,
    Plus2,
    Minus1,
    Minus2,
    /// Alternates Plus1 / Minus1 on successive note-ons.
    Orbit,
}

impl VoiceMode {
    pub const ALL: [VoiceMode; 6] = [
        VoiceMode::None,
        VoiceMode::Plus1,
        VoiceMode::Plus2,
        VoiceMode::Minus1,
        VoiceMode::Minus2,
        VoiceMode::Orbit,
    ];

    /// Out-of-range indices clamp to the nearest variant.
    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.clamp(0, Self::ALL.len() as i32 - 1) as usize]
    }

    pub fn index(self) -> i32 {
        self as i32
    }

    /// Chord-tone steps taken by the primary T-voice.
    pub fn steps(self) -> u32 {
        match self {
            VoiceMode::None => 0,
            VoiceMode::Plus1 | VoiceMode::Minus1 | VoiceMode::Orbit => 1,
            VoiceMode::Plus2 | VoiceMode::Minus2 => 2,
        }
    }

    /// Fixed direction, if the mode has one.
    pub fn direction(self) -> Option<Direction> {
        match self {
            VoiceMode::Plus1 | VoiceMode::Plus2 => Some(Direction::Up),
            VoiceMode::Minus1 | VoiceMode::Minus2 => Some(Direction::Down),
            VoiceMode::None | VoiceMode::Orbit => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

// -------------------------------
// MARK: Pure mapping
// -------------------------------

/// Upward distance (semitones) from `note` to the nearest chord tone.
///
/// Inclusive distances are in [0, 11]; strict distances skip the note's own
/// pitch-class and are in [1, 12].
fn distance_up(note: i32, chord: &Chord, inclusive: bool) -> i32 {
    let pc = pitch_class(note);
    chord.pitch_classes().iter().fold(12, |best, &tone| {
        let d = (tone - pc).rem_euclid(12);
        let d = if d == 0 && !inclusive { 12 } else { d };
        best.min(d)
    })
}

fn distance_down(note: i32, chord: &Chord, inclusive: bool) -> i32 {
    let pc = pitch_class(note);
    chord.pitch_classes().iter().fold(12, |best, &tone| {
        let d = (pc - tone).rem_euclid(12);
        let d = if d == 0 && !inclusive { 12 } else { d };
        best.min(d)
    })
}

/// Nearest chord tone at or above `note`.
#[inline]
pub fn step_up(note: i32, chord: &Chord) -> i32 {
    note + distance_up(note, chord, true)
}

/// Nearest chord tone at or below `note`.
#[inline]
pub fn step_down(note: i32, chord: &Chord) -> i32 {
    note - distance_down(note, chord, true)
}

/// Walk `steps` chord tones from `note` in `direction`.
///
/// The first step lands on the nearest chord tone (the note itself if it is
/// one); every further step moves to the next distinct chord tone, so two
/// steps always reach the second chord tone in that direction.
///
/// For a chord-tone input this gives neither the literal "chord tone maps to
/// itself" reading (+2 from E4 in C major would stay on E4) nor a strict walk
/// on every step (which would reach C5). It gives G4.
pub fn resolve(note: i32, direction: Direction, steps: u32, chord: &Chord) -> i32 {
    let mut n = note;
    for i in 0..steps {
        let inclusive = i == 0;
        n = match direction {
            Direction::Up => n + distance_up(n, chord, inclusive),
            Direction::Down => n - distance_down(n, chord, inclusive),
        };
    }
    n
}

/// Full T-voice pitch: chord-tone walk plus octave transposition.
///
/// Not clamped to the MIDI range.
#[inline]
pub fn t_voice_note(
    note: i32,
    direction: Direction,
    steps: u32,
    chord: &Chord,
    octave_offset: i32,
) -> i32 {
    resolve(note, direction, steps, chord) + octave_offset * 12
}

// -------------------------------
// MARK: Held-note tracking
// -------------------------------

/// T-voice pitches started by one held input note, primary voice first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeldVoices {
    notes: [u8; MAX_T_VOICES as usize],
    len: usize,
}

impl HeldVoices {
    /// Extra pitches beyond `MAX_T_VOICES` are ignored.
    pub fn from_notes(notes: &[u8]) -> Self {
        let mut held = Self::default();
        held.len = notes.len().min(held.notes.len());
        held.notes[..held.len].copy_from_slice(&notes[..held.len]);
        held
    }

    #[inline]
    pub fn notes(&self) -> &[u8] {
        &self.notes[..self.len]
    }
}

/// Resolves mapping direction per note-on, including Orbit alternation, and
/// remembers what each held note started.
pub struct VoiceLeader {
    /// Incremented on every note-on handled in Orbit mode.
    orbit_counter: u64,

    /// Pitches each sounding (channel, input note) started.
    held: [[Option<HeldVoices>; NOTES]; CHANNELS],
}

impl Default for VoiceLeader {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceLeader {
    pub fn new() -> Self {
        Self {
            orbit_counter: 0,
            held: [[None; NOTES]; CHANNELS],
        }
    }

    #[inline]
    pub fn orbit_counter(&self) -> u64 {
        self.orbit_counter
    }

    fn orbit_direction(&self) -> Direction {
        if self.orbit_counter % 2 == 0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    fn slot(&mut self, channel: u8, note: u8) -> &mut Option<HeldVoices> {
        &mut self.held[(channel as usize) % CHANNELS][(note as usize) % NOTES]
    }

    /// Direction for a note-on. Flips orbit parity in Orbit mode.
    ///
    /// Returns `None` when the T-voice is disabled.
    pub fn note_on(&mut self, mode: VoiceMode) -> Option<Direction> {
        match mode {
            VoiceMode::None => None,
            VoiceMode::Orbit => {
                let d = self.orbit_direction();
                self.orbit_counter = self.orbit_counter.wrapping_add(1);
                Some(d)
            }
            fixed => fixed.direction(),
        }
    }

    /// Record the T-voice pitches started for a note-on.
    ///
    /// A retrigger of a note that is still held replaces the earlier entry.
    pub fn hold(&mut self, channel: u8, note: u8, pitches: &[u8]) {
        *self.slot(channel, note) = Some(HeldVoices::from_notes(pitches));
    }

    /// Take the pitches started by the matching note-on, if any.
    pub fn release(&mut self, channel: u8, note: u8) -> Option<HeldVoices> {
        self.slot(channel, note).take()
    }

    /// Direction for a note-off with no matching note-on.
    ///
    /// Orbit takes the current parity without advancing it.
    pub fn orphan_direction(&self, mode: VoiceMode) -> Option<Direction> {
        match mode {
            VoiceMode::None => None,
            VoiceMode::Orbit => Some(self.orbit_direction()),
            fixed => fixed.direction(),
        }
    }

    /// Number of notes currently tracked as held.
    pub fn held_count(&self) -> usize {
        self.held.iter().flatten().filter(|h| h.is_some()).count()
    }

    /// Zero orbit parity and forget held notes.
    pub fn reset(&mut self) {
        self.orbit_counter = 0;
        for channel in self.held.iter_mut() {
            channel.fill(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::TriadType;

    fn c_major() -> Chord {
        Chord::from_triad(60, TriadType::Major)
    }

    #[test]
    fn test_plus1_from_non_chord_tone() {
        let chord = c_major();
        assert_eq!(t_voice_note(61, Direction::Up, 1, &chord, 0), 64);
    }

    #[test]
    fn test_chord_tone_maps_to_itself() {
        let chord = c_major();
        assert_eq!(step_up(64, &chord), 64);
        assert_eq!(step_down(67, &chord), 67);
    }

    #[test]
    fn test_down_steps() {
        let chord = c_major();
        // D4 -> C4
        assert_eq!(resolve(62, Direction::Down, 1, &chord), 60);
        // D4 -> C4 -> G3
        assert_eq!(resolve(62, Direction::Down, 2, &chord), 55);
    }

    #[test]
    fn test_two_steps_reach_second_chord_tone() {
        let chord = c_major();
        // C#4 -> E4 -> G4
        assert_eq!(resolve(61, Direction::Up, 2, &chord), 67);
        // E4 -> E4 -> G4
        assert_eq!(resolve(64, Direction::Up, 2, &chord), 67);
        // A4 -> C5 -> E5
        assert_eq!(resolve(69, Direction::Up, 2, &chord), 76);
    }

    #[test]
    fn test_octave_offset_is_unclamped() {
        let chord = c_major();
        assert_eq!(t_voice_note(61, Direction::Up, 1, &chord, -1), 52);
        assert_eq!(t_voice_note(125, Direction::Up, 1, &chord, 3), 163);
    }

    #[test]
    fn test_step_distance_bounds() {
        let chord = Chord::from_triad(65, TriadType::Minor);
        for note in 0..128 {
            let up = step_up(note, &chord) - note;
            let down = note - step_down(note, &chord);
            assert!((0..12).contains(&up));
            assert!((0..12).contains(&down));
            assert!(chord.contains(note + up));
            assert!(chord.contains(note - down));
        }
    }

    #[test]
    fn test_orbit_alternates_on_note_on() {
        let mut leader = VoiceLeader::new();
        assert_eq!(leader.note_on(VoiceMode::Orbit), Some(Direction::Up));
        assert_eq!(leader.note_on(VoiceMode::Orbit), Some(Direction::Down));
        assert_eq!(leader.note_on(VoiceMode::Orbit), Some(Direction::Up));
        assert_eq!(leader.orbit_counter(), 3);
    }

    #[test]
    fn test_release_returns_held_pitches() {
        let mut leader = VoiceLeader::new();
        leader.hold(0, 62, &[64]);
        leader.hold(0, 65, &[64, 67]);

        // Overlapping release order does not swap pitches
        assert_eq!(leader.release(0, 62).map(|h| h.notes().to_vec()), Some(vec![64]));
        assert_eq!(
            leader.release(0, 65).map(|h| h.notes().to_vec()),
            Some(vec![64, 67])
        );
        assert_eq!(leader.release(0, 65), None);
        assert_eq!(leader.held_count(), 0);
    }

    #[test]
    fn test_held_pitches_are_per_channel() {
        let mut leader = VoiceLeader::new();
        leader.hold(0, 60, &[64]);
        leader.hold(9, 60, &[67]);
        assert_eq!(leader.held_count(), 2);
        assert_eq!(leader.release(9, 60).map(|h| h.notes().to_vec()), Some(vec![67]));
        assert_eq!(leader.release(0, 60).map(|h| h.notes().to_vec()), Some(vec![64]));
    }

    #[test]
    fn test_held_voices_truncate_to_capacity() {
        let held = HeldVoices::from_notes(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(held.notes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_orphan_note_off_uses_current_parity() {
        let mut leader = VoiceLeader::new();
        assert_eq!(leader.orphan_direction(VoiceMode::Orbit), Some(Direction::Up));
        leader.note_on(VoiceMode::Orbit);
        assert_eq!(leader.orphan_direction(VoiceMode::Orbit), Some(Direction::Down));
        assert_eq!(leader.orbit_counter(), 1);
    }

    #[test]
    fn test_fixed_modes_and_none() {
        let mut leader = VoiceLeader::new();
        assert_eq!(leader.note_on(VoiceMode::Plus2), Some(Direction::Up));
        assert_eq!(leader.note_on(VoiceMode::Minus1), Some(Direction::Down));
        assert_eq!(leader.note_on(VoiceMode::None), None);
        assert_eq!(leader.orphan_direction(VoiceMode::None), None);
        assert_eq!(leader.orphan_direction(VoiceMode::Minus2), Some(Direction::Down));
        assert_eq!(leader.orbit_counter(), 0);
    }

    #[test]
    fn test_reset_clears_parity_and_held_notes() {
        let mut leader = VoiceLeader::new();
        leader.note_on(VoiceMode::Orbit);
        leader.hold(0, 60, &[64]);
        leader.hold(1, 61, &[64]);
        leader.reset();
        assert_eq!(leader.orbit_counter(), 0);
        assert_eq!(leader.held_count(), 0);
        assert_eq!(leader.note_on(VoiceMode::Orbit), Some(Direction::Up));
    }

    #[test]
    fn test_mode_index_clamps() {
        assert_eq!(VoiceMode::from_index(-4), VoiceMode::None);
        assert_eq!(VoiceMode::from_index(5), VoiceMode::Orbit);
        assert_eq!(VoiceMode::from_index(42), VoiceMode::Orbit);
        assert_eq!(VoiceMode::Minus2.index(), 4);
    }
}
