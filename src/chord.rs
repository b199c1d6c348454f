// src/chord.rs

use serde::{Deserialize, Serialize};

use crate::quantizer::pitch_class;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriadType {
    #[default]
    Major,
    Minor,
}

impl TriadType {
    /// Out-of-range indices clamp to the nearest variant.
    pub fn from_index(index: i32) -> Self {
        if index <= 0 {
            TriadType::Major
        } else {
            TriadType::Minor
        }
    }

    /// Semitone offsets of root, third and fifth.
    pub fn intervals(self) -> [i32; 3] {
        match self {
            TriadType::Major => [0, 4, 7],
            TriadType::Minor => [0, 3, 7],
        }
    }
}

/// The active tonic triad, as three pitch-classes (0..=11).
///
/// Rebuilt from settings every block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chord {
    pitch_classes: [i32; 3],
}

impl Default for Chord {
    fn default() -> Self {
        Self::from_triad(60, TriadType::Major)
    }
}

impl Chord {
    pub fn from_triad(root_note: i32, triad: TriadType) -> Self {
        let root_pc = pitch_class(root_note);
        let pitch_classes = triad.intervals().map(|offset| (root_pc + offset) % 12);
        Self { pitch_classes }
    }

    #[inline]
    pub fn set_from_triad(&mut self, root_note: i32, triad: TriadType) {
        *self = Self::from_triad(root_note, triad);
    }

    /// Root, third, fifth.
    #[inline]
    pub fn pitch_classes(&self) -> [i32; 3] {
        self.pitch_classes
    }

    pub fn contains(&self, note: i32) -> bool {
        self.pitch_classes.contains(&pitch_class(note))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_major_and_minor() {
        assert_eq!(
            Chord::from_triad(60, TriadType::Major).pitch_classes(),
            [0, 4, 7]
        );
        assert_eq!(
            Chord::from_triad(60, TriadType::Minor).pitch_classes(),
            [0, 3, 7]
        );
    }

    #[test]
    fn test_wraps_past_octave() {
        // A major: A C# E
        assert_eq!(
            Chord::from_triad(69, TriadType::Major).pitch_classes(),
            [9, 1, 4]
        );
        // B minor: B D F#
        assert_eq!(
            Chord::from_triad(47, TriadType::Minor).pitch_classes(),
            [11, 2, 6]
        );
    }

    #[test]
    fn test_always_three_distinct_tones() {
        for root in 0..128 {
            for triad in [TriadType::Major, TriadType::Minor] {
                let [a, b, c] = Chord::from_triad(root, triad).pitch_classes();
                assert!(a != b && b != c && a != c);
            }
        }
    }

    #[test]
    fn test_contains() {
        let chord = Chord::from_triad(62, TriadType::Minor);
        assert!(chord.contains(62));
        assert!(chord.contains(65));
        assert!(chord.contains(57));
        assert!(!chord.contains(64));
    }
}
