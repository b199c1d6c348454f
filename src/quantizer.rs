// src/quantizer.rs
//
// Scale quantizer for incoming M-voice pitches.

use serde::{Deserialize, Serialize};

const CHROMATIC: &[i32] = &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];
const MAJOR: &[i32] = &[0, 2, 4, 5, 7, 9, 11];
const NATURAL_MINOR: &[i32] = &[0, 2, 3, 5, 7, 8, 10];
const DORIAN: &[i32] = &[0, 2, 3, 5, 7, 9, 10];
const PHRYGIAN: &[i32] = &[0, 1, 3, 5, 7, 8, 10];
const LYDIAN: &[i32] = &[0, 2, 4, 6, 7, 9, 11];
const MIXOLYDIAN: &[i32] = &[0, 2, 4, 5, 7, 9, 10];
const LOCRIAN: &[i32] = &[0, 1, 3, 5, 6, 8, 10];
const PENTATONIC_MAJOR: &[i32] = &[0, 2, 4, 7, 9];
const PENTATONIC_MINOR: &[i32] = &[0, 3, 5, 7, 10];

/// Quantizer scale, indexed 0..=9 by hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    /// No quantization.
    #[default]
    Chromatic,
    Major,
    NaturalMinor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Locrian,
    PentatonicMajor,
    PentatonicMinor,
}

impl Scale {
    pub const ALL: [Scale; 10] = [
        Scale::Chromatic,
        Scale::Major,
        Scale::NaturalMinor,
        Scale::Dorian,
        Scale::Phrygian,
        Scale::Lydian,
        Scale::Mixolydian,
        Scale::Locrian,
        Scale::PentatonicMajor,
        Scale::PentatonicMinor,
    ];

    /// Unknown indices fall back to chromatic.
    pub fn from_index(index: i32) -> Self {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or(Scale::Chromatic)
    }

    pub fn index(self) -> i32 {
        self as i32
    }

    /// Semitone offsets from the tonic, in listing order.
    pub fn intervals(self) -> &'static [i32] {
        match self {
            Scale::Chromatic => CHROMATIC,
            Scale::Major => MAJOR,
            Scale::NaturalMinor => NATURAL_MINOR,
            Scale::Dorian => DORIAN,
            Scale::Phrygian => PHRYGIAN,
            Scale::Lydian => LYDIAN,
            Scale::Mixolydian => MIXOLYDIAN,
            Scale::Locrian => LOCRIAN,
            Scale::PentatonicMajor => PENTATONIC_MAJOR,
            Scale::PentatonicMinor => PENTATONIC_MINOR,
        }
    }
}

#[inline]
pub(crate) fn pitch_class(note: i32) -> i32 {
    note.rem_euclid(12)
}

/// Snap `note` upward onto `scale`, using `root_note` as the tonic.
///
/// The result is rebuilt from the raw input's octave band plus the tonic
/// pitch-class plus the matched degree, so it can land in the octave above
/// the input when the tonic pitch-class is high. Ties keep the first scale
/// member in listing order.
pub fn quantize(note: i32, scale: Scale, root_note: i32) -> i32 {
    if scale == Scale::Chromatic {
        return note;
    }

    let intervals = scale.intervals();
    let input_pc = pitch_class(note - root_note);

    let mut best_degree = intervals[0];
    let mut best_distance = i32::MAX;

    for &degree in intervals {
        let distance = (degree - input_pc).rem_euclid(12);
        if distance < best_distance {
            best_distance = distance;
            best_degree = degree;
        }
    }

    let base_octave = note / 12;
    let tonic_pc = pitch_class(root_note);

    base_octave * 12 + tonic_pc + best_degree
}
