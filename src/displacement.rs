// src/displacement.rs
//
// Rhythmic displacement of the T-voice relative to the M-voice.

use serde::{Deserialize, Serialize};

use crate::transport::Transport;

pub const SYNC_TABLE_LEN: usize = 16;

/// Beat lengths selectable for tempo-synced displacement.
///
/// The sub-beat rows are quarter-note fractions divided by four again, so
/// the "1/16" row is 1/16 of a beat. Hosts and presets depend on these exact
/// values.
pub const SYNC_BEATS: [f64; SYNC_TABLE_LEN] = [
    0.25 / 4.0,               // 1/16
    0.25 / 4.0 * 1.5,         // 1/16 dotted
    0.25 / 4.0 * (2.0 / 3.0), // 1/16 triplet
    0.5 / 4.0,                // 1/8
    0.5 / 4.0 * 1.5,          // 1/8 dotted
    0.5 / 4.0 * (2.0 / 3.0),  // 1/8 triplet
    1.0,                      // 1/4
    1.0 * 1.5,                // 1/4 dotted
    1.0 * (2.0 / 3.0),        // 1/4 triplet
    2.0,                      // 1/2
    2.0 * 1.5,                // 1/2 dotted
    2.0 * (2.0 / 3.0),        // 1/2 triplet
    4.0,                      // 1 bar
    8.0,                      // 2 bars
    12.0,                     // 3 bars
    16.0,                     // 4 bars
];

pub const SYNC_LABELS: [&str; SYNC_TABLE_LEN] = [
    "1/16", "1/16.", "1/16T", "1/8", "1/8.", "1/8T", "1/4", "1/4.", "1/4T", "1/2", "1/2.",
    "1/2T", "1 bar", "2 bars", "3 bars", "4 bars",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplacementMode {
    #[default]
    None,
    /// Tempo-synced, from `SYNC_BEATS`.
    Sync,
    /// Fixed milliseconds.
    Absolute,
}

impl DisplacementMode {
    pub fn from_index(index: i32) -> Self {
        match index {
            i32::MIN..=0 => DisplacementMode::None,
            1 => DisplacementMode::Sync,
            _ => DisplacementMode::Absolute,
        }
    }
}

/// Displacement setting resolved against the host transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Displacement {
    pub mode: DisplacementMode,
    pub sync_index: i32,
    pub absolute_ms: f64,
}

/// Beat length for a sync-table index, clamped into the table.
pub fn sync_beats(index: i32) -> f64 {
    SYNC_BEATS[index.clamp(0, SYNC_TABLE_LEN as i32 - 1) as usize]
}

impl Displacement {
    /// Delay in seconds, never negative.
    pub fn delay_seconds(&self, transport: &Transport) -> f64 {
        let seconds = match self.mode {
            DisplacementMode::None => 0.0,
            DisplacementMode::Absolute => self.absolute_ms / 1000.0,
            DisplacementMode::Sync => transport.beats_to_seconds(sync_beats(self.sync_index)),
        };

        if seconds.is_finite() { seconds.max(0.0) } else { 0.0 }
    }

    /// Delay in whole samples at the transport's sample rate.
    #[inline]
    pub fn delay_samples(&self, transport: &Transport) -> usize {
        transport.seconds_to_samples(self.delay_seconds(transport))
    }
}
