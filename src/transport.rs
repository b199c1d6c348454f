// src/transport.rs

//
// ===============================
// MARK: Sample-domain transport
// ===============================
//

/// Host tempo and sample clock as seen by the engine.
///
/// This struct:
/// - is real-time safe
/// - is copyable
/// - is refreshed from the host once per block
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transport {
    /// Absolute sample position of the current block start
    pub sample_pos: u64,

    /// Host tempo
    pub bpm: f64,

    /// Sample rate (Hz)
    pub sample_rate: f64,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            sample_pos: 0,
            bpm: 120.0,
            sample_rate: 48_000.0,
        }
    }
}

impl Transport {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    /// Absolute time in seconds.
    #[inline]
    pub fn seconds(&self) -> f64 {
        if self.sample_rate > 0.0 {
            self.sample_pos as f64 / self.sample_rate
        } else {
            0.0
        }
    }

    // -------------------------------
    // MARK: Conversions
    // -------------------------------

    /// Length of `beats` in seconds at the current tempo.
    ///
    /// Non-positive or non-finite tempo yields zero.
    #[inline]
    pub fn beats_to_seconds(&self, beats: f64) -> f64 {
        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            return 0.0;
        }
        beats * 60.0 / self.bpm
    }

    /// `round(seconds * sample_rate)`, floored at zero.
    #[inline]
    pub fn seconds_to_samples(&self, seconds: f64) -> usize {
        let samples = (seconds * self.sample_rate).round();
        if samples.is_finite() && samples > 0.0 {
            samples as usize
        } else {
            0
        }
    }

    // -------------------------------
    // MARK: Time advancement
    // -------------------------------

    /// Advance the sample clock by one processed block.
    pub fn advance_samples(&mut self, frames: usize) {
        self.sample_pos += frames as u64;
    }

    /// Rewind to the start (transport stop / seek).
    pub fn rewind(&mut self) {
        self.sample_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beats_to_seconds() {
        let t = Transport::default();
        assert_eq!(t.beats_to_seconds(1.0), 0.5);
        assert_eq!(t.beats_to_seconds(4.0), 2.0);
    }

    #[test]
    fn test_degenerate_tempo_is_zero() {
        for bpm in [0.0, -90.0, f64::NAN, f64::INFINITY] {
            let t = Transport { bpm, ..Transport::default() };
            assert_eq!(t.beats_to_seconds(1.0), 0.0);
        }
    }

    #[test]
    fn test_seconds_to_samples_rounds_and_floors() {
        let t = Transport::new(44_100.0);
        assert_eq!(t.seconds_to_samples(0.5), 22_050);
        assert_eq!(t.seconds_to_samples(1.0 / 44_100.0 * 0.6), 1);
        assert_eq!(t.seconds_to_samples(-1.0), 0);
        assert_eq!(t.seconds_to_samples(f64::NAN), 0);
    }

    #[test]
    fn test_advance_and_rewind() {
        let mut t = Transport::new(48_000.0);
        t.advance_samples(24_000);
        assert_eq!(t.seconds(), 0.5);
        t.rewind();
        assert_eq!(t.sample_pos, 0);
    }
}
