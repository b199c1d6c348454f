// src/velocity.rs

use serde::{Deserialize, Serialize};

pub const MIN_VELOCITY: u8 = 1;
pub const MAX_VELOCITY: u8 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityMode {
    /// Use the M-voice velocity.
    #[default]
    Follow,
    /// M-voice velocity times a factor in [0, 1].
    Scaled,
    /// Constant velocity.
    Fixed,
}

impl VelocityMode {
    pub fn from_index(index: i32) -> Self {
        match index {
            i32::MIN..=0 => VelocityMode::Follow,
            1 => VelocityMode::Scaled,
            _ => VelocityMode::Fixed,
        }
    }
}

/// Velocity policy for T-voice note-ons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityPolicy {
    pub mode: VelocityMode,
    pub scale: f32,
    pub fixed: i32,
}

impl VelocityPolicy {
    /// Output velocity, always in [1, 127].
    pub fn apply(&self, input: u8) -> u8 {
        let raw = match self.mode {
            VelocityMode::Follow => i32::from(input),
            VelocityMode::Scaled => (f32::from(input) * self.scale).round() as i32,
            VelocityMode::Fixed => self.fixed,
        };
        clamp_velocity(raw)
    }
}

#[inline]
pub fn clamp_velocity(v: i32) -> u8 {
    v.clamp(i32::from(MIN_VELOCITY), i32::from(MAX_VELOCITY)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(mode: VelocityMode, scale: f32, fixed: i32) -> VelocityPolicy {
        VelocityPolicy { mode, scale, fixed }
    }

    #[test]
    fn test_fixed_ignores_input() {
        let p = policy(VelocityMode::Fixed, 1.0, 90);
        for v in 0..=127u8 {
            assert_eq!(p.apply(v), 90);
        }
    }

    #[test]
    fn test_scaled_rounds() {
        assert_eq!(policy(VelocityMode::Scaled, 0.5, 90).apply(100), 50);
        assert_eq!(policy(VelocityMode::Scaled, 0.5, 90).apply(101), 51);
        // Scaled to nothing still sounds
        assert_eq!(policy(VelocityMode::Scaled, 0.0, 90).apply(100), 1);
    }

    #[test]
    fn test_follow_clamps() {
        let p = policy(VelocityMode::Follow, 1.0, 90);
        assert_eq!(p.apply(0), 1);
        assert_eq!(p.apply(64), 64);
        assert_eq!(p.apply(127), 127);
    }

    #[test]
    fn test_fixed_out_of_range_clamps() {
        assert_eq!(policy(VelocityMode::Fixed, 1.0, 300).apply(10), 127);
        assert_eq!(policy(VelocityMode::Fixed, 1.0, -5).apply(10), 1);
    }
}
