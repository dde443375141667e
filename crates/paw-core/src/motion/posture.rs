//! Static joint configurations

use serde::{Deserialize, Serialize};

use crate::hardware::{angle_limits, Joint, NUM_JOINTS};

/// A target angle per joint (degrees, FL/FR/RL/RR order)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; NUM_JOINTS]")]
pub struct Posture([f64; NUM_JOINTS]);

impl Posture {
    /// Standing rest: front legs slightly forward for stability
    pub const HOME: Self = Self([85.0, 95.0, 90.0, 90.0]);
    /// Rear legs folded, front legs slightly forward
    pub const SIT: Self = Self([100.0, 80.0, 120.0, 120.0]);
    /// All legs out to the side
    pub const LAY_DOWN: Self = Self([120.0, 60.0, 120.0, 60.0]);
    /// Play bow: front down, rear up
    pub const BOW: Self = Self([110.0, 70.0, 90.0, 90.0]);
    pub const CROUCH: Self = Self([110.0, 70.0, 110.0, 70.0]);
    pub const EXTEND: Self = Self([70.0, 110.0, 70.0, 110.0]);
    pub const NEUTRAL: Self = Self([90.0; NUM_JOINTS]);

    /// Weight on the right side, left front paw free
    pub const SHIFT_FOR_LEFT_PAW: Self = Self([90.0, 100.0, 95.0, 100.0]);
    /// Weight on the left side, right front paw free
    pub const SHIFT_FOR_RIGHT_PAW: Self = Self([100.0, 90.0, 100.0, 95.0]);
    pub const LEFT_PAW_RAISED: Self = Self([60.0, 100.0, 95.0, 100.0]);
    pub const RIGHT_PAW_RAISED: Self = Self([100.0, 120.0, 100.0, 95.0]);

    /// Build a posture, clamping each angle into servo range
    pub fn new(angles: [f64; NUM_JOINTS]) -> Self {
        Self(angles.map(|a| a.clamp(angle_limits::MIN, angle_limits::MAX)))
    }

    pub fn angle(&self, joint: Joint) -> f64 {
        self.0[joint.index()]
    }

    pub fn angles(&self) -> &[f64; NUM_JOINTS] {
        &self.0
    }

    /// Copy with one joint replaced (clamped)
    pub fn with_angle(mut self, joint: Joint, angle: f64) -> Self {
        self.0[joint.index()] = angle.clamp(angle_limits::MIN, angle_limits::MAX);
        self
    }
}

impl From<[f64; NUM_JOINTS]> for Posture {
    fn from(angles: [f64; NUM_JOINTS]) -> Self {
        Self::new(angles)
    }
}

impl Default for Posture {
    fn default() -> Self {
        Self::HOME
    }
}
