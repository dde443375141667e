//! Hardware abstraction for the four leg servos
//!
//! Joint identity, the per-joint oscillator, the servo bank shared between
//! the worker and callers, and the traits for the external collaborators
//! (servo driver, calibration storage, power telemetry).

mod bank;
pub mod mock;
mod oscillator;
mod traits;

pub use bank::ServoBank;
pub use oscillator::Oscillator;
pub use traits::{BatteryLevel, PowerSource, ServoDriver, TrimStore, Trims};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Number of leg servos
pub const NUM_JOINTS: usize = 4;

/// Neutral servo angle; oscillations are centered here
pub const CENTER_ANGLE: f64 = 90.0;

/// Servo travel limits (degrees)
pub mod angle_limits {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 180.0;
}

/// Trim limits (degrees)
pub mod trim_limits {
    pub const MIN: i32 = -50;
    pub const MAX: i32 = 50;
}

/// Joint names, indexed by [`Joint::index`]
pub const JOINT_NAMES: [&str; NUM_JOINTS] = ["front_left", "front_right", "rear_left", "rear_right"];

/// One of the four leg joints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    FrontLeft = 0,
    FrontRight = 1,
    RearLeft = 2,
    RearRight = 3,
}

impl Joint {
    pub const ALL: [Joint; NUM_JOINTS] = [
        Joint::FrontLeft,
        Joint::FrontRight,
        Joint::RearLeft,
        Joint::RearRight,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        JOINT_NAMES[self.index()]
    }

    /// Look up a joint by its tool-surface name
    pub fn from_name(name: &str) -> Result<Self> {
        joint_index_by_name(name)
            .and_then(Self::from_index)
            .ok_or_else(|| Error::InvalidJoint(name.to_string()))
    }

    pub fn is_front(self) -> bool {
        matches!(self, Joint::FrontLeft | Joint::FrontRight)
    }

    pub fn is_left(self) -> bool {
        matches!(self, Joint::FrontLeft | Joint::RearLeft)
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Get joint index by name
pub fn joint_index_by_name(name: &str) -> Option<usize> {
    JOINT_NAMES.iter().position(|&n| n == name)
}
