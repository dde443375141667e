//! Collaborator traits
//!
//! The engine only needs three things from the outside world: somewhere to
//! send servo angles, somewhere to persist trims, and a battery reading.

use serde::{Deserialize, Serialize};

use super::{Joint, NUM_JOINTS};
use crate::Result;

/// Per-joint calibration offsets in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trims {
    pub front_left: i32,
    pub front_right: i32,
    pub rear_left: i32,
    pub rear_right: i32,
}

impl Trims {
    pub fn from_array(values: [i32; NUM_JOINTS]) -> Self {
        Self {
            front_left: values[0],
            front_right: values[1],
            rear_left: values[2],
            rear_right: values[3],
        }
    }

    pub fn to_array(self) -> [i32; NUM_JOINTS] {
        [
            self.front_left,
            self.front_right,
            self.rear_left,
            self.rear_right,
        ]
    }

    pub fn get(&self, joint: Joint) -> i32 {
        self.to_array()[joint.index()]
    }

    pub fn set(&mut self, joint: Joint, value: i32) {
        let mut values = self.to_array();
        values[joint.index()] = value;
        *self = Self::from_array(values);
    }
}

/// Battery reading supplied by the power collaborator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryLevel {
    /// Charge percentage, 0-100
    pub level: u8,
    pub charging: bool,
}

/// Low-level servo output (PWM generation lives behind this trait)
pub trait ServoDriver: Send + Sync {
    /// Start driving the servo on `pin`
    fn attach(&self, pin: u8) -> Result<()>;

    /// Release the servo on `pin`
    fn detach(&self, pin: u8) -> Result<()>;

    /// Command an absolute angle in degrees, trim already applied
    fn write_angle(&self, pin: u8, angle: f64) -> Result<()>;

    /// Driver name for logging
    fn name(&self) -> &str;
}

/// Persistent calibration storage
pub trait TrimStore: Send + Sync {
    /// Load the stored trims (zeros when nothing was saved)
    fn load(&self) -> Result<Trims>;

    /// Persist all four trims
    fn save(&self, trims: &Trims) -> Result<()>;
}

/// Battery telemetry
pub trait PowerSource: Send + Sync {
    fn battery_level(&self) -> Result<BatteryLevel>;
}
