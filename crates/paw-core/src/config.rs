//! Controller configuration
//!
//! Timing constants encode the refresh budget of the servo hardware, so they
//! live here instead of as literals in the executor.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::hardware::NUM_JOINTS;
use crate::{Error, Result};

/// Fixed cadences and retry budgets used by the executor and the worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Interpolated move step (ms)
    pub interpolation_tick_ms: u64,
    /// Oscillator refresh cadence (ms)
    pub oscillation_tick_ms: u64,
    /// Pause after each action before the worker polls again (ms)
    pub inter_action_delay_ms: u64,
    /// How long the worker waits on an empty queue per poll (ms)
    pub queue_poll_ms: u64,
    /// Pause after a full `execute` call (ms)
    pub execute_settle_ms: u64,
    /// Maximum forced re-targeting passes after an interpolated move
    pub settle_retries: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            interpolation_tick_ms: 10,
            oscillation_tick_ms: 5,
            inter_action_delay_ms: 20,
            queue_poll_ms: 1000,
            execute_settle_ms: 10,
            settle_retries: 10,
        }
    }
}

impl TimingConfig {
    pub fn interpolation_tick(&self) -> Duration {
        Duration::from_millis(self.interpolation_tick_ms)
    }

    pub fn oscillation_tick(&self) -> Duration {
        Duration::from_millis(self.oscillation_tick_ms)
    }

    pub fn inter_action_delay(&self) -> Duration {
        Duration::from_millis(self.inter_action_delay_ms)
    }

    pub fn queue_poll(&self) -> Duration {
        Duration::from_millis(self.queue_poll_ms)
    }

    pub fn execute_settle(&self) -> Duration {
        Duration::from_millis(self.execute_settle_ms)
    }
}

/// Configuration for a [`DogController`](crate::control::DogController)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DogConfig {
    /// Servo pin per joint in FL, FR, RL, RR order. `None` = unconnected.
    pub pins: [Option<u8>; NUM_JOINTS],
    /// Pending-action capacity of the queue
    pub queue_capacity: usize,
    /// Queue a Home action as soon as the controller is built
    pub home_on_start: bool,
    /// Servo speed limit in degrees/second (disabled when `None`)
    pub servo_limit_dps: Option<f64>,
    /// Tick and retry constants
    pub timing: TimingConfig,
}

impl Default for DogConfig {
    fn default() -> Self {
        Self {
            pins: [Some(17), Some(18), Some(8), Some(12)],
            queue_capacity: 10,
            home_on_start: true,
            servo_limit_dps: None,
            timing: TimingConfig::default(),
        }
    }
}

impl DogConfig {
    /// Speed limit the firmware applies when the limiter is switched on
    pub const DEFAULT_SERVO_LIMIT_DPS: f64 = 240.0;

    /// Create a config with the given pins (FL, FR, RL, RR)
    pub fn new(pins: [Option<u8>; NUM_JOINTS]) -> Self {
        Self {
            pins,
            ..Default::default()
        }
    }

    /// Parse a (possibly partial) JSON document; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    /// Set the queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Enable or disable the startup Home action
    pub fn with_home_on_start(mut self, enabled: bool) -> Self {
        self.home_on_start = enabled;
        self
    }

    /// Enable the servo speed limiter
    pub fn with_servo_limit(mut self, degrees_per_sec: f64) -> Self {
        self.servo_limit_dps = Some(degrees_per_sec);
        self
    }

    /// Replace the timing constants
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Reject configurations the worker cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(Error::Config("queue_capacity must be at least 1".into()));
        }
        if self.timing.interpolation_tick_ms == 0 || self.timing.oscillation_tick_ms == 0 {
            return Err(Error::Config("tick periods must be non-zero".into()));
        }
        if let Some(dps) = self.servo_limit_dps {
            if !(dps > 0.0) {
                return Err(Error::Config(format!(
                    "servo_limit_dps must be positive, got {}",
                    dps
                )));
            }
        }
        Ok(())
    }
}
