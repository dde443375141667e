//! The four leg oscillators behind one lock
//!
//! The worker drives the bank tick by tick; callers only touch trims and
//! read positions. Each call locks briefly so a trim change lands on the
//! very next write, even mid-oscillation.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use super::{Joint, Oscillator, ServoDriver, Trims, NUM_JOINTS};
use crate::motion::{OscillatorProfile, Posture};
use crate::Result;

/// Shared handle to the leg oscillators
#[derive(Debug, Clone)]
pub struct ServoBank {
    joints: Arc<Mutex<[Oscillator; NUM_JOINTS]>>,
    driver_name: Arc<str>,
}

impl ServoBank {
    /// Create the bank with fixed pin identity and zero trim
    pub fn new(pins: [Option<u8>; NUM_JOINTS], driver: Arc<dyn ServoDriver>) -> Self {
        let driver_name: Arc<str> = driver.name().into();
        let joints = std::array::from_fn(|i| {
            Oscillator::new(Joint::ALL[i], pins[i], driver.clone())
        });
        Self {
            joints: Arc::new(Mutex::new(joints)),
            driver_name,
        }
    }

    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    pub fn attach_all(&self) -> Result<()> {
        for osc in self.joints.lock().iter_mut() {
            osc.attach()?;
        }
        Ok(())
    }

    pub fn detach_all(&self) -> Result<()> {
        for osc in self.joints.lock().iter_mut() {
            osc.detach()?;
        }
        Ok(())
    }

    /// Pins per joint (`None` for unconnected joints)
    pub fn pins(&self) -> [Option<u8>; NUM_JOINTS] {
        let joints = self.joints.lock();
        std::array::from_fn(|i| joints[i].pin())
    }

    /// Last commanded angle per joint, without trim
    pub fn positions(&self) -> [f64; NUM_JOINTS] {
        let joints = self.joints.lock();
        std::array::from_fn(|i| joints[i].position())
    }

    pub fn position(&self, joint: Joint) -> f64 {
        self.joints.lock()[joint.index()].position()
    }

    /// Command absolute angles; unconnected joints are skipped
    pub fn set_positions(&self, angles: &[f64; NUM_JOINTS], now: Duration) -> Result<()> {
        for (osc, &angle) in self.joints.lock().iter_mut().zip(angles) {
            osc.set_position(angle, now)?;
        }
        Ok(())
    }

    pub fn set_position(&self, joint: Joint, angle: f64, now: Duration) -> Result<()> {
        self.joints.lock()[joint.index()].set_position(angle, now)
    }

    /// Largest |target - position| over connected joints
    pub fn max_error(&self, target: &Posture) -> f64 {
        self.joints
            .lock()
            .iter()
            .filter(|osc| osc.is_connected())
            .map(|osc| (target.angle(osc.joint()) - osc.position()).abs())
            .fold(0.0, f64::max)
    }

    /// Load a profile into every oscillator, restarting its time base
    pub fn apply_profile(&self, profile: &OscillatorProfile) {
        for osc in self.joints.lock().iter_mut() {
            let wave = profile.wave(osc.joint());
            osc.set_parameters(wave.offset, wave.amplitude, profile.period_ms as f64, wave.phase);
        }
    }

    /// Refresh every oscillator against the same time stamp
    pub fn refresh_all(&self, now: Duration) -> Result<()> {
        for osc in self.joints.lock().iter_mut() {
            osc.refresh(now)?;
        }
        Ok(())
    }

    pub fn trims(&self) -> Trims {
        let joints = self.joints.lock();
        Trims::from_array(std::array::from_fn(|i| joints[i].trim()))
    }

    pub fn set_trims(&self, trims: &Trims) {
        for (osc, value) in self.joints.lock().iter_mut().zip(trims.to_array()) {
            osc.set_trim(value);
        }
    }

    pub fn set_trim(&self, joint: Joint, value: i32) {
        self.joints.lock()[joint.index()].set_trim(value);
    }

    pub fn enable_limiter(&self, degrees_per_sec: f64) {
        for osc in self.joints.lock().iter_mut() {
            osc.set_limiter(degrees_per_sec);
        }
    }

    pub fn disable_limiter(&self) {
        for osc in self.joints.lock().iter_mut() {
            osc.disable_limiter();
        }
    }
}
