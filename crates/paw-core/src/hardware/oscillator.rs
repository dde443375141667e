//! Per-joint sinusoidal position generator
//!
//! Drives one servo to `90 + offset + amplitude * sin(2π·t/period + phase)`,
//! or to an absolute angle for interpolated moves. Trim is added at write
//! time so every target, static or oscillating, is shifted the same way.

use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::{angle_limits, Joint, ServoDriver, CENTER_ANGLE};
use crate::Result;

/// Minimum per-write step allowed by the limiter (degrees)
const MIN_LIMITED_STEP: f64 = 1.0;

/// One joint's oscillator
///
/// A joint without a pin is "unconnected": every operation is a silent no-op.
pub struct Oscillator {
    joint: Joint,
    pin: Option<u8>,
    driver: Arc<dyn ServoDriver>,
    attached: bool,
    amplitude: f64,
    offset: f64,
    period_ms: f64,
    phase: f64,
    /// Time base of the current wave, latched on the first refresh
    origin: Option<Duration>,
    /// Last commanded angle, without trim
    position: f64,
    trim: i32,
    limit_dps: Option<f64>,
    last_write: Option<Duration>,
}

impl fmt::Debug for Oscillator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Oscillator")
            .field("joint", &self.joint)
            .field("pin", &self.pin)
            .field("attached", &self.attached)
            .field("position", &self.position)
            .field("trim", &self.trim)
            .field("limit_dps", &self.limit_dps)
            .finish_non_exhaustive()
    }
}

impl Oscillator {
    pub fn new(joint: Joint, pin: Option<u8>, driver: Arc<dyn ServoDriver>) -> Self {
        Self {
            joint,
            pin,
            driver,
            attached: false,
            amplitude: 0.0,
            offset: 0.0,
            period_ms: 2000.0,
            phase: 0.0,
            origin: None,
            position: CENTER_ANGLE,
            trim: 0,
            limit_dps: None,
            last_write: None,
        }
    }

    pub fn joint(&self) -> Joint {
        self.joint
    }

    pub fn pin(&self) -> Option<u8> {
        self.pin
    }

    pub fn is_connected(&self) -> bool {
        self.pin.is_some()
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn attach(&mut self) -> Result<()> {
        if let (Some(pin), false) = (self.pin, self.attached) {
            self.driver.attach(pin)?;
            self.attached = true;
        }
        Ok(())
    }

    pub fn detach(&mut self) -> Result<()> {
        if let (Some(pin), true) = (self.pin, self.attached) {
            self.driver.detach(pin)?;
            self.attached = false;
        }
        Ok(())
    }

    /// Configure the wave. No motion happens until the next refresh.
    pub fn set_parameters(&mut self, offset: f64, amplitude: f64, period_ms: f64, phase: f64) {
        self.offset = offset;
        self.amplitude = amplitude;
        self.period_ms = period_ms.max(1.0);
        self.phase = phase;
        self.origin = None;
    }

    /// Untrimmed wave value `t_ms` after the wave origin
    pub fn wave_at(&self, t_ms: f64) -> f64 {
        CENTER_ANGLE + self.offset + self.amplitude * (TAU * t_ms / self.period_ms + self.phase).sin()
    }

    /// Advance the wave to `now` and command the resulting angle
    pub fn refresh(&mut self, now: Duration) -> Result<()> {
        if !self.is_connected() {
            return Ok(());
        }
        let origin = *self.origin.get_or_insert(now);
        let t_ms = now.saturating_sub(origin).as_secs_f64() * 1000.0;
        let target = self.wave_at(t_ms);
        self.write(target, now)
    }

    /// Last commanded angle (without trim)
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Command an absolute angle
    pub fn set_position(&mut self, angle: f64, now: Duration) -> Result<()> {
        if !self.is_connected() {
            return Ok(());
        }
        self.write(angle, now)
    }

    pub fn trim(&self) -> i32 {
        self.trim
    }

    /// Bias the zero point; takes effect on the next write
    pub fn set_trim(&mut self, trim: i32) {
        self.trim = trim;
    }

    pub fn set_limiter(&mut self, degrees_per_sec: f64) {
        self.limit_dps = Some(degrees_per_sec);
    }

    pub fn disable_limiter(&mut self) {
        self.limit_dps = None;
    }

    fn write(&mut self, target: f64, now: Duration) -> Result<()> {
        let Some(pin) = self.pin else {
            return Ok(());
        };
        if !self.attached {
            return Ok(());
        }

        self.position = match (self.limit_dps, self.last_write) {
            (Some(dps), Some(last)) => {
                let dt = now.saturating_sub(last).as_secs_f64();
                let max_step = (dps * dt).max(MIN_LIMITED_STEP);
                let diff = target - self.position;
                if diff.abs() > max_step {
                    self.position + max_step.copysign(diff)
                } else {
                    target
                }
            }
            _ => target,
        };
        self.last_write = Some(now);

        let output = (self.position + self.trim as f64).clamp(angle_limits::MIN, angle_limits::MAX);
        tracing::trace!("{} (pin {}) -> {:.1}°", self.joint, pin, output);
        self.driver.write_angle(pin, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::mock::MockServoDriver;
    use approx::assert_relative_eq;

    fn attached(pin: Option<u8>) -> (Arc<MockServoDriver>, Oscillator) {
        let driver = Arc::new(MockServoDriver::new());
        let mut osc = Oscillator::new(Joint::FrontLeft, pin, driver.clone());
        osc.attach().unwrap();
        (driver, osc)
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_wave_follows_sine() {
        let (driver, mut osc) = attached(Some(5));
        osc.set_parameters(0.0, 25.0, 600.0, 0.0);

        osc.refresh(ms(1000)).unwrap(); // latches origin, t = 0
        assert_relative_eq!(driver.last_angle(5).unwrap(), 90.0, epsilon = 1e-9);

        osc.refresh(ms(1150)).unwrap(); // quarter period
        assert_relative_eq!(driver.last_angle(5).unwrap(), 115.0, epsilon = 1e-9);

        osc.refresh(ms(1450)).unwrap(); // three quarters
        assert_relative_eq!(driver.last_angle(5).unwrap(), 65.0, epsilon = 1e-9);
    }

    #[test]
    fn test_set_parameters_resets_time_base() {
        let (driver, mut osc) = attached(Some(5));
        osc.set_parameters(0.0, 20.0, 400.0, std::f64::consts::FRAC_PI_2);
        osc.refresh(ms(0)).unwrap();
        osc.refresh(ms(250)).unwrap();

        osc.set_parameters(0.0, 20.0, 400.0, std::f64::consts::FRAC_PI_2);
        osc.refresh(ms(730)).unwrap();
        assert_relative_eq!(driver.last_angle(5).unwrap(), 110.0, epsilon = 1e-9);
    }

    #[test]
    fn test_trim_applied_at_write() {
        let (driver, mut osc) = attached(Some(2));
        osc.set_trim(10);
        osc.set_position(85.0, ms(0)).unwrap();
        assert_relative_eq!(driver.last_angle(2).unwrap(), 95.0);
        // Position readback stays untrimmed
        assert_relative_eq!(osc.position(), 85.0);

        osc.set_parameters(-20.0, 0.0, 500.0, 0.0);
        osc.refresh(ms(10)).unwrap();
        assert_relative_eq!(driver.last_angle(2).unwrap(), 80.0);
    }

    #[test]
    fn test_output_clamped_to_servo_range() {
        let (driver, mut osc) = attached(Some(2));
        osc.set_trim(50);
        osc.set_position(170.0, ms(0)).unwrap();
        assert_relative_eq!(driver.last_angle(2).unwrap(), 180.0);
    }

    #[test]
    fn test_limiter_caps_step() {
        let (driver, mut osc) = attached(Some(1));
        osc.set_position(90.0, ms(0)).unwrap();
        osc.set_limiter(240.0);

        // 240 deg/s over 50 ms = 12 degrees
        osc.set_position(150.0, ms(50)).unwrap();
        assert_relative_eq!(osc.position(), 102.0, epsilon = 1e-9);

        // Tiny interval still moves at least one degree
        osc.set_position(150.0, ms(51)).unwrap();
        assert_relative_eq!(osc.position(), 103.0, epsilon = 1e-9);

        osc.disable_limiter();
        osc.set_position(150.0, ms(52)).unwrap();
        assert_relative_eq!(driver.last_angle(1).unwrap(), 150.0);
    }

    #[test]
    fn test_unconnected_joint_is_inert() {
        let (driver, mut osc) = attached(None);
        assert!(!osc.is_attached());
        osc.set_position(10.0, ms(0)).unwrap();
        osc.set_parameters(0.0, 30.0, 500.0, 0.0);
        osc.refresh(ms(5)).unwrap();
        osc.detach().unwrap();
        assert_eq!(driver.write_count(), 0);
        assert_relative_eq!(osc.position(), CENTER_ANGLE);
    }

    #[test]
    fn test_detached_joint_ignores_writes() {
        let (driver, mut osc) = attached(Some(7));
        osc.detach().unwrap();
        assert!(!driver.is_attached(7));
        osc.set_position(120.0, ms(0)).unwrap();
        assert_eq!(driver.write_count(), 0);
    }
}
