//! Trajectory executor
//!
//! Blocking motion primitives on top of the servo bank. Interpolated moves
//! step every joint toward a posture on the interpolation tick; oscillations
//! refresh the bank on the oscillation tick. Both check the cancel token at
//! every tick boundary and return [`Error::Cancelled`] when it trips.
//!
//! [`Error::Cancelled`]: crate::Error::Cancelled

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::{home_plan, split_cycles, MotionPlan, MotionStep, OscillatorProfile, Posture};
use crate::config::TimingConfig;
use crate::control::{CancelToken, Clock, Ticker};
use crate::hardware::{angle_limits, Joint, ServoBank, CENTER_ANGLE, NUM_JOINTS};
use crate::Result;

/// How an interpolated move ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// Every connected joint reached its target
    Settled,
    /// The settle retries ran out; positions were left where they were
    Unsettled { max_error: f64 },
}

impl MoveOutcome {
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Settled)
    }
}

/// Drives the servo bank through postures and oscillations
#[derive(Debug)]
pub struct TrajectoryExecutor {
    servos: ServoBank,
    clock: Arc<dyn Clock>,
    timing: TimingConfig,
    rest: Arc<AtomicBool>,
    cancel: CancelToken,
}

impl TrajectoryExecutor {
    pub fn new(
        servos: ServoBank,
        clock: Arc<dyn Clock>,
        timing: TimingConfig,
        rest: Arc<AtomicBool>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            servos,
            clock,
            timing,
            rest,
            cancel,
        }
    }

    /// True while holding a static resting posture
    pub fn rest_state(&self) -> bool {
        self.rest.load(Ordering::Acquire)
    }

    fn set_rest(&self, rest: bool) {
        self.rest.store(rest, Ordering::Release);
    }

    fn ticker(&self, name: &'static str, period: Duration) -> Ticker<'_> {
        Ticker::new(name, period, self.clock.as_ref(), &self.cancel)
    }

    /// Interpolate every joint to `posture` over `duration_ms`.
    ///
    /// Moves longer than one interpolation tick are split into equal
    /// per-tick increments; shorter ones snap to the target and hold. A
    /// bounded settle loop then forces the exact target.
    pub fn move_to(&self, posture: &Posture, duration_ms: u32) -> Result<MoveOutcome> {
        self.set_rest(false);

        let tick = self.timing.interpolation_tick();
        let duration = Duration::from_millis(duration_ms as u64);
        let target = *posture.angles();

        if duration > tick {
            let start = self.servos.positions();
            let steps = duration.as_millis() as f64 / tick.as_millis().max(1) as f64;
            let increments: [f64; NUM_JOINTS] =
                std::array::from_fn(|i| (target[i] - start[i]) / steps);
            let mut current = start;

            self.ticker("move_to", tick).run_for(duration, |_, _| {
                for (angle, inc) in current.iter_mut().zip(&increments) {
                    *angle += inc;
                }
                self.servos.set_positions(&current, self.clock.now())
            })?;
        } else {
            self.servos.set_positions(&target, self.clock.now())?;
            self.ticker("move_to", tick).hold(duration)?;
        }

        self.settle(posture)
    }

    // Exact comparison: a forced write without the limiter lands exactly
    fn settle(&self, posture: &Posture) -> Result<MoveOutcome> {
        let tick = self.timing.interpolation_tick();
        for _ in 0..self.timing.settle_retries {
            if self.servos.max_error(posture) == 0.0 {
                return Ok(MoveOutcome::Settled);
            }
            self.servos.set_positions(posture.angles(), self.clock.now())?;
            self.ticker("settle", tick).hold(tick)?;
        }

        let max_error = self.servos.max_error(posture);
        if max_error == 0.0 {
            return Ok(MoveOutcome::Settled);
        }
        warn!(
            "settle gave up after {} retries, max error {:.2}°",
            self.timing.settle_retries, max_error
        );
        Ok(MoveOutcome::Unsettled { max_error })
    }

    /// Run `profile` for `fraction` of one period
    pub fn oscillate(&self, profile: &OscillatorProfile, fraction: f64) -> Result<()> {
        self.set_rest(false);
        self.servos.apply_profile(profile);

        let micros = profile.period_ms as f64 * fraction.max(0.0) * 1000.0;
        let duration = Duration::from_micros(micros.round() as u64);
        self.ticker("oscillate", self.timing.oscillation_tick())
            .run_for(duration, |_, _| self.servos.refresh_all(self.clock.now()))?;
        Ok(())
    }

    /// Run `cycles` of `profile`, one oscillation per whole cycle plus the
    /// trailing fraction, then pause briefly.
    pub fn execute(&self, profile: &OscillatorProfile, cycles: f64) -> Result<()> {
        for fraction in split_cycles(cycles) {
            self.oscillate(profile, fraction)?;
        }
        self.hold(self.timing.execute_settle())
    }

    /// Keep the current pose for `duration`
    pub fn hold(&self, duration: Duration) -> Result<()> {
        self.ticker("hold", self.timing.interpolation_tick())
            .hold(duration)
    }

    /// Command a single joint directly; out-of-range angles fall back to neutral
    pub fn move_single(&self, joint: Joint, angle: f64) -> Result<()> {
        let angle = if (angle_limits::MIN..=angle_limits::MAX).contains(&angle) {
            angle
        } else {
            CENTER_ANGLE
        };
        self.set_rest(false);
        self.servos.set_position(joint, angle, self.clock.now())
    }

    pub fn home(&self) -> Result<()> {
        self.run(&home_plan())
    }

    pub fn sit(&self) -> Result<()> {
        self.run_rest(&Posture::SIT, super::choreography::durations::SIT_MOVE)
    }

    pub fn lay_down(&self) -> Result<()> {
        self.run_rest(&Posture::LAY_DOWN, super::choreography::durations::LAY_DOWN_MOVE)
    }

    fn run_rest(&self, posture: &Posture, duration_ms: u32) -> Result<()> {
        self.move_to(posture, duration_ms)?;
        self.set_rest(true);
        Ok(())
    }

    /// Execute every step of a plan in order
    pub fn run(&self, plan: &MotionPlan) -> Result<()> {
        for (i, step) in plan.iter().enumerate() {
            debug!("step {}/{}: {:?}", i + 1, plan.len(), step);
            match step {
                MotionStep::Move {
                    posture,
                    duration_ms,
                } => {
                    self.move_to(posture, *duration_ms)?;
                }
                MotionStep::Hold { duration_ms } => {
                    self.hold(Duration::from_millis(*duration_ms as u64))?;
                }
                MotionStep::Oscillate(profile) => self.execute(profile, profile.cycles)?,
                MotionStep::Rest => self.set_rest(true),
            }
        }
        Ok(())
    }
}
