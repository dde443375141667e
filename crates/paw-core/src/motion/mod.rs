//! Motion generation
//!
//! Postures and oscillator profiles describe *what* the legs should do; the
//! gait library and choreography map actions onto them; the executor turns
//! them into timed servo writes.

pub mod choreography;
mod executor;
pub mod gaits;
mod posture;
mod profile;

pub use choreography::{home_plan, nominal_duration_ms, plan, MotionPlan, MotionStep};
pub use executor::{MoveOutcome, TrajectoryExecutor};
pub use posture::Posture;
pub use profile::{split_cycles, JointWave, OscillatorProfile};
