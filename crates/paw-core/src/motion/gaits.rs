//! Gait library
//!
//! Pure functions from `(steps, period, direction)` to an oscillator
//! profile. Phases are written in degrees in FL, FR, RL, RR order.
//!
//! Locomotion gaits run backward by negating every phase. Turns and paw
//! gestures use direction to pick a side instead.

use super::OscillatorProfile;
use crate::action::Direction;
use crate::hardware::{Joint, NUM_JOINTS};

const NO_OFFSET: [f64; NUM_JOINTS] = [0.0; NUM_JOINTS];

/// Diagonal pairs (FL+RR, FR+RL) swing together
pub mod trot {
    pub const AMPLITUDE: f64 = 25.0;
    pub const PHASES_DEG: [f64; 4] = [0.0, 180.0, 180.0, 0.0];
}

/// Four-beat gait, legs a quarter cycle apart
pub mod walk {
    pub const AMPLITUDE: f64 = 20.0;
    pub const PHASES_DEG: [f64; 4] = [0.0, 180.0, 270.0, 90.0];
}

/// Lateral pairs (same side) swing together
pub mod pace {
    pub const AMPLITUDE: f64 = 25.0;
    pub const PHASES_DEG: [f64; 4] = [0.0, 180.0, 0.0, 180.0];
}

/// Front pair and rear pair swing together
pub mod bound {
    pub const AMPLITUDE: f64 = 25.0;
    pub const PHASES_DEG: [f64; 4] = [0.0, 0.0, 180.0, 180.0];
}

/// Asymmetric running gait: leading leg slightly ahead in each pair
pub mod gallop {
    pub const AMPLITUDE: f64 = 30.0;
    pub const PHASES_DEG: [f64; 4] = [0.0, 30.0, 180.0, 210.0];
}

/// Rotate in place: one lateral half drives forward, the other backward
pub mod turn {
    pub const AMPLITUDE: f64 = 20.0;
    /// Left turn: left legs backward (180°), right legs forward (0°)
    pub const LEFT_PHASES_DEG: [f64; 4] = [180.0, 0.0, 180.0, 0.0];
    pub const RIGHT_PHASES_DEG: [f64; 4] = [0.0, 180.0, 0.0, 180.0];
}

/// Quick left-right body shake; ignores caller parameters
pub mod shake {
    pub const AMPLITUDE: f64 = 15.0;
    pub const PHASES_DEG: [f64; 4] = [0.0, 180.0, 0.0, 180.0];
    pub const PERIOD_MS: u32 = 300;
    pub const CYCLES: f64 = 5.0;
}

/// Rear legs in anti-phase, front legs hold
pub mod wiggle {
    pub const AMPLITUDE: [f64; 4] = [0.0, 0.0, 15.0, 15.0];
    pub const PHASES_DEG: [f64; 4] = [0.0, 0.0, 0.0, 180.0];
}

/// Lifted-paw shake used by the handshake gesture
pub mod paw_shake {
    pub const AMPLITUDE: f64 = 25.0;
    /// Left paw lifted to 70°, others leaning to keep balance
    pub const LEFT_OFFSETS: [f64; 4] = [-20.0, 10.0, 5.0, 10.0];
    /// Right paw lifted to 110°
    pub const RIGHT_OFFSETS: [f64; 4] = [10.0, 20.0, 10.0, 5.0];
}

fn locomotion(
    amplitude: f64,
    phases_deg: [f64; NUM_JOINTS],
    steps: f64,
    period_ms: u32,
    direction: Direction,
) -> OscillatorProfile {
    let profile = OscillatorProfile::from_degrees(
        [amplitude; NUM_JOINTS],
        NO_OFFSET,
        phases_deg,
        period_ms,
        steps,
    );
    if direction.is_reverse() {
        profile.reversed()
    } else {
        profile
    }
}

pub fn trot(steps: f64, period_ms: u32, direction: Direction) -> OscillatorProfile {
    locomotion(trot::AMPLITUDE, trot::PHASES_DEG, steps, period_ms, direction)
}

pub fn walk(steps: f64, period_ms: u32, direction: Direction) -> OscillatorProfile {
    locomotion(walk::AMPLITUDE, walk::PHASES_DEG, steps, period_ms, direction)
}

pub fn pace(steps: f64, period_ms: u32, direction: Direction) -> OscillatorProfile {
    locomotion(pace::AMPLITUDE, pace::PHASES_DEG, steps, period_ms, direction)
}

pub fn bound(steps: f64, period_ms: u32, direction: Direction) -> OscillatorProfile {
    locomotion(bound::AMPLITUDE, bound::PHASES_DEG, steps, period_ms, direction)
}

pub fn gallop(steps: f64, period_ms: u32, direction: Direction) -> OscillatorProfile {
    locomotion(gallop::AMPLITUDE, gallop::PHASES_DEG, steps, period_ms, direction)
}

/// Turn in place toward `side` (`Direction::LEFT` or `Direction::RIGHT`)
pub fn turn(steps: f64, period_ms: u32, side: Direction) -> OscillatorProfile {
    let phases = if side == Direction::LEFT {
        turn::LEFT_PHASES_DEG
    } else {
        turn::RIGHT_PHASES_DEG
    };
    OscillatorProfile::from_degrees(
        [turn::AMPLITUDE; NUM_JOINTS],
        NO_OFFSET,
        phases,
        period_ms,
        steps,
    )
}

pub fn shake() -> OscillatorProfile {
    OscillatorProfile::from_degrees(
        [shake::AMPLITUDE; NUM_JOINTS],
        NO_OFFSET,
        shake::PHASES_DEG,
        shake::PERIOD_MS,
        shake::CYCLES,
    )
}

pub fn wiggle(steps: f64, period_ms: u32) -> OscillatorProfile {
    OscillatorProfile::from_degrees(
        wiggle::AMPLITUDE,
        NO_OFFSET,
        wiggle::PHASES_DEG,
        period_ms,
        steps,
    )
}

/// Shake only the lifted front paw on `side`
pub fn paw_shake(side: Direction, steps: f64, period_ms: u32) -> OscillatorProfile {
    let (paw, offsets) = if side == Direction::LEFT {
        (Joint::FrontLeft, paw_shake::LEFT_OFFSETS)
    } else {
        (Joint::FrontRight, paw_shake::RIGHT_OFFSETS)
    };
    let mut amplitude = [0.0; NUM_JOINTS];
    amplitude[paw.index()] = paw_shake::AMPLITUDE;
    OscillatorProfile::from_degrees(amplitude, offsets, [0.0; NUM_JOINTS], period_ms, steps)
}
