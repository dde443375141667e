//! Turning actions into motion plans
//!
//! A plan is a short, fixed sequence of executor primitives. Building it is
//! pure, so every behavior's timing and targets can be checked without
//! moving a servo.

use arrayvec::ArrayVec;

use super::{gaits, OscillatorProfile, Posture};
use crate::action::{Action, ActionKind, Direction};

/// Longest plan any behavior needs
pub const MAX_PLAN_STEPS: usize = 8;

/// Fixed behavior timings (ms)
pub mod durations {
    pub const HOME_MOVE: u32 = 800;
    pub const HOME_HOLD: u32 = 200;
    pub const SIT_MOVE: u32 = 1000;
    pub const LAY_DOWN_MOVE: u32 = 1500;
    pub const BOW_MOVE: u32 = 800;
    pub const BOW_HOLD: u32 = 1000;
    pub const JUMP_CROUCH: u32 = 200;
    pub const JUMP_CROUCH_HOLD: u32 = 100;
    pub const JUMP_EXTEND: u32 = 150;
    pub const JUMP_AIR_HOLD: u32 = 200;
    pub const JUMP_LAND: u32 = 200;
    pub const WEIGHT_SHIFT: u32 = 500;
    pub const WEIGHT_SHIFT_HOLD: u32 = 200;
    pub const PAW_RAISE: u32 = 600;
    pub const GESTURE_RELEASE_HOLD: u32 = 200;
}

/// One executor primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionStep {
    /// Interpolated move to a posture
    Move { posture: Posture, duration_ms: u32 },
    /// Keep the current pose
    Hold { duration_ms: u32 },
    /// Run a profile for its cycle count
    Oscillate(OscillatorProfile),
    /// Mark the robot as resting in the current posture
    Rest,
}

pub type MotionPlan = ArrayVec<MotionStep, MAX_PLAN_STEPS>;

fn move_to(posture: Posture, duration_ms: u32) -> MotionStep {
    MotionStep::Move {
        posture,
        duration_ms,
    }
}

fn hold(duration_ms: u32) -> MotionStep {
    MotionStep::Hold { duration_ms }
}

fn plan_of<const N: usize>(steps: [MotionStep; N]) -> MotionPlan {
    steps.into_iter().collect()
}

/// Plan for returning to the standing rest posture
pub fn home_plan() -> MotionPlan {
    plan_of([
        move_to(Posture::HOME, durations::HOME_MOVE),
        MotionStep::Rest,
        hold(durations::HOME_HOLD),
    ])
}

fn weight_shift(side: Direction) -> Posture {
    if side == Direction::LEFT {
        Posture::SHIFT_FOR_LEFT_PAW
    } else {
        Posture::SHIFT_FOR_RIGHT_PAW
    }
}

fn raised_paw(side: Direction) -> Posture {
    if side == Direction::LEFT {
        Posture::LEFT_PAW_RAISED
    } else {
        Posture::RIGHT_PAW_RAISED
    }
}

/// Resolve an action into executor steps (without the automatic Home)
pub fn plan(action: &Action) -> MotionPlan {
    let steps = action.steps as f64;
    let period = action.speed_ms;
    let dir = action.direction;

    match action.kind {
        ActionKind::Trot => plan_of([MotionStep::Oscillate(gaits::trot(steps, period, dir))]),
        ActionKind::Walk => plan_of([MotionStep::Oscillate(gaits::walk(steps, period, dir))]),
        ActionKind::Pace => plan_of([MotionStep::Oscillate(gaits::pace(steps, period, dir))]),
        ActionKind::Bound => plan_of([MotionStep::Oscillate(gaits::bound(steps, period, dir))]),
        ActionKind::Gallop => plan_of([MotionStep::Oscillate(gaits::gallop(steps, period, dir))]),
        ActionKind::Turn => plan_of([MotionStep::Oscillate(gaits::turn(steps, period, dir))]),
        ActionKind::Shake => plan_of([MotionStep::Oscillate(gaits::shake())]),
        ActionKind::Wiggle => plan_of([MotionStep::Oscillate(gaits::wiggle(steps, period))]),
        ActionKind::Home => home_plan(),
        ActionKind::Sit => plan_of([move_to(Posture::SIT, durations::SIT_MOVE), MotionStep::Rest]),
        ActionKind::LayDown => plan_of([
            move_to(Posture::LAY_DOWN, durations::LAY_DOWN_MOVE),
            MotionStep::Rest,
        ]),
        ActionKind::Bow => {
            let mut plan = plan_of([
                move_to(Posture::BOW, durations::BOW_MOVE),
                hold(durations::BOW_HOLD),
            ]);
            plan.extend(home_plan());
            plan
        }
        ActionKind::Jump => plan_of([
            move_to(Posture::CROUCH, durations::JUMP_CROUCH),
            hold(durations::JUMP_CROUCH_HOLD),
            move_to(Posture::EXTEND, durations::JUMP_EXTEND),
            hold(durations::JUMP_AIR_HOLD),
            move_to(Posture::NEUTRAL, durations::JUMP_LAND),
        ]),
        ActionKind::HandShake => plan_of([
            move_to(weight_shift(dir), durations::WEIGHT_SHIFT),
            hold(durations::WEIGHT_SHIFT_HOLD),
            MotionStep::Oscillate(gaits::paw_shake(dir, steps, period)),
            hold(durations::GESTURE_RELEASE_HOLD),
        ]),
        ActionKind::HighFive => plan_of([
            move_to(weight_shift(dir), durations::WEIGHT_SHIFT),
            hold(durations::WEIGHT_SHIFT_HOLD),
            move_to(raised_paw(dir), durations::PAW_RAISE),
            hold(action.speed_ms),
            hold(durations::GESTURE_RELEASE_HOLD),
        ]),
    }
}

/// Nominal duration of a plan in ms, ignoring tick rounding
pub fn nominal_duration_ms(plan: &MotionPlan) -> f64 {
    plan.iter()
        .map(|step| match step {
            MotionStep::Move { duration_ms, .. } | MotionStep::Hold { duration_ms } => {
                *duration_ms as f64
            }
            MotionStep::Oscillate(profile) => profile.duration_ms(),
            MotionStep::Rest => 0.0,
        })
        .sum()
}
