//! Motion requests
//!
//! An [`Action`] is one queued, atomically executed motion program. It is
//! immutable once enqueued and consumed exactly once by the worker.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Accepted range for `steps` at the tool surface
pub const STEPS_RANGE: (i32, i32) = (1, 20);
/// Accepted range for `speed` (ms per cycle) at the tool surface
pub const SPEED_RANGE_MS: (i32, i32) = (300, 2000);

/// Travel direction for gaits, or side for turns and paw gestures
///
/// `Forward` doubles as "left" and `Backward` as "right", matching the
/// `direction` integer of the tool surface (1 / -1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub const LEFT: Self = Self::Forward;
    pub const RIGHT: Self = Self::Backward;

    /// Non-negative values map to forward/left, negative to backward/right
    pub fn from_sign(value: i32) -> Self {
        if value < 0 {
            Self::Backward
        } else {
            Self::Forward
        }
    }

    pub fn sign(self) -> i32 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }

    pub fn is_reverse(self) -> bool {
        self == Self::Backward
    }
}

/// Every motion program the gait library knows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    // Gaits
    Trot,
    Walk,
    Pace,
    Bound,
    Gallop,
    Turn,
    // Behaviors
    Sit,
    LayDown,
    Shake,
    Wiggle,
    Jump,
    Bow,
    Home,
    HandShake,
    HighFive,
}

impl ActionKind {
    pub const ALL: [ActionKind; 15] = [
        Self::Trot,
        Self::Walk,
        Self::Pace,
        Self::Bound,
        Self::Gallop,
        Self::Turn,
        Self::Sit,
        Self::LayDown,
        Self::Shake,
        Self::Wiggle,
        Self::Jump,
        Self::Bow,
        Self::Home,
        Self::HandShake,
        Self::HighFive,
    ];

    /// Name used on the tool surface
    pub fn name(self) -> &'static str {
        match self {
            Self::Trot => "trot",
            Self::Walk => "walk",
            Self::Pace => "pace",
            Self::Bound => "bound",
            Self::Gallop => "gallop",
            Self::Turn => "turn",
            Self::Sit => "sit",
            Self::LayDown => "laydown",
            Self::Shake => "shake",
            Self::Wiggle => "wiggle",
            Self::Jump => "jump",
            Self::Bow => "bow",
            Self::Home => "home",
            Self::HandShake => "handshake",
            Self::HighFive => "highfive",
        }
    }

    /// Look up an action by its tool-surface name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Comma-separated list of every action name
    pub fn available() -> &'static str {
        "trot, walk, pace, bound, gallop, turn, sit, laydown, shake, wiggle, jump, bow, \
         handshake, highfive, home"
    }

    /// Oscillator-driven locomotion (direction negates phases)
    pub fn is_gait(self) -> bool {
        matches!(
            self,
            Self::Trot | Self::Walk | Self::Pace | Self::Bound | Self::Gallop | Self::Turn
        )
    }

    /// Whether the worker issues a Home move after this action.
    ///
    /// Sit, LayDown and Home already end in a resting posture.
    pub fn returns_home(self) -> bool {
        !matches!(self, Self::Sit | Self::LayDown | Self::Home)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| Error::InvalidAction(s.to_string()))
    }
}

/// One queued motion request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    /// Cycle count for oscillating programs
    pub steps: u32,
    /// Period in ms (hold time for HighFive, ignored by fixed behaviors)
    pub speed_ms: u32,
    pub direction: Direction,
}

impl Action {
    pub fn new(kind: ActionKind, steps: u32, speed_ms: u32, direction: Direction) -> Self {
        Self {
            kind,
            steps,
            speed_ms,
            direction,
        }
    }

    /// The Home action queued at start-up and after every Stop
    pub fn home() -> Self {
        Self::new(ActionKind::Home, 1, 500, Direction::Forward)
    }

    /// Build an action from raw tool parameters.
    ///
    /// Validates the ranges, then normalizes the parameters the way each
    /// behavior consumes them: fixed behaviors drop steps and speed,
    /// HighFive keeps speed as its hold time.
    pub fn from_request(kind: ActionKind, steps: i32, speed: i32, direction: i32) -> Result<Self> {
        if !(STEPS_RANGE.0..=STEPS_RANGE.1).contains(&steps) {
            return Err(Error::InvalidInput(format!(
                "steps must be in [{}, {}], got {}",
                STEPS_RANGE.0, STEPS_RANGE.1, steps
            )));
        }
        if !(SPEED_RANGE_MS.0..=SPEED_RANGE_MS.1).contains(&speed) {
            return Err(Error::InvalidInput(format!(
                "speed must be in [{}, {}] ms, got {}",
                SPEED_RANGE_MS.0, SPEED_RANGE_MS.1, speed
            )));
        }
        if !(-1..=1).contains(&direction) {
            return Err(Error::InvalidInput(format!(
                "direction must be -1, 0 or 1, got {}",
                direction
            )));
        }

        let direction = Direction::from_sign(direction);
        let (steps, speed) = (steps as u32, speed as u32);

        let action = match kind {
            ActionKind::Sit
            | ActionKind::LayDown
            | ActionKind::Shake
            | ActionKind::Jump
            | ActionKind::Bow => Action::new(kind, 1, 0, Direction::Forward),
            ActionKind::Wiggle => Action::new(kind, steps, speed, Direction::Forward),
            ActionKind::HighFive => Action::new(kind, 1, speed, direction),
            ActionKind::Home => Action::home(),
            _ => Action::new(kind, steps, speed, direction),
        };
        Ok(action)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(steps={}, speed={}ms, direction={})",
            self.kind,
            self.steps,
            self.speed_ms,
            self.direction.sign()
        )
    }
}
