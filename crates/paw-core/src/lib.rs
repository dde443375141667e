//! paw-core: gait engine and action serializer for a four-legged servo robot
//!
//! Turns a handful of per-leg oscillator parameters into coordinated joint
//! trajectories (gaits) and scripted behaviors, and serializes motion requests
//! so exactly one motion program drives the legs at any time.
//!
//! # Modules
//!
//! - [`action`] - Action requests, kinds, and direction handling
//! - [`config`] - Pins, timing constants, queue sizing
//! - [`control`] - Clocks, cancellation, fixed-rate ticker, action queue and controller
//! - [`hardware`] - Joint identity, per-joint oscillator, collaborator traits
//! - [`motion`] - Postures, oscillator profiles, gait library, trajectory executor
//! - [`tools`] - Typed surface for a remote tool-invocation layer
//!
//! # Architecture
//!
//! ```text
//! caller ──enqueue──► ActionQueue (cap 10) ──► worker thread
//!                                               │
//!                          gait library ◄───────┤ plan(action)
//!                                               ▼
//!                                     TrajectoryExecutor
//!                                               │ 10 ms / 5 ms ticks
//!                                               ▼
//!                                  ServoBank ─► ServoDriver
//! ```

#![warn(unused_must_use)]

pub mod action;
pub mod config;
pub mod control;
pub mod hardware;
pub mod motion;
pub mod tools;

// Re-exports for convenience
pub use action::{Action, ActionKind, Direction};
pub use config::{DogConfig, TimingConfig};
pub use control::{
    ActionQueue, CancelToken, Clock, DogController, DogStatus, MotionEvent, SimClock,
    SystemClock, Ticker, TickStats,
};
pub use hardware::{
    BatteryLevel, Joint, Oscillator, PowerSource, ServoBank, ServoDriver, TrimStore, Trims,
};
pub use motion::{MotionPlan, MotionStep, MoveOutcome, OscillatorProfile, Posture, TrajectoryExecutor};
pub use tools::DogTools;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for paw-core
///
/// Invalid-input variants are user-facing and leave no state behind.
/// Everything else comes from collaborators or from cancellation.
///
/// # Example
/// ```ignore
/// match tools.action("moonwalk", 4, 600, 1) {
///     Ok(_) => {}
///     Err(Error::InvalidAction(msg)) => println!("{}", msg),
///     Err(e) => return Err(e),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
#[must_use = "errors must be handled or explicitly ignored with let _ = ..."]
#[non_exhaustive]
pub enum Error {
    /// Action name not recognized by the gait library.
    /// Handle by: reporting the message, which lists the available actions.
    #[error("Invalid action name '{0}'. Available actions: {}", ActionKind::available())]
    InvalidAction(String),

    /// Servo identifier not recognized.
    /// Handle by: using one of front_left, front_right, rear_left, rear_right.
    #[error("Invalid servo type '{0}', use: front_left, front_right, rear_left, rear_right")]
    InvalidJoint(String),

    /// Parameter outside its accepted range.
    /// Handle by: clamping or rejecting at the caller.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Servo driver failed to attach or accept a write.
    /// Handle by: checking wiring and the driver, then re-homing.
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// Trim persistence failed.
    /// Handle by: retrying the save; the in-memory trim is already applied.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration parameter.
    /// Handle by: validating config before use, checking parameter ranges.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Motion abandoned at a tick boundary because Stop was requested, or an
    /// enqueue still waiting on a full queue when Stop discarded it.
    /// Handle by: nothing; a Home action follows every Stop.
    #[error("Motion cancelled")]
    Cancelled,

    /// The motion worker could not be started or did not shut down cleanly.
    /// Handle by: logging it; the next enqueue spawns a fresh worker.
    #[error("Worker error: {0}")]
    Worker(String),

    /// The action queue was disconnected.
    /// Handle by: rebuilding the controller.
    #[error("Channel closed")]
    ChannelClosed,
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(format!("JSON error: {}", e))
    }
}

/// Result type alias for paw-core operations
pub type Result<T> = std::result::Result<T, Error>;
