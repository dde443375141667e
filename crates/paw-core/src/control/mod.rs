//! Scheduling and serialization of motion
//!
//! Time sources, cancellation, the fixed-rate ticker every motion phase
//! runs on, the bounded action queue, and the controller that owns the
//! single motion worker.

mod cancel;
mod clock;
mod controller;
mod queue;
mod ticker;

pub use cancel::CancelToken;
pub use clock::{Clock, SimClock, SystemClock};
pub use controller::{DogController, DogStatus, MotionEvent};
pub use queue::{ActionQueue, Poll};
pub use ticker::{TickStats, Ticker};
