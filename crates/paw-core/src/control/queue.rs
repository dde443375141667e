//! Bounded FIFO of pending actions
//!
//! Thin wrapper around a crossbeam bounded channel. Producers block when the
//! queue is full; that is the only back-pressure, there is no overflow error.
//!
//! Producers send under an epoch gate. [`ActionQueue::reset`] bumps the epoch
//! while draining, so a producer stalled on a full queue before the reset
//! gives up instead of landing a stale action behind it.

use crossbeam_channel::{self as cc, select, RecvTimeoutError, SendTimeoutError, TrySendError};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use std::time::Duration;

use super::CancelToken;
use crate::action::Action;
use crate::{Error, Result};

/// What the worker got from one poll of the queue
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Poll {
    Action(Action),
    /// Nothing arrived within the poll window
    Empty,
    /// The cancel token tripped while waiting
    Cancelled,
    /// Every sender is gone
    Closed,
}

// How long a blocked producer holds the gate before letting a reset in
const PUSH_RETRY: Duration = Duration::from_millis(2);

/// Multi-producer, single-consumer action queue
#[derive(Debug, Clone)]
pub struct ActionQueue {
    tx: cc::Sender<Action>,
    rx: cc::Receiver<Action>,
    epoch: Arc<Mutex<u64>>,
}

impl ActionQueue {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = cc::bounded(capacity);
        Self {
            tx,
            rx,
            epoch: Arc::new(Mutex::new(0)),
        }
    }

    /// Enqueue, blocking while the queue is full.
    ///
    /// Returns [`Error::Cancelled`] if a [`reset`](Self::reset) happens
    /// while waiting for room; the action is dropped.
    pub fn push(&self, action: Action) -> Result<()> {
        let mut gate = self.epoch.lock();
        let epoch = *gate;
        let mut action = action;
        loop {
            if *gate != epoch {
                return Err(Error::Cancelled);
            }
            match self.tx.send_timeout(action, PUSH_RETRY) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(back)) => action = back,
                Err(SendTimeoutError::Disconnected(_)) => return Err(Error::ChannelClosed),
            }
            MutexGuard::unlock_fair(gate);
            gate = self.epoch.lock();
        }
    }

    /// Enqueue without blocking; returns the action back when full
    pub fn try_push(&self, action: Action) -> Result<Option<Action>> {
        let _gate = self.epoch.lock();
        match self.tx.try_send(action) {
            Ok(()) => Ok(None),
            Err(TrySendError::Full(action)) => Ok(Some(action)),
            Err(TrySendError::Disconnected(_)) => Err(Error::ChannelClosed),
        }
    }

    /// Wait up to `timeout` for the next action
    pub fn pop_timeout(&self, timeout: Duration) -> Result<Option<Action>> {
        match self.rx.recv_timeout(timeout) {
            Ok(action) => Ok(Some(action)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(Error::ChannelClosed),
        }
    }

    /// Wait for the next action, waking early if `cancel` trips
    pub fn poll(&self, timeout: Duration, cancel: &CancelToken) -> Poll {
        if cancel.is_cancelled() {
            return Poll::Cancelled;
        }
        select! {
            recv(self.rx) -> msg => match msg {
                Ok(action) => Poll::Action(action),
                Err(_) => Poll::Closed,
            },
            recv(cancel.signal()) -> _ => Poll::Cancelled,
            default(timeout) => Poll::Empty,
        }
    }

    /// Drain the queue and invalidate every blocked producer, then
    /// optionally seed it with `first`.
    ///
    /// Nothing a producer started sending before the reset can land after
    /// it. Returns the discarded actions.
    pub fn reset(&self, first: Option<Action>) -> Result<Vec<Action>> {
        let mut gate = self.epoch.lock();
        *gate = gate.wrapping_add(1);
        let discarded = self.drain();
        if let Some(action) = first {
            self.tx.try_send(action).map_err(|e| match e {
                TrySendError::Full(_) => Error::Worker("action queue refilled during reset".into()),
                TrySendError::Disconnected(_) => Error::ChannelClosed,
            })?;
        }
        Ok(discarded)
    }

    /// Remove and return every pending action
    pub fn drain(&self) -> Vec<Action> {
        let mut drained = Vec::with_capacity(self.rx.len());
        while let Ok(action) = self.rx.try_recv() {
            drained.push(action);
        }
        drained
    }

    /// Number of pending actions
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.tx.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.tx.capacity().unwrap_or(usize::MAX)
    }
}
