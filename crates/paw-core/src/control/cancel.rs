//! Cooperative cancellation for the motion worker

use crossbeam_channel::{self as cc, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop signal
///
/// Tick loops poll [`is_cancelled`](Self::is_cancelled) at every boundary.
/// A worker blocked on the action queue can also `select!` on
/// [`signal`](Self::signal), which disconnects the moment the token trips.
#[derive(Debug, Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    signal: Receiver<()>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = cc::bounded(0);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            trigger: Arc::new(Mutex::new(Some(tx))),
            signal: rx,
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
        // Dropping the only sender wakes every receiver
        self.trigger.lock().take();
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Receiver that becomes disconnected on cancel; never yields a value
    pub fn signal(&self) -> &Receiver<()> {
        &self.signal
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_cancel_sets_flag_on_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_signal_wakes_blocked_receiver() {
        let token = CancelToken::new();
        let waiter = {
            let token = token.clone();
            thread::spawn(move || {
                let start = Instant::now();
                let _ = token.signal().recv_timeout(Duration::from_secs(5));
                start.elapsed()
            })
        };
        thread::sleep(Duration::from_millis(20));
        token.cancel();
        assert!(waiter.join().unwrap() < Duration::from_secs(1));
    }
}
