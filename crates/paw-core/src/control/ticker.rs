//! Fixed-cadence tick loop
//!
//! Every timed phase of a motion (interpolation, oscillation, holds) is a
//! run of ticks: call the body, sleep out the rest of the period, repeat
//! until the requested duration has elapsed. The cancel token is checked at
//! every tick boundary.

use std::time::Duration;

use super::{CancelToken, Clock};
use crate::{Error, Result};

/// Timing statistics for one tick run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickStats {
    /// Number of ticks executed
    pub iterations: u64,
    /// Ticks whose body took longer than the period
    pub overruns: u64,
    /// Total body execution time
    pub total_execution_time: Duration,
    pub max_tick_time: Duration,
    pub min_tick_time: Duration,
    pub last_tick_time: Duration,
}

impl TickStats {
    pub fn update(&mut self, execution_time: Duration, period: Duration) {
        self.iterations += 1;
        self.total_execution_time += execution_time;
        self.last_tick_time = execution_time;

        if self.iterations == 1 {
            self.min_tick_time = execution_time;
            self.max_tick_time = execution_time;
        } else {
            self.min_tick_time = self.min_tick_time.min(execution_time);
            self.max_tick_time = self.max_tick_time.max(execution_time);
        }

        if execution_time > period {
            self.overruns += 1;
        }
    }

    /// Mean body execution time
    pub fn avg_tick_time(&self) -> Duration {
        if self.iterations == 0 {
            Duration::ZERO
        } else {
            self.total_execution_time.div_f64(self.iterations as f64)
        }
    }

    /// Get the overrun ratio (0.0 to 1.0)
    pub fn overrun_ratio(&self) -> f64 {
        if self.iterations == 0 {
            0.0
        } else {
            self.overruns as f64 / self.iterations as f64
        }
    }
}

/// A fixed-period loop bound to a clock and a cancel token
///
/// # Example
/// ```
/// use paw_core::control::{CancelToken, SimClock, Ticker};
/// use std::time::Duration;
///
/// let clock = SimClock::new();
/// let cancel = CancelToken::new();
/// let ticker = Ticker::new("hold", Duration::from_millis(10), &clock, &cancel);
///
/// let stats = ticker.run_for(Duration::from_millis(50), |_iter, _elapsed| Ok(())).unwrap();
/// assert_eq!(stats.iterations, 5);
/// ```
pub struct Ticker<'a> {
    name: &'static str,
    period: Duration,
    clock: &'a dyn Clock,
    cancel: &'a CancelToken,
    warn_on_overrun: bool,
}

impl<'a> Ticker<'a> {
    pub fn new(
        name: &'static str,
        period: Duration,
        clock: &'a dyn Clock,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            name,
            period,
            clock,
            cancel,
            warn_on_overrun: true,
        }
    }

    /// Suppress overrun warnings (for bodies expected to block)
    pub fn quiet(mut self) -> Self {
        self.warn_on_overrun = false;
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Tick until `duration` has elapsed since the first tick.
    ///
    /// The body receives the iteration count and the elapsed time at the
    /// start of the tick. Returns [`Error::Cancelled`] if the token trips
    /// at a tick boundary, or the first error from the body.
    pub fn run_for<F>(&self, duration: Duration, mut body: F) -> Result<TickStats>
    where
        F: FnMut(u64, Duration) -> Result<()>,
    {
        let start = self.clock.now();
        let mut stats = TickStats::default();
        let mut iteration = 0u64;

        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let tick_start = self.clock.now();
            let elapsed = tick_start.saturating_sub(start);
            if elapsed >= duration {
                break;
            }

            body(iteration, elapsed)?;

            let execution_time = self.clock.now().saturating_sub(tick_start);
            stats.update(execution_time, self.period);

            if let Some(sleep_time) = self.period.checked_sub(execution_time) {
                // The last tick only sleeps out what is left of `duration`
                let remaining = duration.saturating_sub(self.clock.now().saturating_sub(start));
                self.clock.sleep(sleep_time.min(remaining));
            } else if self.warn_on_overrun {
                tracing::warn!(
                    "{}: tick overrun by {:?}",
                    self.name,
                    execution_time - self.period
                );
            }

            iteration += 1;
        }

        Ok(stats)
    }

    /// Sleep for `duration` in ticks so cancellation is still observed
    pub fn hold(&self, duration: Duration) -> Result<()> {
        self.run_for(duration, |_, _| Ok(())).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{SimClock, SystemClock};
    use std::time::Instant;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_iterations_cover_duration() {
        let clock = SimClock::new();
        let cancel = CancelToken::new();
        let ticker = Ticker::new("test", ms(10), &clock, &cancel);

        let mut seen = Vec::new();
        let stats = ticker
            .run_for(ms(35), |iter, elapsed| {
                seen.push((iter, elapsed));
                Ok(())
            })
            .unwrap();

        assert_eq!(stats.iterations, 4);
        assert_eq!(seen.last(), Some(&(3, ms(30))));
        assert_eq!(clock.now(), ms(35));
    }

    #[test]
    fn test_hold_ends_on_duration_not_next_tick() {
        let clock = SimClock::new();
        let cancel = CancelToken::new();
        let ticker = Ticker::new("test", ms(10), &clock, &cancel);
        ticker.hold(ms(333)).unwrap();
        assert_eq!(clock.now(), ms(333));
    }

    #[test]
    fn test_zero_duration_runs_nothing() {
        let clock = SimClock::new();
        let cancel = CancelToken::new();
        let ticker = Ticker::new("test", ms(5), &clock, &cancel);
        let stats = ticker.run_for(Duration::ZERO, |_, _| Ok(())).unwrap();
        assert_eq!(stats.iterations, 0);
    }

    #[test]
    fn test_cancel_stops_at_boundary() {
        let clock = SimClock::new();
        let cancel = CancelToken::new();
        let ticker = Ticker::new("test", ms(10), &clock, &cancel);

        let mut ticks = 0;
        let result = ticker.run_for(ms(1000), |iter, _| {
            ticks += 1;
            if iter == 2 {
                cancel.cancel();
            }
            Ok(())
        });

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(ticks, 3);
    }

    #[test]
    fn test_body_error_propagates() {
        let clock = SimClock::new();
        let cancel = CancelToken::new();
        let ticker = Ticker::new("test", ms(10), &clock, &cancel);
        let result = ticker.run_for(ms(100), |_, _| Err(Error::Hardware("boom".into())));
        assert!(matches!(result, Err(Error::Hardware(_))));
    }

    #[test]
    fn test_real_time_cadence() {
        let clock = SystemClock::new();
        let cancel = CancelToken::new();
        let ticker = Ticker::new("test", ms(10), &clock, &cancel);

        let start = Instant::now();
        let stats = ticker.run_for(ms(50), |_, _| Ok(())).unwrap();
        let elapsed = start.elapsed();

        // Wide bounds for CI scheduling noise
        assert!(elapsed >= ms(50));
        assert!(elapsed <= ms(200));
        assert!(stats.iterations >= 3 && stats.iterations <= 5);
    }

    #[test]
    fn test_stats() {
        let mut stats = TickStats::default();
        stats.update(ms(2), ms(5));
        stats.update(ms(8), ms(5));
        assert_eq!(stats.overruns, 1);
        assert_eq!(stats.min_tick_time, ms(2));
        assert_eq!(stats.max_tick_time, ms(8));
        assert_eq!(stats.avg_tick_time(), ms(5));
        assert_eq!(stats.overrun_ratio(), 0.5);
    }
}
