//! Action serializer
//!
//! Callers enqueue actions; one worker thread executes them strictly in
//! order. The worker is spawned lazily on the first enqueue and keeps
//! polling the queue until Stop cancels it. Every movement other than Sit,
//! LayDown and Home is followed by an automatic return to Home.

use crossbeam_channel::{self as cc, Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use super::{ActionQueue, CancelToken, Clock, Poll, Ticker};
use crate::action::Action;
use crate::config::{DogConfig, TimingConfig};
use crate::hardware::{
    trim_limits, BatteryLevel, Joint, PowerSource, ServoBank, ServoDriver, TrimStore, Trims,
};
use crate::motion::{plan, TrajectoryExecutor};
use crate::{Error, Result};

/// Coarse motion status reported to the tool layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DogStatus {
    Idle,
    Moving,
}

impl fmt::Display for DogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DogStatus::Idle => f.write_str("idle"),
            DogStatus::Moving => f.write_str("moving"),
        }
    }
}

/// Lifecycle notifications from the worker
#[derive(Debug, Clone, PartialEq)]
pub enum MotionEvent {
    Started(Action),
    /// The action (and its automatic Home, if any) completed
    Finished(Action),
    /// Abandoned by Stop
    Cancelled(Action),
    Failed(Action, String),
}

struct Worker {
    handle: JoinHandle<()>,
    cancel: CancelToken,
}

type Subscribers = Arc<Mutex<Vec<Sender<MotionEvent>>>>;

/// Owns the action queue, the motion worker and the shared robot state
///
/// Construct once and share by reference (or `Arc`) with the tool layer.
pub struct DogController {
    config: DogConfig,
    servos: ServoBank,
    clock: Arc<dyn Clock>,
    queue: ActionQueue,
    /// Status signal only; exclusion comes from the single consumer
    busy: Arc<AtomicBool>,
    rest: Arc<AtomicBool>,
    worker: Mutex<Option<Worker>>,
    trim_store: Arc<dyn TrimStore>,
    power: Arc<dyn PowerSource>,
    subscribers: Subscribers,
}

impl fmt::Debug for DogController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DogController")
            .field("servos", &self.servos)
            .field("pending", &self.queue.len())
            .field("busy", &self.is_busy())
            .field("rest", &self.rest_state())
            .finish_non_exhaustive()
    }
}

impl DogController {
    /// Build the controller: validate config, load trims, and (by default)
    /// queue the start-up Home action.
    pub fn new(
        config: DogConfig,
        driver: Arc<dyn ServoDriver>,
        trim_store: Arc<dyn TrimStore>,
        power: Arc<dyn PowerSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let servos = ServoBank::new(config.pins, driver);
        info!(
            "Dog controller on {} with pins {:?}",
            servos.driver_name(),
            config.pins
        );

        match trim_store.load() {
            Ok(trims) => {
                info!("Loaded trims {:?}", trims.to_array());
                servos.set_trims(&trims);
            }
            Err(e) => warn!("Failed to load trims, using zero: {}", e),
        }
        if let Some(dps) = config.servo_limit_dps {
            servos.enable_limiter(dps);
        }

        let controller = Self {
            queue: ActionQueue::new(config.queue_capacity),
            config,
            servos,
            clock,
            busy: Arc::new(AtomicBool::new(false)),
            rest: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
            trim_store,
            power,
            subscribers: Arc::new(Mutex::new(Vec::new())),
        };

        if controller.config.home_on_start {
            controller.enqueue(Action::home())?;
        }
        Ok(controller)
    }

    pub fn config(&self) -> &DogConfig {
        &self.config
    }

    pub fn servos(&self) -> &ServoBank {
        &self.servos
    }

    /// Queue an action, blocking while the queue is full.
    ///
    /// Starts the worker if none is running.
    pub fn enqueue(&self, action: Action) -> Result<()> {
        info!("Queueing {}", action);
        self.ensure_worker()?;
        self.queue.push(action)
    }

    /// [`enqueue`](Self::enqueue) on tokio's blocking pool
    pub async fn enqueue_async(self: Arc<Self>, action: Action) -> Result<()> {
        tokio::task::spawn_blocking(move || self.enqueue(action))
            .await
            .map_err(|e| Error::Worker(e.to_string()))?
    }

    /// Abandon the current motion, discard pending actions, then go Home.
    ///
    /// Producers blocked on a full queue when Stop lands get
    /// [`Error::Cancelled`]; the forced Home is the only pending action.
    pub fn stop(&self) -> Result<()> {
        let discarded = self.shutdown(Some(Action::home()))?;
        info!("Stop: discarded {} pending action(s)", discarded.len());
        self.ensure_worker()
    }

    /// Cancel and join the worker, drain the queue, clear the busy flag.
    ///
    /// Returns the actions that were still pending.
    pub fn halt(&self) -> Vec<Action> {
        match self.shutdown(None) {
            Ok(discarded) => discarded,
            Err(e) => {
                warn!("Halt: {}", e);
                Vec::new()
            }
        }
    }

    fn shutdown(&self, then: Option<Action>) -> Result<Vec<Action>> {
        let mut slot = self.worker.lock();
        if let Some(worker) = slot.take() {
            worker.cancel.cancel();
            if worker.handle.join().is_err() {
                warn!("Motion worker panicked");
            }
        }
        let discarded = self.queue.reset(then);
        self.busy.store(false, Ordering::Release);
        discarded
    }

    pub fn status(&self) -> DogStatus {
        if self.is_busy() {
            DogStatus::Moving
        } else {
            DogStatus::Idle
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// True while the legs hold a resting posture (home, sit, lay-down)
    pub fn rest_state(&self) -> bool {
        self.rest.load(Ordering::Acquire)
    }

    /// Number of actions waiting behind the current one
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Set and persist one joint's trim; applies on the joint's next write
    pub fn set_trim(&self, joint: Joint, value: i32) -> Result<()> {
        if !(trim_limits::MIN..=trim_limits::MAX).contains(&value) {
            return Err(Error::InvalidInput(format!(
                "trim must be in [{}, {}], got {}",
                trim_limits::MIN,
                trim_limits::MAX,
                value
            )));
        }
        self.servos.set_trim(joint, value);
        info!("Trim {} set to {}", joint, value);
        self.trim_store.save(&self.servos.trims())
    }

    pub fn trims(&self) -> Trims {
        self.servos.trims()
    }

    pub fn battery_level(&self) -> Result<BatteryLevel> {
        self.power.battery_level()
    }

    /// Receive every future [`MotionEvent`]
    pub fn subscribe(&self) -> Receiver<MotionEvent> {
        let (tx, rx) = cc::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    fn ensure_worker(&self) -> Result<()> {
        let mut slot = self.worker.lock();
        if let Some(worker) = slot.as_ref() {
            if !worker.handle.is_finished() {
                return Ok(());
            }
        }

        let cancel = CancelToken::new();
        let context = WorkerContext {
            servos: self.servos.clone(),
            clock: Arc::clone(&self.clock),
            queue: self.queue.clone(),
            timing: self.config.timing.clone(),
            busy: Arc::clone(&self.busy),
            rest: Arc::clone(&self.rest),
            subscribers: Arc::clone(&self.subscribers),
            cancel: cancel.clone(),
        };
        let handle = thread::Builder::new()
            .name("paw-motion".into())
            .spawn(move || context.run())
            .map_err(|e| Error::Worker(format!("Failed to spawn motion worker: {}", e)))?;

        *slot = Some(Worker { handle, cancel });
        Ok(())
    }
}

impl Drop for DogController {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().take() {
            worker.cancel.cancel();
            let _ = worker.handle.join();
        }
    }
}

/// Everything the worker thread owns
struct WorkerContext {
    servos: ServoBank,
    clock: Arc<dyn Clock>,
    queue: ActionQueue,
    timing: TimingConfig,
    busy: Arc<AtomicBool>,
    rest: Arc<AtomicBool>,
    subscribers: Subscribers,
    cancel: CancelToken,
}

impl WorkerContext {
    fn run(self) {
        info!("Motion worker started");
        if let Err(e) = self.servos.attach_all() {
            warn!("Failed to attach servos: {}", e);
        }
        let executor = TrajectoryExecutor::new(
            self.servos.clone(),
            Arc::clone(&self.clock),
            self.timing.clone(),
            Arc::clone(&self.rest),
            self.cancel.clone(),
        );
        let pause = Ticker::new(
            "inter-action",
            self.timing.inter_action_delay(),
            self.clock.as_ref(),
            &self.cancel,
        )
        .quiet();

        loop {
            let action = match self.queue.poll(self.timing.queue_poll(), &self.cancel) {
                Poll::Action(action) => action,
                Poll::Empty => continue,
                Poll::Cancelled | Poll::Closed => break,
            };

            self.busy.store(true, Ordering::Release);
            self.emit(MotionEvent::Started(action));
            info!("Executing {}", action);

            let result = executor.run(&plan(&action)).and_then(|()| {
                if action.kind.returns_home() {
                    debug!("{} done, returning home", action.kind);
                    executor.home()
                } else {
                    Ok(())
                }
            });

            self.busy.store(false, Ordering::Release);
            match result {
                Ok(()) => self.emit(MotionEvent::Finished(action)),
                Err(Error::Cancelled) => {
                    info!("{} cancelled", action.kind);
                    self.emit(MotionEvent::Cancelled(action));
                    break;
                }
                Err(e) => {
                    warn!("{} failed: {}", action.kind, e);
                    self.emit(MotionEvent::Failed(action, e.to_string()));
                }
            }

            if pause.hold(self.timing.inter_action_delay()).is_err() {
                break;
            }
        }
        info!("Motion worker stopped");
    }

    fn emit(&self, event: MotionEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, Direction};
    use crate::control::SimClock;
    use crate::hardware::mock::{FixedPowerSource, MemoryTrimStore, MockServoDriver};
    use crate::motion::Posture;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    struct Rig {
        driver: Arc<MockServoDriver>,
        store: Arc<MemoryTrimStore>,
        dog: DogController,
    }

    fn rig_with(config: DogConfig, store: MemoryTrimStore) -> Rig {
        let driver = Arc::new(MockServoDriver::new());
        let store = Arc::new(store);
        let dog = DogController::new(
            config,
            driver.clone(),
            store.clone(),
            Arc::new(FixedPowerSource::default()),
            Arc::new(SimClock::new()),
        )
        .unwrap();
        Rig { driver, store, dog }
    }

    fn rig() -> Rig {
        rig_with(
            DogConfig::default().with_home_on_start(false),
            MemoryTrimStore::new(),
        )
    }

    fn walk(steps: u32) -> Action {
        Action::new(ActionKind::Walk, steps, 600, Direction::Forward)
    }

    fn next(events: &Receiver<MotionEvent>) -> MotionEvent {
        events.recv_timeout(WAIT).expect("worker went quiet")
    }

    #[test]
    fn test_worker_is_lazy() {
        let rig = rig();
        assert!(rig.dog.worker.lock().is_none());
        assert_eq!(rig.dog.status(), DogStatus::Idle);
    }

    #[test]
    fn test_walk_returns_home_then_idle() {
        let rig = rig();
        let events = rig.dog.subscribe();
        rig.dog.enqueue(walk(4)).unwrap();

        assert_eq!(next(&events), MotionEvent::Started(walk(4)));
        assert_eq!(next(&events), MotionEvent::Finished(walk(4)));
        assert_eq!(rig.dog.status(), DogStatus::Idle);
        assert_eq!(rig.dog.servos().positions(), *Posture::HOME.angles());
        assert!(rig.dog.rest_state());
    }

    #[test]
    fn test_status_moving_while_executing() {
        let rig = rig();
        let events = rig.dog.subscribe();
        rig.driver.hold();
        rig.dog.enqueue(walk(2)).unwrap();

        assert_eq!(next(&events), MotionEvent::Started(walk(2)));
        assert_eq!(rig.dog.status(), DogStatus::Moving);
        assert_eq!(rig.dog.status().to_string(), "moving");

        rig.driver.release();
        assert_eq!(next(&events), MotionEvent::Finished(walk(2)));
        assert_eq!(rig.dog.status().to_string(), "idle");
    }

    #[test]
    fn test_sit_does_not_return_home() {
        let rig = rig();
        let events = rig.dog.subscribe();
        let sit = Action::new(ActionKind::Sit, 1, 0, Direction::Forward);
        rig.dog.enqueue(sit).unwrap();

        assert_eq!(next(&events), MotionEvent::Started(sit));
        assert_eq!(next(&events), MotionEvent::Finished(sit));
        assert_eq!(rig.dog.servos().positions(), *Posture::SIT.angles());
        assert!(rig.dog.rest_state());
    }

    #[test]
    fn test_actions_run_in_fifo_order() {
        let rig = rig();
        let events = rig.dog.subscribe();
        let order = [
            walk(1),
            Action::new(ActionKind::Trot, 1, 400, Direction::Backward),
            Action::new(ActionKind::Turn, 1, 400, Direction::RIGHT),
        ];
        rig.driver.hold();
        for action in order {
            rig.dog.enqueue(action).unwrap();
        }
        rig.driver.release();

        let started: Vec<Action> = (0..order.len() * 2)
            .map(|_| next(&events))
            .filter_map(|e| match e {
                MotionEvent::Started(a) => Some(a),
                _ => None,
            })
            .collect();
        assert_eq!(started, order);
    }

    #[test]
    fn test_stop_discards_queue_and_homes_once() {
        let rig = rig();
        let events = rig.dog.subscribe();
        rig.driver.hold();
        rig.dog.enqueue(walk(20)).unwrap();
        assert_eq!(next(&events), MotionEvent::Started(walk(20)));

        for steps in 1..=3 {
            rig.dog.enqueue(walk(steps)).unwrap();
        }
        assert_eq!(rig.dog.pending(), 3);

        // The worker is parked inside a servo write; let it reach a tick boundary
        let releaser = {
            let driver = rig.driver.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                driver.release();
            })
        };
        rig.dog.stop().unwrap();
        releaser.join().unwrap();

        assert_eq!(next(&events), MotionEvent::Cancelled(walk(20)));
        assert_eq!(next(&events), MotionEvent::Started(Action::home()));
        assert_eq!(next(&events), MotionEvent::Finished(Action::home()));
        assert!(events.recv_timeout(Duration::from_millis(200)).is_err());
        assert_eq!(rig.dog.pending(), 0);
        assert!(!rig.dog.is_busy());
        assert_eq!(rig.dog.servos().positions(), *Posture::HOME.angles());
    }

    #[test]
    fn test_stop_turns_away_blocked_producer() {
        let rig = rig();
        let dog = Arc::new(rig.dog);
        let events = dog.subscribe();
        rig.driver.hold();
        dog.enqueue(walk(20)).unwrap();
        assert_eq!(next(&events), MotionEvent::Started(walk(20)));

        for steps in 1..=10 {
            dog.enqueue(walk(steps)).unwrap();
        }
        assert_eq!(dog.pending(), 10);
        let producer = {
            let dog = dog.clone();
            thread::spawn(move || dog.enqueue(walk(11)))
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!producer.is_finished(), "eleventh enqueue should block");

        let releaser = {
            let driver = rig.driver.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                driver.release();
            })
        };
        dog.stop().unwrap();
        releaser.join().unwrap();
        assert!(matches!(producer.join().unwrap(), Err(Error::Cancelled)));

        assert_eq!(next(&events), MotionEvent::Cancelled(walk(20)));
        assert_eq!(next(&events), MotionEvent::Started(Action::home()));
        assert_eq!(next(&events), MotionEvent::Finished(Action::home()));
        assert!(events.recv_timeout(Duration::from_millis(200)).is_err());
        assert_eq!(dog.pending(), 0);
    }

    #[test]
    fn test_halt_leaves_queue_empty_and_idle() {
        let rig = rig();
        let events = rig.dog.subscribe();
        rig.driver.hold();
        rig.dog.enqueue(walk(20)).unwrap();
        assert_eq!(next(&events), MotionEvent::Started(walk(20)));
        rig.dog.enqueue(walk(5)).unwrap();

        let releaser = {
            let driver = rig.driver.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                driver.release();
            })
        };
        let discarded = rig.dog.halt();
        releaser.join().unwrap();

        assert_eq!(discarded, vec![walk(5)]);
        assert_eq!(rig.dog.pending(), 0);
        assert_eq!(rig.dog.status(), DogStatus::Idle);
        assert!(rig.dog.worker.lock().is_none());
    }

    #[test]
    fn test_home_on_start() {
        let rig = rig_with(DogConfig::default(), MemoryTrimStore::new());
        let deadline = std::time::Instant::now() + WAIT;
        while rig.dog.servos().positions() != *Posture::HOME.angles()
            || rig.dog.is_busy()
        {
            assert!(std::time::Instant::now() < deadline, "never reached home");
            thread::sleep(Duration::from_millis(5));
        }
        assert!(rig.driver.is_attached(17));
    }

    #[test]
    fn test_trims_loaded_and_persisted() {
        let rig = rig_with(
            DogConfig::default().with_home_on_start(false),
            MemoryTrimStore::with_trims(Trims::from_array([3, 0, -2, 0])),
        );
        assert_eq!(rig.dog.trims().to_array(), [3, 0, -2, 0]);

        rig.dog.set_trim(Joint::FrontLeft, 10).unwrap();
        assert_eq!(rig.dog.trims().to_array(), [10, 0, -2, 0]);
        assert_eq!(rig.store.save_count(), 1);
        assert_eq!(rig.store.load().unwrap().front_left, 10);

        let err = rig.dog.set_trim(Joint::RearRight, 51).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(rig.store.save_count(), 1);
    }

    #[test]
    fn test_failed_write_reports_failure() {
        let rig = rig();
        let events = rig.dog.subscribe();
        rig.driver.set_fail_writes(true);
        rig.dog.enqueue(walk(1)).unwrap();

        assert_eq!(next(&events), MotionEvent::Started(walk(1)));
        assert!(matches!(next(&events), MotionEvent::Failed(a, _) if a == walk(1)));
        assert!(!rig.dog.is_busy());
    }

    #[tokio::test]
    async fn test_enqueue_async() {
        let rig = rig();
        let events = rig.dog.subscribe();
        let dog = Arc::new(rig.dog);
        dog.clone().enqueue_async(walk(1)).await.unwrap();
        assert_eq!(next(&events), MotionEvent::Started(walk(1)));
        assert_eq!(next(&events), MotionEvent::Finished(walk(1)));
    }
}
