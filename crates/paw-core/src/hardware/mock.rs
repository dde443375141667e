//! In-memory collaborators for tests and the simulator binary

use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use super::{BatteryLevel, PowerSource, ServoDriver, TrimStore, Trims};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct DriverLog {
    attached: HashSet<u8>,
    writes: Vec<(u8, f64)>,
    last: HashMap<u8, f64>,
}

/// A servo driver that records every command
///
/// Writes can be held behind a gate to freeze a worker mid-motion.
#[derive(Debug, Default)]
pub struct MockServoDriver {
    log: Mutex<DriverLog>,
    held: Mutex<bool>,
    gate: Condvar,
    fail_writes: AtomicBool,
}

impl MockServoDriver {
    /// Create a new mock driver
    pub fn new() -> Self {
        Self::default()
    }

    /// Block every subsequent `write_angle` until [`release`](Self::release)
    pub fn hold(&self) {
        *self.held.lock() = true;
    }

    /// Let held writes through
    pub fn release(&self) {
        *self.held.lock() = false;
        self.gate.notify_all();
    }

    /// Make `write_angle` fail with a hardware error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Most recent angle written to `pin`
    pub fn last_angle(&self, pin: u8) -> Option<f64> {
        self.log.lock().last.get(&pin).copied()
    }

    /// Every angle written to `pin`, oldest first
    pub fn writes_for(&self, pin: u8) -> Vec<f64> {
        self.log
            .lock()
            .writes
            .iter()
            .filter(|(p, _)| *p == pin)
            .map(|&(_, angle)| angle)
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.log.lock().writes.len()
    }

    pub fn is_attached(&self, pin: u8) -> bool {
        self.log.lock().attached.contains(&pin)
    }

    /// Forget recorded writes (attachment state is kept)
    pub fn clear(&self) {
        let mut log = self.log.lock();
        log.writes.clear();
        log.last.clear();
    }
}

impl ServoDriver for MockServoDriver {
    fn attach(&self, pin: u8) -> Result<()> {
        self.log.lock().attached.insert(pin);
        Ok(())
    }

    fn detach(&self, pin: u8) -> Result<()> {
        self.log.lock().attached.remove(&pin);
        Ok(())
    }

    fn write_angle(&self, pin: u8, angle: f64) -> Result<()> {
        {
            let mut held = self.held.lock();
            while *held {
                self.gate.wait(&mut held);
            }
        }
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(Error::Hardware(format!("pin {} rejected write", pin)));
        }
        let mut log = self.log.lock();
        log.writes.push((pin, angle));
        log.last.insert(pin, angle);
        Ok(())
    }

    fn name(&self) -> &str {
        "MockServoDriver"
    }
}

/// Trim storage that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryTrimStore {
    trims: Mutex<Trims>,
    saves: Mutex<usize>,
}

impl MemoryTrimStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with previously "persisted" trims
    pub fn with_trims(trims: Trims) -> Self {
        Self {
            trims: Mutex::new(trims),
            saves: Mutex::new(0),
        }
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

impl TrimStore for MemoryTrimStore {
    fn load(&self) -> Result<Trims> {
        Ok(*self.trims.lock())
    }

    fn save(&self, trims: &Trims) -> Result<()> {
        *self.trims.lock() = *trims;
        *self.saves.lock() += 1;
        Ok(())
    }
}

/// Power source reporting a constant reading
#[derive(Debug, Clone, Copy)]
pub struct FixedPowerSource(pub BatteryLevel);

impl Default for FixedPowerSource {
    fn default() -> Self {
        Self(BatteryLevel {
            level: 100,
            charging: false,
        })
    }
}

impl PowerSource for FixedPowerSource {
    fn battery_level(&self) -> Result<BatteryLevel> {
        Ok(self.0)
    }
}
