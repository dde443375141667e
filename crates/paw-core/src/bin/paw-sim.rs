//! paw-sim - run a scripted session against a recording servo driver
//!
//! Usage: `paw-sim [config.json] [--realtime]`
//!
//! Without `--realtime` the session runs on simulated time and finishes
//! instantly. Set `RUST_LOG=paw_core=debug` to see every plan step.

use paw_core::hardware::mock::{FixedPowerSource, MemoryTrimStore, MockServoDriver};
use paw_core::{
    Clock, DogConfig, DogController, DogTools, MotionEvent, SimClock, SystemClock,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

fn main() -> paw_core::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("paw_core=info,paw_sim=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let realtime = args.iter().any(|a| a == "--realtime");

    let config = match args.iter().skip(1).find(|a| !a.starts_with("--")) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            DogConfig::load(Path::new(path))?
        }
        None => {
            info!("Using default configuration");
            DogConfig::default()
        }
    };

    let clock: Arc<dyn Clock> = if realtime {
        Arc::new(SystemClock::new())
    } else {
        Arc::new(SimClock::new())
    };
    let driver = Arc::new(MockServoDriver::new());

    info!("paw-sim v{}", paw_core::VERSION);
    let controller = Arc::new(DogController::new(
        config,
        driver.clone(),
        Arc::new(MemoryTrimStore::new()),
        Arc::new(FixedPowerSource::default()),
        clock.clone(),
    )?);
    let events = controller.subscribe();
    let tools = DogTools::new(controller.clone());

    let script = [
        ("dog.set_trim", json!({"servo_type": "front_left", "trim_value": 3})),
        ("dog.action", json!({"action": "walk", "steps": 4, "speed": 600, "direction": 1})),
        ("dog.action", json!({"action": "turn", "steps": 2, "speed": 800, "direction": -1})),
        ("dog.action", json!({"action": "handshake", "steps": 3, "speed": 400, "direction": 1})),
        ("dog.action", json!({"action": "highfive", "speed": 1000, "direction": -1})),
        ("dog.action", json!({"action": "laydown"})),
    ];
    let queued = script.iter().filter(|(tool, _)| *tool == "dog.action").count();

    for (tool, params) in script {
        let result = tools.invoke(tool, params)?;
        info!("{} -> {}", tool, result);
    }

    // Terminal events for the scripted actions, plus the start-up Home if we see it
    let mut remaining = queued;
    while remaining > 0 {
        let event = events
            .recv_timeout(Duration::from_secs(120))
            .map_err(|_| paw_core::Error::Worker("timed out waiting for motion events".into()))?;
        match &event {
            MotionEvent::Started(action) => info!("started {}", action),
            MotionEvent::Finished(action) if action.kind != paw_core::ActionKind::Home => {
                info!("finished {}", action);
                remaining -= 1;
            }
            MotionEvent::Finished(action) => info!("finished {}", action),
            MotionEvent::Cancelled(action) => {
                warn!("cancelled {}", action);
                remaining = remaining.saturating_sub(1);
            }
            MotionEvent::Failed(action, reason) => {
                warn!("failed {}: {}", action, reason);
                remaining = remaining.saturating_sub(1);
            }
        }
    }

    info!("trims: {}", tools.invoke("dog.get_trims", serde_json::Value::Null)?);
    info!("status: {}", tools.invoke("dog.get_status", serde_json::Value::Null)?);
    info!("battery: {}", tools.invoke("battery.get_level", serde_json::Value::Null)?);
    info!(
        "{} servo writes over {:.1}s of {} time",
        driver.write_count(),
        clock.now().as_secs_f64(),
        if realtime { "wall" } else { "simulated" }
    );

    tools.stop()?;
    Ok(())
}
