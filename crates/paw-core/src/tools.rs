//! Tool surface for a remote invocation layer
//!
//! One method per verb, plus [`DogTools::invoke`] for layers that hand over
//! a tool name and a JSON parameter object. Parameter defaults match what
//! the remote side advertises: `action = "home"`, `steps = 4`,
//! `speed = 600`, `direction = 1`.

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::action::{Action, ActionKind};
use crate::control::{DogController, DogStatus};
use crate::hardware::{BatteryLevel, Joint, Trims};
use crate::{Error, Result};

/// Every tool name [`DogTools::invoke`] accepts (a `self.` prefix is ignored)
pub const TOOL_NAMES: [&str; 6] = [
    "dog.action",
    "dog.stop",
    "dog.set_trim",
    "dog.get_trims",
    "dog.get_status",
    "battery.get_level",
];

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ActionParams {
    action: String,
    steps: i32,
    speed: i32,
    direction: i32,
}

impl Default for ActionParams {
    fn default() -> Self {
        Self {
            action: "home".into(),
            steps: 4,
            speed: 600,
            direction: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TrimParams {
    servo_type: String,
    trim_value: i32,
}

impl Default for TrimParams {
    fn default() -> Self {
        Self {
            servo_type: "front_left".into(),
            trim_value: 0,
        }
    }
}

/// The only crossing point between the tool layer and the controller
#[derive(Debug, Clone)]
pub struct DogTools {
    controller: Arc<DogController>,
}

impl DogTools {
    pub fn new(controller: Arc<DogController>) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &Arc<DogController> {
        &self.controller
    }

    /// `dog.action`: validate, normalize and queue one action
    pub fn action(&self, name: &str, steps: i32, speed: i32, direction: i32) -> Result<bool> {
        let kind: ActionKind = name.parse()?;
        let action = Action::from_request(kind, steps, speed, direction)?;
        self.controller.enqueue(action)?;
        Ok(true)
    }

    /// `dog.stop`
    pub fn stop(&self) -> Result<bool> {
        self.controller.stop()?;
        Ok(true)
    }

    /// `dog.set_trim`: returns the confirmation message
    pub fn set_trim(&self, servo_type: &str, trim_value: i32) -> Result<String> {
        let joint = Joint::from_name(servo_type)?;
        self.controller.set_trim(joint, trim_value)?;
        Ok(format!(
            "Servo {} trim set to {} degrees, permanently saved",
            joint, trim_value
        ))
    }

    /// `dog.get_trims`
    pub fn get_trims(&self) -> Trims {
        self.controller.trims()
    }

    /// `dog.get_status`
    pub fn get_status(&self) -> DogStatus {
        self.controller.status()
    }

    /// `battery.get_level`
    pub fn battery_level(&self) -> Result<BatteryLevel> {
        self.controller.battery_level()
    }

    /// Dispatch a tool call by name with JSON parameters
    pub fn invoke(&self, tool: &str, params: Value) -> Result<Value> {
        let name = tool.strip_prefix("self.").unwrap_or(tool);
        tracing::debug!("Tool call {} {}", name, params);

        match name {
            "dog.action" => {
                let p: ActionParams = parse_params(params)?;
                Ok(json!(self.action(&p.action, p.steps, p.speed, p.direction)?))
            }
            "dog.stop" => Ok(json!(self.stop()?)),
            "dog.set_trim" => {
                let p: TrimParams = parse_params(params)?;
                Ok(Value::String(self.set_trim(&p.servo_type, p.trim_value)?))
            }
            "dog.get_trims" => Ok(serde_json::to_value(self.get_trims())?),
            "dog.get_status" => Ok(serde_json::to_value(self.get_status())?),
            "battery.get_level" => Ok(serde_json::to_value(self.battery_level()?)?),
            _ => Err(Error::InvalidInput(format!(
                "Unknown tool '{}', available: {}",
                tool,
                TOOL_NAMES.join(", ")
            ))),
        }
    }
}

fn parse_params<T>(params: Value) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if params.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(params).map_err(|e| Error::InvalidInput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Direction;
    use crate::config::DogConfig;
    use crate::control::{MotionEvent, SimClock};
    use crate::hardware::mock::{FixedPowerSource, MemoryTrimStore, MockServoDriver};
    use std::time::Duration;

    fn tools() -> DogTools {
        let controller = DogController::new(
            DogConfig::default().with_home_on_start(false),
            Arc::new(MockServoDriver::new()),
            Arc::new(MemoryTrimStore::new()),
            Arc::new(FixedPowerSource(BatteryLevel {
                level: 76,
                charging: true,
            })),
            Arc::new(SimClock::new()),
        )
        .unwrap();
        DogTools::new(Arc::new(controller))
    }

    #[test]
    fn test_set_trim_then_get_trims() {
        let tools = tools();
        let msg = tools.set_trim("front_left", 10).unwrap();
        assert_eq!(msg, "Servo front_left trim set to 10 degrees, permanently saved");

        let trims = tools.invoke("dog.get_trims", Value::Null).unwrap();
        assert_eq!(
            trims,
            json!({"front_left": 10, "front_right": 0, "rear_left": 0, "rear_right": 0})
        );
    }

    #[test]
    fn test_set_trim_rejects_unknown_servo() {
        let tools = tools();
        let err = tools.set_trim("tail", 5).unwrap_err();
        assert!(matches!(err, Error::InvalidJoint(_)));
        assert!(err.to_string().contains("front_left, front_right, rear_left, rear_right"));
        assert_eq!(tools.get_trims(), Trims::default());
    }

    #[test]
    fn test_unknown_action_is_reported() {
        let tools = tools();
        let err = tools.action("moonwalk", 4, 600, 1).unwrap_err();
        assert!(matches!(err, Error::InvalidAction(_)));
        assert!(err.to_string().contains("Available actions: trot, walk"));
        assert_eq!(tools.controller().pending(), 0);
    }

    #[test]
    fn test_action_out_of_range() {
        let tools = tools();
        assert!(matches!(
            tools.action("walk", 21, 600, 1),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            tools.action("walk", 4, 200, 1),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_invoke_walk_queues_walk() {
        let tools = tools();
        let events = tools.controller().subscribe();
        let result = tools
            .invoke(
                "self.dog.action",
                json!({"action": "walk", "steps": 4, "speed": 600, "direction": 1}),
            )
            .unwrap();
        assert_eq!(result, json!(true));
        assert_eq!(
            events.recv_timeout(Duration::from_secs(5)).unwrap(),
            MotionEvent::Started(Action::new(ActionKind::Walk, 4, 600, Direction::Forward))
        );
    }

    #[test]
    fn test_invoke_action_defaults_to_home() {
        let tools = tools();
        let events = tools.controller().subscribe();
        tools.invoke("dog.action", json!({})).unwrap();
        assert_eq!(
            events.recv_timeout(Duration::from_secs(5)).unwrap(),
            MotionEvent::Started(Action::home())
        );
    }

    #[test]
    fn test_sit_is_normalized() {
        let tools = tools();
        let events = tools.controller().subscribe();
        tools.action("sit", 9, 1500, -1).unwrap();
        let started = loop {
            if let MotionEvent::Started(a) = events.recv_timeout(Duration::from_secs(5)).unwrap() {
                break a;
            }
        };
        assert_eq!(started, Action::new(ActionKind::Sit, 1, 0, Direction::Forward));
    }

    #[test]
    fn test_stop_queues_home() {
        let tools = tools();
        let events = tools.controller().subscribe();
        assert!(tools.stop().unwrap());
        assert_eq!(
            events.recv_timeout(Duration::from_secs(5)).unwrap(),
            MotionEvent::Started(Action::home())
        );
    }

    #[test]
    fn test_status_and_battery() {
        let tools = tools();
        assert_eq!(tools.invoke("dog.get_status", Value::Null).unwrap(), json!("idle"));
        assert_eq!(
            tools.invoke("battery.get_level", Value::Null).unwrap(),
            json!({"level": 76, "charging": true})
        );
    }

    #[test]
    fn test_unknown_tool() {
        let tools = tools();
        let err = tools.invoke("dog.fly", Value::Null).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
