//! Actuator command model
//!
//! Commands are value objects constructed per invocation and rendered to
//! wire strings by the active dialect. Re-sending any of them is safe; the
//! client never needs compensating actions on retry.

use crate::domain::{FanSpeed, FanTarget};
use std::fmt;

/// An imperative instruction for the management controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuatorCommand {
    /// Set an individual fan to a fixed speed
    SetFan { index: u8, speed: FanSpeed },
    /// Set a minimum (floor) speed on an individual fan
    SetFanFloor { index: u8, speed: FanSpeed },
    /// Set a controller zone's duty cycle (0-100)
    SetZoneDuty { zone: u8, duty: u8 },
    /// Take fan control away from the controller firmware
    EnableManualControl,
    /// Stop a firmware sensor from influencing fan speed
    DisableSensor { id: u8 },
    /// Query one named temperature sensor
    ReadSensor { name: String },
    /// Query fan status
    FanInfo,
}

impl ActuatorCommand {
    /// The speed-setting command for a target, translating raw PWM to a
    /// duty percentage where the target is a controller zone.
    pub fn set_speed(target: FanTarget, speed: FanSpeed) -> Self {
        match target {
            FanTarget::Fan(index) => ActuatorCommand::SetFan { index, speed },
            FanTarget::Zone(zone) => ActuatorCommand::SetZoneDuty {
                zone,
                duty: speed.as_percent(),
            },
        }
    }

    /// The baseline (floor) command for a target
    pub fn set_floor(target: FanTarget, speed: FanSpeed) -> Self {
        match target {
            FanTarget::Fan(index) => ActuatorCommand::SetFanFloor { index, speed },
            // Zone controllers have no separate floor; the duty is the floor
            FanTarget::Zone(zone) => ActuatorCommand::SetZoneDuty {
                zone,
                duty: speed.as_percent(),
            },
        }
    }
}

impl fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorCommand::SetFan { index, speed } => {
                write!(f, "set fan {} to {}", index, speed)
            }
            ActuatorCommand::SetFanFloor { index, speed } => {
                write!(f, "set fan {} floor to {}", index, speed)
            }
            ActuatorCommand::SetZoneDuty { zone, duty } => {
                write!(f, "set zone {} duty to {}%", zone, duty)
            }
            ActuatorCommand::EnableManualControl => write!(f, "enable manual fan control"),
            ActuatorCommand::DisableSensor { id } => write!(f, "disable sensor {}", id),
            ActuatorCommand::ReadSensor { name } => write!(f, "read sensor '{}'", name),
            ActuatorCommand::FanInfo => write!(f, "query fan info"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_speed_for_fan_target() {
        let cmd = ActuatorCommand::set_speed(FanTarget::Fan(3), FanSpeed::new(200));
        assert_eq!(
            cmd,
            ActuatorCommand::SetFan {
                index: 3,
                speed: FanSpeed::new(200)
            }
        );
    }

    #[test]
    fn test_set_speed_for_zone_target_converts_to_duty() {
        let cmd = ActuatorCommand::set_speed(FanTarget::Zone(1), FanSpeed::new(255));
        assert_eq!(cmd, ActuatorCommand::SetZoneDuty { zone: 1, duty: 100 });
    }

    #[test]
    fn test_command_display() {
        let cmd = ActuatorCommand::SetFan {
            index: 2,
            speed: FanSpeed::new(128),
        };
        assert_eq!(cmd.to_string(), "set fan 2 to 128/255");
    }
}
