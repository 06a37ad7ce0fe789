//! Controller dialects
//!
//! Renders actuator commands to the wire strings each controller family
//! understands and classifies their raw output. Everything below the
//! command-string level is the transport's problem.

use crate::actuator::ActuatorCommand;
use crate::error::ActuatorError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Controller command dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// HP iLO4 with unlocked fan CLI, reached over SSH
    #[default]
    Ilo4Ssh,
    /// Supermicro BMC raw fan commands, reached over ipmitool
    SupermicroIpmi,
}

/// What the dialect makes of a command's raw output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputClass {
    /// Command accepted
    Ok,
    /// Output was empty where the controller normally echoes something.
    /// Known iLO4 quirk; bounded retry, never success.
    Empty,
    /// The remote session has expired or was dropped
    SessionExpired,
    /// Credentials were refused
    AuthFailed,
    /// Controller returned an explicit error
    Rejected(String),
}

impl Dialect {
    /// Render a command to its wire string
    ///
    /// # Errors
    /// Returns `ActuatorError::CommandRejected` when this controller family
    /// has no equivalent of the command.
    pub fn render(&self, command: &ActuatorCommand) -> Result<String, ActuatorError> {
        match self {
            Dialect::Ilo4Ssh => self.render_ilo4(command),
            Dialect::SupermicroIpmi => self.render_ipmi(command),
        }
    }

    /// Whether this controller family can express the command at all.
    /// Used by init to skip rather than log spurious failures.
    pub fn supports(&self, command: &ActuatorCommand) -> bool {
        self.render(command).is_ok()
    }

    fn render_ilo4(&self, command: &ActuatorCommand) -> Result<String, ActuatorError> {
        match command {
            ActuatorCommand::SetFan { index, speed } => {
                Ok(format!("fan p {} max {}", index, speed.as_raw()))
            }
            ActuatorCommand::SetFanFloor { index, speed } => {
                Ok(format!("fan p {} min {}", index, speed.as_raw()))
            }
            ActuatorCommand::DisableSensor { id } => Ok(format!("fan t {} off", id)),
            ActuatorCommand::ReadSensor { .. } => Ok("fan info t".to_string()),
            ActuatorCommand::FanInfo => Ok("fan info".to_string()),
            // Patched iLO4 firmware exposes the fan CLI unconditionally
            ActuatorCommand::EnableManualControl | ActuatorCommand::SetZoneDuty { .. } => {
                Err(ActuatorError::CommandRejected(format!(
                    "iLO4 dialect cannot express: {}",
                    command
                )))
            }
        }
    }

    fn render_ipmi(&self, command: &ActuatorCommand) -> Result<String, ActuatorError> {
        match command {
            ActuatorCommand::SetZoneDuty { zone, duty } => Ok(format!(
                "raw 0x30 0x70 0x66 0x01 0x{:02x} 0x{:02x}",
                zone,
                (*duty).min(100)
            )),
            ActuatorCommand::EnableManualControl => Ok("raw 0x30 0x45 0x01 0x01".to_string()),
            ActuatorCommand::ReadSensor { name } => Ok(format!("sensor reading \"{}\"", name)),
            ActuatorCommand::FanInfo => Ok("sdr type Fan".to_string()),
            ActuatorCommand::SetFan { .. }
            | ActuatorCommand::SetFanFloor { .. }
            | ActuatorCommand::DisableSensor { .. } => {
                Err(ActuatorError::CommandRejected(format!(
                    "Supermicro dialect cannot express: {}",
                    command
                )))
            }
        }
    }

    /// Classify a command's raw output
    pub fn classify(&self, output: &str) -> OutputClass {
        let trimmed = output.trim();
        let lower = trimmed.to_lowercase();

        if lower.contains("permission denied")
            || lower.contains("authentication failed")
            || lower.contains("invalid password")
        {
            return OutputClass::AuthFailed;
        }

        if (lower.contains("session") && (lower.contains("expired") || lower.contains("closed")))
            || lower.contains("cli session stopped")
            || lower.contains("connection timed out")
        {
            return OutputClass::SessionExpired;
        }

        if lower.contains("invalid")
            || lower.contains("unable to")
            || lower.starts_with("error")
            || lower.contains("command failed")
        {
            let first_line = trimmed.lines().next().unwrap_or(trimmed).to_string();
            return OutputClass::Rejected(first_line);
        }

        if trimmed.is_empty() {
            return match self {
                // iLO4 sporadically swallows its echo; retry, don't trust it
                Dialect::Ilo4Ssh => OutputClass::Empty,
                // ipmitool raw writes legitimately print nothing
                Dialect::SupermicroIpmi => OutputClass::Ok,
            };
        }

        OutputClass::Ok
    }

    /// A cheap command suitable for liveness probing and session recovery
    pub fn probe_command(&self) -> &'static str {
        match self {
            Dialect::Ilo4Ssh => "fan info",
            Dialect::SupermicroIpmi => "chassis status",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Ilo4Ssh => write!(f, "iLO4 (ssh)"),
            Dialect::SupermicroIpmi => write!(f, "Supermicro (ipmi)"),
        }
    }
}
