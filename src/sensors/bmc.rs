//! Remote BMC sensor temperature source
//!
//! Queries a named temperature sensor through the actuator session. Shares
//! the controller endpoint's serialization; failure here is a skipped
//! source, never a command retry storm.

use crate::actuator::{ActuatorClient, ActuatorCommand};
use crate::domain::{SourceKind, Temperature};
use crate::error::SensorError;
use crate::sensors::TempSource;
use std::sync::Arc;

/// Temperature source querying the management controller itself
pub struct BmcSource {
    client: Arc<ActuatorClient>,
    sensor: String,
}

impl BmcSource {
    /// Create a source for one named controller sensor
    pub fn new(client: Arc<ActuatorClient>, sensor: impl Into<String>) -> Self {
        Self {
            client,
            sensor: sensor.into(),
        }
    }
}

impl TempSource for BmcSource {
    fn kind(&self) -> SourceKind {
        SourceKind::BmcSensor
    }

    fn read(&self) -> Result<Vec<Temperature>, SensorError> {
        let output = self
            .client
            .execute_once(&ActuatorCommand::ReadSensor {
                name: self.sensor.clone(),
            })
            .map_err(|e| SensorError::CommandFailed(e.to_string()))?;

        match parse_sensor_value(&output, &self.sensor) {
            Some(temp) => Ok(vec![temp]),
            None => Err(SensorError::Unparseable {
                origin: format!("bmc sensor '{}'", self.sensor),
                detail: "no numeric reading in output".to_string(),
            }),
        }
    }
}

/// Pull the reading off the line naming the sensor. Only tokens after the
/// name count, so numeric row indexes or digits inside the name itself
/// (e.g. "02-CPU 1") are never mistaken for the value. Falls back to the
/// first numeric token anywhere for single-value replies.
fn parse_sensor_value(output: &str, sensor: &str) -> Option<Temperature> {
    let sensor_lower = sensor.to_lowercase();
    let named = output.lines().find_map(|line| {
        let pos = line.to_lowercase().find(&sensor_lower)?;
        Some(&line[pos + sensor.len()..])
    });

    let tail = match named {
        Some(tail) => tail,
        None => output.lines().find(|l| !l.trim().is_empty())?,
    };

    for token in tail.split(|c: char| c.is_whitespace() || c == '|' || c == ',') {
        let cleaned = token
            .trim()
            .trim_end_matches("°C")
            .trim_end_matches('C');
        if cleaned.is_empty() {
            continue;
        }
        if let Ok(value) = cleaned.parse::<f64>() {
            return Some(Temperature::new(value as i32));
        }
    }
    None
}
