//! Disk SMART temperature source
//!
//! Runs `smartctl -A` per configured disk and pulls the temperature
//! attribute (194 Temperature_Celsius, or 190 Airflow_Temperature_Cel on
//! drives that only report that one).

use crate::domain::{SourceKind, Temperature};
use crate::error::SensorError;
use crate::exec::run_with_timeout;
use crate::sensors::TempSource;
use std::time::Duration;

/// Timeout per smartctl invocation; spun-down disks can be slow to answer
const SMARTCTL_TIMEOUT: Duration = Duration::from_secs(15);

/// Temperature source over a group of block devices
pub struct SmartSource {
    disks: Vec<String>,
}

impl SmartSource {
    /// Create a source for the given devices (e.g. `/dev/sda`)
    pub fn new(disks: Vec<String>) -> Self {
        Self { disks }
    }

    fn read_disk(disk: &str) -> Result<Temperature, SensorError> {
        let output = run_with_timeout("smartctl", &["-A", disk], SMARTCTL_TIMEOUT)
            .map_err(|e| SensorError::CommandFailed(e.to_string()))?;
        // smartctl uses nonzero exit bits for non-fatal conditions, so the
        // output is parsed regardless of status
        parse_smart_output(&output.stdout).ok_or_else(|| SensorError::Unparseable {
            origin: format!("smartctl {}", disk),
            detail: "no temperature attribute found".to_string(),
        })
    }
}

impl TempSource for SmartSource {
    fn kind(&self) -> SourceKind {
        SourceKind::SmartAttr
    }

    fn read(&self) -> Result<Vec<Temperature>, SensorError> {
        let mut values = Vec::with_capacity(self.disks.len());
        let mut last_err = None;
        for disk in &self.disks {
            match Self::read_disk(disk) {
                Ok(temp) => values.push(temp),
                Err(err) => {
                    log::debug!("SMART read failed for {}: {}", disk, err);
                    last_err = Some(err);
                }
            }
        }
        if values.is_empty() {
            return Err(last_err.unwrap_or_else(|| {
                SensorError::NotFound("no disks configured".to_string())
            }));
        }
        Ok(values)
    }
}

/// Extract the temperature from a `smartctl -A` attribute table
fn parse_smart_output(output: &str) -> Option<Temperature> {
    for line in output.lines() {
        let is_temp_attr = line.contains("Temperature_Celsius")
            || line.contains("Airflow_Temperature_Cel")
            // NVMe smartctl prints "Temperature:  34 Celsius"
            || line.trim_start().starts_with("Temperature:");
        if !is_temp_attr {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        // ATA attribute rows: ID# ATTRIBUTE_NAME FLAG VALUE WORST THRESH
        // TYPE UPDATED WHEN_FAILED RAW_VALUE — the raw value is field 10,
        // possibly suffixed like "34 (Min/Max 21/45)"
        let candidate = if fields.len() >= 10 {
            fields[9]
        } else {
            // NVMe form: "Temperature: 34 Celsius"
            fields.get(1)?
        };

        let digits: String = candidate.chars().take_while(char::is_ascii_digit).collect();
        if let Ok(value) = digits.parse::<i32>() {
            return Some(Temperature::new(value));
        }
    }
    None
}
