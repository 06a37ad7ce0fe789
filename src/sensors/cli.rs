//! Sensor utility temperature source
//!
//! Runs the lm-sensors `sensors` utility and scrapes temperature tokens
//! (`+54.0°C`) from its output, optionally filtered to lines whose label
//! matches a configured substring.

use crate::domain::{SourceKind, Temperature};
use crate::error::SensorError;
use crate::exec::run_with_timeout;
use crate::sensors::TempSource;
use std::time::Duration;

/// Timeout for one sensor utility invocation
const SENSORS_TIMEOUT: Duration = Duration::from_secs(10);

/// Temperature source wrapping the `sensors` CLI
pub struct SensorsCliSource {
    program: String,
    label_match: Option<String>,
}

impl SensorsCliSource {
    /// Create a source, optionally restricted to labels containing `label_match`
    pub fn new(label_match: Option<String>) -> Self {
        Self {
            program: "sensors".to_string(),
            label_match,
        }
    }

    /// Override the utility name (tests)
    #[cfg(test)]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl TempSource for SensorsCliSource {
    fn kind(&self) -> SourceKind {
        SourceKind::SensorsCli
    }

    fn read(&self) -> Result<Vec<Temperature>, SensorError> {
        let output = run_with_timeout(&self.program, &[], SENSORS_TIMEOUT)
            .map_err(|e| SensorError::CommandFailed(e.to_string()))?;
        if !output.success {
            return Err(SensorError::CommandFailed(format!(
                "{} exited with {:?}",
                self.program, output.code
            )));
        }

        let values = parse_sensors_output(&output.stdout, self.label_match.as_deref());
        if values.is_empty() {
            return Err(SensorError::Unparseable {
                origin: self.program.clone(),
                detail: match &self.label_match {
                    Some(label) => format!("no temperature lines matching '{}'", label),
                    None => "no temperature lines found".to_string(),
                },
            });
        }
        Ok(values)
    }
}

/// Extract Celsius values from sensor utility output
fn parse_sensors_output(output: &str, label_match: Option<&str>) -> Vec<Temperature> {
    let mut values = Vec::new();
    for line in output.lines() {
        if let Some(label) = label_match {
            if !line.to_lowercase().contains(&label.to_lowercase()) {
                continue;
            }
        }
        if let Some(temp) = parse_temp_token(line) {
            values.push(temp);
        }
    }
    values
}

/// Find the first `+NN.N°C` style token on a line
fn parse_temp_token(line: &str) -> Option<Temperature> {
    for token in line.split_whitespace() {
        let stripped = token
            .trim_start_matches('+')
            .trim_end_matches("°C")
            .trim_end_matches("C");
        if let Ok(value) = stripped.parse::<f64>() {
            if token.ends_with("°C") || token.ends_with("C") {
                return Some(Temperature::new(value as i32));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
coretemp-isa-0000
Adapter: ISA adapter
Package id 0:  +62.0°C  (high = +84.0°C, crit = +100.0°C)
Core 0:        +58.0°C  (high = +84.0°C, crit = +100.0°C)
Core 1:        +61.0°C  (high = +84.0°C, crit = +100.0°C)

acpitz-acpi-0
Adapter: ACPI interface
temp1:         +27.8°C  (crit = +105.0°C)
";

    #[test]
    fn test_parse_all_temperatures() {
        let values = parse_sensors_output(SAMPLE, None);
        assert_eq!(
            values,
            vec![
                Temperature::new(62),
                Temperature::new(58),
                Temperature::new(61),
                Temperature::new(27),
            ]
        );
    }

    #[test]
    fn test_parse_with_label_filter() {
        let values = parse_sensors_output(SAMPLE, Some("Core"));
        assert_eq!(values, vec![Temperature::new(58), Temperature::new(61)]);
    }

    #[test]
    fn test_parse_no_match() {
        assert!(parse_sensors_output(SAMPLE, Some("GPU")).is_empty());
    }

    #[test]
    fn test_parse_temp_token_ignores_non_celsius() {
        assert_eq!(parse_temp_token("fan1: 1200 RPM"), None);
        assert_eq!(
            parse_temp_token("temp1: +41.5°C"),
            Some(Temperature::new(41))
        );
    }

    #[test]
    fn test_missing_utility_is_command_failed() {
        let source =
            SensorsCliSource::new(None).with_program("definitely-not-a-real-sensors-binary");
        assert!(matches!(
            source.read(),
            Err(SensorError::CommandFailed(_))
        ));
    }
}
