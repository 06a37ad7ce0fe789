//! Status command implementation
//!
//! Reads every zone once, evaluates curves and safety, and reports what
//! the control loop would command, without touching the controller fans.

use crate::cli::args::{Cli, OutputFormat};
use crate::cli::output::{print_output, StatusReport, ZoneStatusEntry};
use crate::commands::{build_client, load_config};
use crate::control::{SafetyOverride, ZoneState};
use crate::error::Result;
use crate::sensors::TemperatureReader;

/// Execute the status command
pub fn run_status(cli: &Cli, format: OutputFormat) -> Result<()> {
    let config = load_config(cli);
    config.validate()?;

    let zones = config.to_zones()?;
    let client = build_client(&config)?;
    let reader = TemperatureReader::from_zones(&zones, Some(client.clone()));
    let safety = SafetyOverride::new(
        config.control.max_consecutive_errors,
        config.control.stale_after(),
    );

    let mut entries = Vec::with_capacity(zones.len());
    for zone in &zones {
        let sample = reader.read(zone);
        // A fresh state has no history, so an unavailable reading shows
        // the emergency speed the loop would start from
        let state = ZoneState::new();
        let decision = safety.apply(&state, sample.reading, zone);

        entries.push(ZoneStatusEntry {
            id: zone.id.clone(),
            temperature: sample.reading.value().map(|t| t.as_celsius()),
            source: sample.source.map(|s| s.to_string()),
            computed_speed: decision.effective_speed.as_raw(),
            emergency: decision.is_emergency(),
            targets: zone.targets.iter().map(|t| t.to_string()).collect(),
        });
    }

    let report = StatusReport {
        endpoint: client.endpoint(),
        dialect: client.dialect().to_string(),
        zones: entries,
    };
    print_output(&report, format)?;

    Ok(())
}
