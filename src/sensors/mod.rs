//! Temperature sensing layer
//!
//! Sources implement [`TempSource`] and are tried in a fixed priority
//! order per zone; the reader applies the zone's sanity window and
//! aggregation policy and reports total failure as the unavailable
//! sentinel, never as an error.

pub mod bmc;
pub mod cli;
pub mod smart;
pub mod sysfs;

pub use bmc::BmcSource;
pub use cli::SensorsCliSource;
pub use smart::SmartSource;
pub use sysfs::SysfsThermalSource;

use crate::actuator::ActuatorClient;
use crate::domain::{SourceKind, Temperature, TemperatureSample, ThermalZone};
use crate::error::SensorError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// One temperature source for one zone
///
/// A source may return several raw values (per-core readings, several
/// disks); the reader reduces them with the zone's aggregation policy.
pub trait TempSource: Send + Sync {
    /// Which source family this is (fixes its priority)
    fn kind(&self) -> SourceKind;

    /// Read all raw values this source can currently provide
    fn read(&self) -> Result<Vec<Temperature>, SensorError>;
}

/// Reads one sample per zone per cycle, applying priority order, sanity
/// windows, and aggregation. Never mutates control state.
pub struct TemperatureReader {
    sources: HashMap<String, Vec<Box<dyn TempSource>>>,
}

impl TemperatureReader {
    /// Create a reader from pre-built per-zone source lists
    pub fn new(sources: HashMap<String, Vec<Box<dyn TempSource>>>) -> Self {
        Self { sources }
    }

    /// Build sources for each zone from its selectors, in priority order:
    /// thermal zone files, sensor utility, remote BMC sensor, disk SMART.
    pub fn from_zones(zones: &[ThermalZone], client: Option<Arc<ActuatorClient>>) -> Self {
        let mut sources: HashMap<String, Vec<Box<dyn TempSource>>> = HashMap::new();

        for zone in zones {
            let mut list: Vec<Box<dyn TempSource>> = Vec::new();

            if !zone.sources.thermal_zones.is_empty() {
                let paths = zone
                    .sources
                    .thermal_zones
                    .iter()
                    .map(PathBuf::from)
                    .collect();
                list.push(Box::new(SysfsThermalSource::new(paths)));
            }
            if zone.sources.sensors_match.is_some() {
                list.push(Box::new(SensorsCliSource::new(
                    zone.sources.sensors_match.clone(),
                )));
            }
            if let (Some(sensor), Some(client)) = (&zone.sources.bmc_sensor, &client) {
                list.push(Box::new(BmcSource::new(Arc::clone(client), sensor.clone())));
            }
            if !zone.sources.disks.is_empty() {
                list.push(Box::new(SmartSource::new(zone.sources.disks.clone())));
            }

            sources.insert(zone.id.clone(), list);
        }

        Self { sources }
    }

    /// Read one sample for a zone
    ///
    /// Sources are tried in priority order; a source is accepted only if at
    /// least one of its raw values falls inside the zone's sanity window.
    /// Total failure yields the unavailable sentinel.
    pub fn read(&self, zone: &ThermalZone) -> TemperatureSample {
        let sources = match self.sources.get(&zone.id) {
            Some(sources) => sources,
            None => {
                log::debug!("zone {}: no sources registered", zone.id);
                return TemperatureSample::unavailable(&zone.id);
            }
        };

        for source in sources {
            let raw = match source.read() {
                Ok(values) => values,
                Err(err) => {
                    log::debug!("zone {}: source {} failed: {}", zone.id, source.kind(), err);
                    continue;
                }
            };

            let plausible: Vec<Temperature> = raw
                .iter()
                .copied()
                .filter(|t| zone.sanity.contains(*t))
                .collect();

            if plausible.len() < raw.len() {
                log::debug!(
                    "zone {}: source {} had {} implausible value(s)",
                    zone.id,
                    source.kind(),
                    raw.len() - plausible.len()
                );
            }

            if let Some(temp) = zone.aggregation.reduce(&plausible) {
                return TemperatureSample::valid(&zone.id, temp, source.kind());
            }
        }

        TemperatureSample::unavailable(&zone.id)
    }
}
