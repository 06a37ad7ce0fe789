//! Thermal zone domain type
//!
//! A zone is an independently-cooled thermal domain (one CPU, one disk
//! group). Zones are built from configuration at startup and immutable for
//! the duration of a run.

use crate::domain::{Aggregation, FanCurve, FanSpeed, FanTarget, SanityWindow, SpeedLimits, Temperature};
use crate::error::DomainError;

/// Selectors describing where a zone's temperature may come from, in the
/// fixed source priority order (thermal zone file, sensor utility, remote
/// BMC sensor, disk SMART).
#[derive(Debug, Clone, Default)]
pub struct SourceSelectors {
    /// Sysfs thermal zone / hwmon input paths
    pub thermal_zones: Vec<String>,
    /// Label substring to match in sensor utility output
    pub sensors_match: Option<String>,
    /// Remote BMC sensor name
    pub bmc_sensor: Option<String>,
    /// Block devices for SMART temperature attributes
    pub disks: Vec<String>,
}

impl SourceSelectors {
    /// Whether any source is configured at all
    pub fn is_empty(&self) -> bool {
        self.thermal_zones.is_empty()
            && self.sensors_match.is_none()
            && self.bmc_sensor.is_none()
            && self.disks.is_empty()
    }
}

/// An independently-cooled thermal zone
#[derive(Debug, Clone)]
pub struct ThermalZone {
    /// Zone identifier (e.g. "CPU1", "HD")
    pub id: String,
    /// Actuator targets this zone commands
    pub targets: Vec<FanTarget>,
    /// Temperature-to-speed curve
    pub curve: FanCurve,
    /// Clamp applied to every computed speed
    pub limits: SpeedLimits,
    /// How multiple raw values reduce to one temperature
    pub aggregation: Aggregation,
    /// Plausibility window for raw values
    pub sanity: SanityWindow,
    /// Temperature at or above which the emergency speed overrides the curve
    pub max_safe_temp: Temperature,
    /// Speed applied under emergency conditions
    pub emergency_speed: FanSpeed,
    /// Where this zone's temperature comes from
    pub sources: SourceSelectors,
}

impl ThermalZone {
    /// Validate cross-field constraints after construction from config
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.targets.is_empty() {
            return Err(DomainError::NoTargets(self.id.clone()));
        }
        if self.sources.is_empty() {
            return Err(DomainError::InvalidValue(format!(
                "zone '{}' has no temperature sources",
                self.id
            )));
        }
        Ok(())
    }

    /// Whether this zone commands any of the given targets
    pub fn shares_target_with(&self, other: &ThermalZone) -> bool {
        self.targets.iter().any(|t| other.targets.contains(t))
    }
}
