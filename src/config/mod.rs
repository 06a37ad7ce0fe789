//! Configuration system
//!
//! Handles TOML config file parsing, validation, and CLI argument merging.

pub mod builder;
pub mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::actuator::{Dialect, Endpoint, RetryPolicy};
use crate::control::ControllerConfig;
use crate::domain::{
    Aggregation, FanCurve, FanCurvePoint, FanSpeed, FanTarget, SanityWindow, SourceSelectors,
    SpeedLimits, Temperature, ThermalZone,
};
use crate::error::{ConfigError, DomainError};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Controller connection settings
    pub connection: ConnectionConfig,
    /// Control loop settings
    pub control: ControlConfig,
    /// Thermal zones, one `[[zone]]` table each
    #[serde(rename = "zone")]
    pub zones: Vec<ZoneConfig>,
    /// Controller firmware sensor ids to disable at startup
    pub disable_sensors: Vec<u8>,
}

/// Controller connection configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Command dialect the controller speaks
    pub kind: Dialect,
    /// Controller hostname or address
    pub host: Option<String>,
    /// Port; defaults to 22 for SSH, 623 for IPMI
    pub port: Option<u16>,
    /// Login user
    pub username: Option<String>,
    /// Password, passed through to the underlying tool
    pub password: Option<String>,
}

impl ConnectionConfig {
    /// Default port for the configured dialect
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(match self.kind {
            Dialect::Ilo4Ssh => 22,
            Dialect::SupermicroIpmi => 623,
        })
    }

    /// Convert to a transport endpoint
    pub fn to_endpoint(&self) -> Result<Endpoint, ConfigError> {
        let host = self
            .host
            .clone()
            .ok_or_else(|| ConfigError::MissingField("connection.host".to_string()))?;
        let username = self
            .username
            .clone()
            .ok_or_else(|| ConfigError::MissingField("connection.username".to_string()))?;
        Ok(Endpoint {
            host,
            port: self.effective_port(),
            username,
            password: self.password.clone(),
        })
    }
}

/// Control loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Seconds between monitoring cycles
    pub interval_seconds: u64,
    /// Per-command execution timeout in seconds
    pub command_timeout_seconds: u64,
    /// Attempts per command before giving up
    pub retry_attempts: u32,
    /// Fixed delay between attempts in seconds
    pub retry_delay_seconds: u64,
    /// Separate retry budget for the empty-output quirk
    pub empty_output_retries: u32,
    /// Bounded session re-establishment attempts
    pub reconnect_attempts: u32,
    /// Session health check every this many cycles
    pub health_check_cycles: u64,
    /// Unavailable readings tolerated before forced emergency speed
    pub max_consecutive_errors: u32,
    /// Seconds a last-known-good temperature stays usable
    pub stale_after_seconds: u64,
    /// Raw speed applied to every zone at shutdown
    pub shutdown_speed: u8,
    /// Bounded wait for the controller to become reachable at startup
    pub startup_wait_seconds: u64,
    /// Log decisions without commanding
    pub dry_run: bool,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 30,
            command_timeout_seconds: 30,
            retry_attempts: 3,
            retry_delay_seconds: 3,
            empty_output_retries: 2,
            reconnect_attempts: 2,
            health_check_cycles: 10,
            max_consecutive_errors: 3,
            stale_after_seconds: 120,
            shutdown_speed: 255,
            startup_wait_seconds: 60,
            dry_run: false,
        }
    }
}

impl ControlConfig {
    /// Convert to the actuator retry policy
    pub fn to_retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts,
            delay: Duration::from_secs(self.retry_delay_seconds),
            empty_output_retries: self.empty_output_retries,
            command_timeout: Duration::from_secs(self.command_timeout_seconds),
            reconnect_attempts: self.reconnect_attempts,
        }
    }

    /// Staleness window for last-known-good temperatures
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_seconds)
    }
}

/// What a zone cools, used for sanity window and safety defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    /// Processors, VRMs, anything on the board
    #[default]
    Cpu,
    /// Rotational or solid-state storage
    Disk,
}

impl ZoneKind {
    fn sanity_window(&self) -> SanityWindow {
        match self {
            ZoneKind::Cpu => SanityWindow::cpu(),
            ZoneKind::Disk => SanityWindow::disk(),
        }
    }

    fn default_max_safe_temp(&self) -> i32 {
        match self {
            ZoneKind::Cpu => 90,
            ZoneKind::Disk => 60,
        }
    }
}

/// One `[[zone]]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Zone name, unique within the config
    pub id: String,
    /// Individual fan indices this zone drives
    pub fans: Vec<u8>,
    /// Controller fan-zone ids this zone drives
    pub zones: Vec<u8>,
    /// Zone kind, selects sanity window and safety defaults
    pub kind: ZoneKind,
    /// How multiple readings collapse into one value
    pub aggregation: Aggregation,
    /// Floor applied to every computed speed
    pub min_speed: u8,
    /// Ceiling applied to every computed speed
    pub max_speed: u8,
    /// Curve fallback speed below the lowest threshold
    pub default_speed: u8,
    /// Emergency threshold in Celsius; kind default when unset
    pub max_safe_temp: Option<i32>,
    /// Speed forced during an emergency
    pub emergency_speed: u8,
    /// Curve breakpoints; the built-in curve when empty
    pub curve: Vec<CurvePointConfig>,
    /// Local sysfs thermal zone / hwmon temperature files
    pub thermal_zones: Vec<String>,
    /// Substring match against local sensor utility labels
    pub sensors_match: Option<String>,
    /// Remote controller sensor name
    pub bmc_sensor: Option<String>,
    /// Block devices probed for SMART temperature
    pub disks: Vec<String>,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            fans: Vec::new(),
            zones: Vec::new(),
            kind: ZoneKind::Cpu,
            aggregation: Aggregation::Maximum,
            min_speed: 0,
            max_speed: 255,
            default_speed: 50,
            max_safe_temp: None,
            emergency_speed: 255,
            curve: Vec::new(),
            thermal_zones: Vec::new(),
            sensors_match: None,
            bmc_sensor: None,
            disks: Vec::new(),
        }
    }
}

/// One curve breakpoint in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurvePointConfig {
    /// Temperature threshold in Celsius
    pub temp: i32,
    /// Raw speed at and above this threshold
    pub speed: u8,
}

impl ZoneConfig {
    /// Convert to a FanCurve domain object
    pub fn to_fan_curve(&self) -> Result<FanCurve, DomainError> {
        if self.curve.is_empty() {
            return Ok(FanCurve::default_curve());
        }
        let points = self
            .curve
            .iter()
            .map(|p| FanCurvePoint::new(Temperature::new(p.temp), FanSpeed::new(p.speed)))
            .collect();
        FanCurve::new(points, FanSpeed::new(self.default_speed))
    }

    /// Convert to a validated thermal zone
    pub fn to_zone(&self) -> Result<ThermalZone, DomainError> {
        let mut targets: Vec<FanTarget> =
            self.fans.iter().copied().map(FanTarget::Fan).collect();
        targets.extend(self.zones.iter().copied().map(FanTarget::Zone));

        let zone = ThermalZone {
            id: self.id.clone(),
            targets,
            curve: self.to_fan_curve()?,
            limits: SpeedLimits::new(FanSpeed::new(self.min_speed), FanSpeed::new(self.max_speed))?,
            aggregation: self.aggregation,
            sanity: self.kind.sanity_window(),
            max_safe_temp: Temperature::new(
                self.max_safe_temp
                    .unwrap_or_else(|| self.kind.default_max_safe_temp()),
            ),
            emergency_speed: FanSpeed::new(self.emergency_speed),
            sources: SourceSelectors {
                thermal_zones: self.thermal_zones.clone(),
                sensors_match: self.sensors_match.clone(),
                bmc_sensor: self.bmc_sensor.clone(),
                disks: self.disks.clone(),
            },
        };
        zone.validate()?;
        Ok(zone)
    }
}

impl Config {
    /// Validate structure before any hardware is touched
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.to_endpoint()?;
        if self.zones.is_empty() {
            return Err(ConfigError::NoZones);
        }
        for (i, zone) in self.zones.iter().enumerate() {
            if zone.id.is_empty() {
                return Err(ConfigError::MissingField(format!("zone[{}].id", i)));
            }
            if self.zones[..i].iter().any(|z| z.id == zone.id) {
                return Err(ConfigError::InvalidValue {
                    key: format!("zone[{}].id", i),
                    message: format!("duplicate zone id '{}'", zone.id),
                });
            }
            // Target kinds the dialect cannot express would fail on every
            // cycle; reject them before the loop starts
            match self.connection.kind {
                Dialect::Ilo4Ssh if !zone.zones.is_empty() => {
                    return Err(ConfigError::InvalidValue {
                        key: format!("zone[{}].zones", i),
                        message: "ilo4-ssh drives individual fans; use fans = [..]".to_string(),
                    });
                }
                Dialect::SupermicroIpmi if !zone.fans.is_empty() => {
                    return Err(ConfigError::InvalidValue {
                        key: format!("zone[{}].fans", i),
                        message: "supermicro-ipmi drives fan zones; use zones = [..]".to_string(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Convert to the transport endpoint
    pub fn to_endpoint(&self) -> Result<Endpoint, ConfigError> {
        self.connection.to_endpoint()
    }

    /// Convert every `[[zone]]` to a validated domain zone
    pub fn to_zones(&self) -> Result<Vec<ThermalZone>, DomainError> {
        self.zones.iter().map(|z| z.to_zone()).collect()
    }

    /// Convert to the controller's loop settings
    pub fn to_controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            interval: Duration::from_secs(self.control.interval_seconds),
            health_check_cycles: self.control.health_check_cycles.max(1),
            startup_wait: Duration::from_secs(self.control.startup_wait_seconds),
            shutdown_speed: FanSpeed::new(self.control.shutdown_speed),
            dry_run: self.control.dry_run,
            disable_sensors: self.disable_sensors.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_toml() -> &'static str {
        r#"
            [connection]
            kind = "ilo4-ssh"
            host = "ilo.example"
            username = "Administrator"
            password = "secret"

            [[zone]]
            id = "CPU"
            fans = [0, 1]
            sensors_match = "Package id"
            curve = [
                { temp = 80, speed = 200 },
                { temp = 60, speed = 100 },
            ]
        "#
    }

    #[test]
    fn test_minimal_config_parses_and_validates() {
        let config: Config = toml::from_str(minimal_toml()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.connection.kind, Dialect::Ilo4Ssh);
        assert_eq!(config.connection.effective_port(), 22);
        assert_eq!(config.control.interval_seconds, 30);

        let zones = config.to_zones().unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(
            zones[0].targets,
            vec![FanTarget::Fan(0), FanTarget::Fan(1)]
        );
        assert_eq!(
            zones[0].curve.evaluate(Temperature::new(65)),
            FanSpeed::new(100)
        );
    }

    #[test]
    fn test_ipmi_default_port() {
        let config = ConnectionConfig {
            kind: Dialect::SupermicroIpmi,
            ..Default::default()
        };
        assert_eq!(config.effective_port(), 623);
    }

    #[test]
    fn test_missing_host_rejected() {
        let toml = r#"
            [connection]
            username = "admin"

            [[zone]]
            id = "CPU"
            fans = [0]
            thermal_zones = ["/sys/class/thermal/thermal_zone0/temp"]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField(field)) if field == "connection.host"
        ));
    }

    #[test]
    fn test_no_zones_rejected() {
        let toml = r#"
            [connection]
            host = "ilo.example"
            username = "admin"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::NoZones)));
    }

    #[test]
    fn test_duplicate_zone_id_rejected() {
        let toml = r#"
            [connection]
            host = "ilo.example"
            username = "admin"

            [[zone]]
            id = "CPU"
            fans = [0]
            thermal_zones = ["a"]

            [[zone]]
            id = "CPU"
            fans = [1]
            thermal_zones = ["b"]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_dialect_target_mismatch_rejected() {
        let toml = r#"
            [connection]
            kind = "supermicro-ipmi"
            host = "bmc.example"
            username = "ADMIN"

            [[zone]]
            id = "CPU"
            fans = [0]
            thermal_zones = ["a"]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key.contains("fans")
        ));
    }

    #[test]
    fn test_zone_without_targets_rejected() {
        let zone = ZoneConfig {
            id: "CPU".to_string(),
            thermal_zones: vec!["a".to_string()],
            ..Default::default()
        };
        assert!(zone.to_zone().is_err());
    }

    #[test]
    fn test_zone_without_sources_rejected() {
        let zone = ZoneConfig {
            id: "CPU".to_string(),
            fans: vec![0],
            ..Default::default()
        };
        assert!(zone.to_zone().is_err());
    }

    #[test]
    fn test_empty_curve_falls_back_to_builtin() {
        let zone = ZoneConfig {
            id: "CPU".to_string(),
            fans: vec![0],
            sensors_match: Some("Package".to_string()),
            ..Default::default()
        };
        let zone = zone.to_zone().unwrap();
        assert_eq!(
            zone.curve.evaluate(Temperature::new(95)),
            FanSpeed::new(255)
        );
    }

    #[test]
    fn test_disk_zone_defaults() {
        let zone = ZoneConfig {
            id: "HD".to_string(),
            zones: vec![0],
            kind: ZoneKind::Disk,
            disks: vec!["/dev/sda".to_string()],
            ..Default::default()
        };
        let zone = zone.to_zone().unwrap();
        assert_eq!(zone.max_safe_temp, Temperature::new(60));
        assert!(zone.sanity.contains(Temperature::new(45)));
        assert!(!zone.sanity.contains(Temperature::new(120)));
    }

    #[test]
    fn test_retry_policy_conversion() {
        let control = ControlConfig {
            retry_attempts: 5,
            retry_delay_seconds: 1,
            ..Default::default()
        };
        let policy = control.to_retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay, Duration::from_secs(1));
        assert_eq!(policy.reconnect_attempts, 2);
    }
}
