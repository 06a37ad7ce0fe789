//! Thermal domain types
//!
//! Temperature values, the "unavailable" sentinel, per-cycle samples,
//! and the aggregation/sanity policies applied by the reader.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Temperature in degrees Celsius
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Temperature(i32);

impl Temperature {
    /// Create a new Temperature
    pub const fn new(celsius: i32) -> Self {
        Self(celsius)
    }

    /// Get the temperature in Celsius
    #[inline]
    pub const fn as_celsius(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°C", self.0)
    }
}

impl From<i32> for Temperature {
    fn from(value: i32) -> Self {
        Self::new(value)
    }
}

impl From<Temperature> for i32 {
    fn from(temp: Temperature) -> Self {
        temp.0
    }
}

/// A temperature reading, or the explicit "unavailable" sentinel
///
/// The reader never fabricates a value; total sensing failure is reported
/// as `Unavailable` and handled by the safety layer, not as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    /// A plausible value from some source
    Valid(Temperature),
    /// No source yielded a plausible value this cycle
    Unavailable,
}

impl Reading {
    /// Whether a value is present
    pub fn is_available(&self) -> bool {
        matches!(self, Reading::Valid(_))
    }

    /// The value, if present
    pub fn value(&self) -> Option<Temperature> {
        match self {
            Reading::Valid(t) => Some(*t),
            Reading::Unavailable => None,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Valid(t) => write!(f, "{}", t),
            Reading::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Identifies which source family produced a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Local sysfs thermal zone / hwmon file
    ThermalZone,
    /// Local sensor utility subprocess output
    SensorsCli,
    /// Remote BMC sensor query over the actuator session
    BmcSensor,
    /// Disk SMART attribute
    SmartAttr,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::ThermalZone => write!(f, "thermal-zone"),
            SourceKind::SensorsCli => write!(f, "sensors-cli"),
            SourceKind::BmcSensor => write!(f, "bmc-sensor"),
            SourceKind::SmartAttr => write!(f, "smart-attr"),
        }
    }
}

/// One reading for one zone in one poll cycle
///
/// Produced each cycle, never mutated, discarded after the cycle that
/// consumes it; only the zone state's last-known-good value survives.
#[derive(Debug, Clone)]
pub struct TemperatureSample {
    /// Zone identifier the sample belongs to
    pub zone: String,
    /// The reading or the unavailable sentinel
    pub reading: Reading,
    /// Which source family produced the value (None when unavailable)
    pub source: Option<SourceKind>,
    /// When the sample was taken
    pub taken_at: Instant,
}

impl TemperatureSample {
    /// Create a sample for a successful read
    pub fn valid(zone: impl Into<String>, temp: Temperature, source: SourceKind) -> Self {
        Self {
            zone: zone.into(),
            reading: Reading::Valid(temp),
            source: Some(source),
            taken_at: Instant::now(),
        }
    }

    /// Create the unavailable sentinel sample
    pub fn unavailable(zone: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            reading: Reading::Unavailable,
            source: None,
            taken_at: Instant::now(),
        }
    }
}

/// How multiple raw values for one zone reduce to a single temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Coolest raw value
    Minimum,
    /// Arithmetic mean with integer truncation
    Mean,
    /// Hottest raw value
    #[default]
    Maximum,
}

impl Aggregation {
    /// Reduce raw values to one temperature; None when the slice is empty
    pub fn reduce(&self, values: &[Temperature]) -> Option<Temperature> {
        if values.is_empty() {
            return None;
        }
        let reduced = match self {
            Aggregation::Minimum => values.iter().min().copied()?,
            Aggregation::Maximum => values.iter().max().copied()?,
            Aggregation::Mean => {
                let sum: i64 = values.iter().map(|t| t.as_celsius() as i64).sum();
                Temperature::new((sum / values.len() as i64) as i32)
            }
        };
        Some(reduced)
    }
}

/// Plausibility window a raw value must fall inside to be accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanityWindow {
    /// Lowest plausible value
    pub low: Temperature,
    /// Highest plausible value
    pub high: Temperature,
}

impl SanityWindow {
    /// Create a new window
    pub const fn new(low: Temperature, high: Temperature) -> Self {
        Self { low, high }
    }

    /// Default window for CPU-type zones
    pub const fn cpu() -> Self {
        Self::new(Temperature::new(0), Temperature::new(150))
    }

    /// Default window for disk-type zones
    pub const fn disk() -> Self {
        Self::new(Temperature::new(0), Temperature::new(100))
    }

    /// Whether the value is plausible
    pub fn contains(&self, temp: Temperature) -> bool {
        temp >= self.low && temp <= self.high
    }
}
