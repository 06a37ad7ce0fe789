//! Domain models for bmcfan
//!
//! This module contains all domain types with validation.
//! Types are validated on construction (fail-fast pattern).

pub mod fan;
pub mod thermal;
pub mod zone;

pub use fan::{FanCurve, FanCurvePoint, FanSpeed, FanTarget, SpeedLimits};
pub use thermal::{Aggregation, Reading, SanityWindow, SourceKind, Temperature, TemperatureSample};
pub use zone::{SourceSelectors, ThermalZone};
