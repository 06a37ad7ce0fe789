//! Fan-related domain types
//!
//! Provides validated types for fan speeds, actuator targets, and fan curves.

use crate::domain::Temperature;
use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw fan speed as the management controller understands it (0-255 PWM)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FanSpeed(u8);

impl FanSpeed {
    /// Minimum speed (fan stopped or firmware floor)
    pub const MIN: FanSpeed = FanSpeed(0);
    /// Maximum speed
    pub const MAX: FanSpeed = FanSpeed(255);

    /// Create a new FanSpeed from a raw PWM value
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Get the raw PWM value (0-255)
    #[inline]
    pub const fn as_raw(&self) -> u8 {
        self.0
    }

    /// Get the speed as an approximate percentage of full scale
    pub fn as_percent(&self) -> u8 {
        ((self.0 as u16 * 100 + 127) / 255) as u8
    }

    /// Clamp this speed into `[min, max]`
    pub fn clamp_to(self, limits: SpeedLimits) -> Self {
        Self(self.0.clamp(limits.min.0, limits.max.0))
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/255", self.0)
    }
}

impl From<u8> for FanSpeed {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<FanSpeed> for u8 {
    fn from(speed: FanSpeed) -> Self {
        speed.0
    }
}

/// Per-zone bounds applied to every commanded speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedLimits {
    /// Lowest speed the zone may be commanded to
    pub min: FanSpeed,
    /// Highest speed the zone may be commanded to
    pub max: FanSpeed,
}

impl SpeedLimits {
    /// Create validated speed limits
    ///
    /// # Errors
    /// Returns `DomainError::InvalidSpeedLimits` if min > max
    pub fn new(min: FanSpeed, max: FanSpeed) -> Result<Self, DomainError> {
        if min > max {
            return Err(DomainError::InvalidSpeedLimits {
                min: min.as_raw(),
                max: max.as_raw(),
            });
        }
        Ok(Self { min, max })
    }

    /// Full-range limits
    pub const fn unbounded() -> Self {
        Self {
            min: FanSpeed::MIN,
            max: FanSpeed::MAX,
        }
    }
}

impl Default for SpeedLimits {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// What a zone's commands are addressed to on the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanTarget {
    /// An individual fan index (iLO "fan p N")
    Fan(u8),
    /// A controller fan zone (IPMI duty-cycle zone)
    Zone(u8),
}

impl fmt::Display for FanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FanTarget::Fan(n) => write!(f, "fan {}", n),
            FanTarget::Zone(z) => write!(f, "zone {}", z),
        }
    }
}

/// A single breakpoint on a fan curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanCurvePoint {
    /// Temperature threshold in Celsius
    pub threshold: Temperature,
    /// Target fan speed at or above this threshold
    pub speed: FanSpeed,
}

impl FanCurvePoint {
    /// Create a new fan curve breakpoint
    pub fn new(threshold: Temperature, speed: FanSpeed) -> Self {
        Self { threshold, speed }
    }
}

/// A fan curve mapping temperature to fan speed
///
/// Breakpoints are held sorted by descending threshold; evaluation walks the
/// list and the first breakpoint whose threshold is at or below the current
/// temperature wins. Below every breakpoint the default speed applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanCurve {
    /// Breakpoints sorted by descending threshold
    points: Vec<FanCurvePoint>,
    /// Speed applied when the temperature is below every breakpoint
    default_speed: FanSpeed,
}

impl FanCurve {
    /// Create a new fan curve from breakpoints
    ///
    /// Breakpoints are sorted by descending threshold. Duplicate thresholds
    /// and empty curves are rejected.
    ///
    /// # Errors
    /// Returns `DomainError::EmptyFanCurve` or `DomainError::DuplicateThreshold`
    pub fn new(
        mut points: Vec<FanCurvePoint>,
        default_speed: FanSpeed,
    ) -> Result<Self, DomainError> {
        if points.is_empty() {
            return Err(DomainError::EmptyFanCurve);
        }

        points.sort_by(|a, b| b.threshold.cmp(&a.threshold));

        for pair in points.windows(2) {
            if pair[0].threshold == pair[1].threshold {
                return Err(DomainError::DuplicateThreshold(
                    pair[0].threshold.as_celsius(),
                ));
            }
        }

        Ok(Self {
            points,
            default_speed,
        })
    }

    /// Get the target fan speed for a given temperature
    ///
    /// First breakpoint (descending) whose threshold <= temp wins; if the
    /// temperature is below every breakpoint, the default speed applies.
    pub fn evaluate(&self, temp: Temperature) -> FanSpeed {
        for point in &self.points {
            if temp >= point.threshold {
                return point.speed;
            }
        }
        self.default_speed
    }

    /// Add a breakpoint, keeping descending order
    ///
    /// # Errors
    /// Returns `DomainError::DuplicateThreshold` if the threshold already exists
    pub fn add_point(&mut self, point: FanCurvePoint) -> Result<(), DomainError> {
        if self.points.iter().any(|p| p.threshold == point.threshold) {
            return Err(DomainError::DuplicateThreshold(point.threshold.as_celsius()));
        }
        let pos = self
            .points
            .iter()
            .position(|p| p.threshold < point.threshold)
            .unwrap_or(self.points.len());
        self.points.insert(pos, point);
        Ok(())
    }

    /// Remove the breakpoint at the given threshold; returns whether one existed
    pub fn remove_point(&mut self, threshold: Temperature) -> bool {
        let before = self.points.len();
        self.points.retain(|p| p.threshold != threshold);
        self.points.len() != before
    }

    /// Replace the speed of an existing breakpoint; returns whether it existed
    pub fn set_speed(&mut self, threshold: Temperature, speed: FanSpeed) -> bool {
        for point in &mut self.points {
            if point.threshold == threshold {
                point.speed = speed;
                return true;
            }
        }
        false
    }

    /// Get the breakpoints (descending threshold order)
    pub fn points(&self) -> &[FanCurvePoint] {
        &self.points
    }

    /// Get the default speed
    pub fn default_speed(&self) -> FanSpeed {
        self.default_speed
    }

    /// Placeholder curve used when configuration omits one (50-90°C, PWM)
    pub fn default_curve() -> Self {
        Self {
            points: vec![
                FanCurvePoint::new(Temperature::new(90), FanSpeed::new(255)),
                FanCurvePoint::new(Temperature::new(80), FanSpeed::new(200)),
                FanCurvePoint::new(Temperature::new(70), FanSpeed::new(150)),
                FanCurvePoint::new(Temperature::new(60), FanSpeed::new(100)),
                FanCurvePoint::new(Temperature::new(50), FanSpeed::new(75)),
            ],
            default_speed: FanSpeed::new(50),
        }
    }
}

impl Default for FanCurve {
    fn default() -> Self {
        Self::default_curve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(c: i32) -> Temperature {
        Temperature::new(c)
    }

    fn sample_curve() -> FanCurve {
        FanCurve::new(
            vec![
                FanCurvePoint::new(t(50), FanSpeed::new(75)),
                FanCurvePoint::new(t(90), FanSpeed::new(255)),
                FanCurvePoint::new(t(70), FanSpeed::new(150)),
                FanCurvePoint::new(t(80), FanSpeed::new(200)),
                FanCurvePoint::new(t(60), FanSpeed::new(100)),
            ],
            FanSpeed::new(50),
        )
        .unwrap()
    }

    #[test]
    fn test_fan_speed_percent() {
        assert_eq!(FanSpeed::new(0).as_percent(), 0);
        assert_eq!(FanSpeed::new(255).as_percent(), 100);
        assert_eq!(FanSpeed::new(128).as_percent(), 50);
    }

    #[test]
    fn test_fan_speed_display() {
        assert_eq!(FanSpeed::new(200).to_string(), "200/255");
    }

    #[test]
    fn test_speed_limits_invalid() {
        let result = SpeedLimits::new(FanSpeed::new(100), FanSpeed::new(50));
        assert!(matches!(
            result,
            Err(DomainError::InvalidSpeedLimits { min: 100, max: 50 })
        ));
    }

    #[test]
    fn test_speed_clamping() {
        let limits = SpeedLimits::new(FanSpeed::new(40), FanSpeed::new(200)).unwrap();
        assert_eq!(FanSpeed::new(10).clamp_to(limits).as_raw(), 40);
        assert_eq!(FanSpeed::new(255).clamp_to(limits).as_raw(), 200);
        assert_eq!(FanSpeed::new(120).clamp_to(limits).as_raw(), 120);
    }

    #[test]
    fn test_fan_curve_empty() {
        let result = FanCurve::new(vec![], FanSpeed::new(50));
        assert!(matches!(result, Err(DomainError::EmptyFanCurve)));
    }

    #[test]
    fn test_fan_curve_duplicate_threshold() {
        let result = FanCurve::new(
            vec![
                FanCurvePoint::new(t(70), FanSpeed::new(150)),
                FanCurvePoint::new(t(70), FanSpeed::new(180)),
            ],
            FanSpeed::new(50),
        );
        assert!(matches!(result, Err(DomainError::DuplicateThreshold(70))));
    }

    #[test]
    fn test_fan_curve_sorts_descending() {
        let curve = sample_curve();
        let thresholds: Vec<_> = curve
            .points()
            .iter()
            .map(|p| p.threshold.as_celsius())
            .collect();
        assert_eq!(thresholds, vec![90, 80, 70, 60, 50]);
    }

    #[test]
    fn test_fan_curve_evaluation() {
        let curve = sample_curve();
        assert_eq!(curve.evaluate(t(95)).as_raw(), 255);
        assert_eq!(curve.evaluate(t(90)).as_raw(), 255);
        assert_eq!(curve.evaluate(t(80)).as_raw(), 200);
        assert_eq!(curve.evaluate(t(65)).as_raw(), 100);
        assert_eq!(curve.evaluate(t(10)).as_raw(), 50);
    }

    #[test]
    fn test_fan_curve_below_all_points() {
        let curve = sample_curve();
        assert_eq!(curve.evaluate(t(49)).as_raw(), 50);
        assert_eq!(curve.evaluate(t(-5)).as_raw(), 50);
    }

    #[test]
    fn test_add_point_preserves_neighbors() {
        let mut curve = FanCurve::new(
            vec![
                FanCurvePoint::new(t(90), FanSpeed::new(255)),
                FanCurvePoint::new(t(80), FanSpeed::new(200)),
                FanCurvePoint::new(t(70), FanSpeed::new(150)),
            ],
            FanSpeed::new(50),
        )
        .unwrap();

        curve
            .add_point(FanCurvePoint::new(t(75), FanSpeed::new(180)))
            .unwrap();

        assert_eq!(curve.evaluate(t(77)).as_raw(), 180);
        assert_eq!(curve.evaluate(t(85)).as_raw(), 200);
        let thresholds: Vec<_> = curve
            .points()
            .iter()
            .map(|p| p.threshold.as_celsius())
            .collect();
        assert_eq!(thresholds, vec![90, 80, 75, 70]);
    }

    #[test]
    fn test_add_point_rejects_duplicate() {
        let mut curve = sample_curve();
        let result = curve.add_point(FanCurvePoint::new(t(80), FanSpeed::new(111)));
        assert!(matches!(result, Err(DomainError::DuplicateThreshold(80))));
    }

    #[test]
    fn test_remove_point() {
        let mut curve = sample_curve();
        assert!(curve.remove_point(t(80)));
        assert!(!curve.remove_point(t(80)));
        // 85°C now falls through to the 70°C breakpoint
        assert_eq!(curve.evaluate(t(85)).as_raw(), 150);
    }

    #[test]
    fn test_set_speed() {
        let mut curve = sample_curve();
        assert!(curve.set_speed(t(70), FanSpeed::new(160)));
        assert!(!curve.set_speed(t(71), FanSpeed::new(160)));
        assert_eq!(curve.evaluate(t(72)).as_raw(), 160);
    }
}
