//! Safety override
//!
//! Emergency-speed logic cutting across the control loop: over-temperature
//! override, last-known-good fallback for sensing gaps, and escalation
//! after a streak of unavailable readings.

use crate::control::ZoneState;
use crate::domain::{FanSpeed, Reading, Temperature, ThermalZone};
use std::time::Duration;

/// Why a cycle went to emergency speed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmergencyReason {
    /// Temperature at or above the zone's maximum safe temperature
    OverTemperature(Temperature),
    /// Sensing unavailable with no usable last-known-good value
    SensingLost,
    /// Unavailable-reading streak reached the configured threshold
    FailureStreak(u32),
}

/// The safety layer's decision for one zone in one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyDecision {
    /// Speed to command this cycle
    pub effective_speed: FanSpeed,
    /// Set when the emergency speed overrode the curve result
    pub emergency: Option<EmergencyReason>,
    /// Temperature the decision was based on (reading or last-known-good)
    pub effective_temp: Option<Temperature>,
}

impl SafetyDecision {
    /// Whether this cycle is an emergency event
    pub fn is_emergency(&self) -> bool {
        self.emergency.is_some()
    }
}

/// Emergency-speed and fallback policy
#[derive(Debug, Clone, Copy)]
pub struct SafetyOverride {
    /// Unavailable readings tolerated before forced emergency
    max_consecutive_errors: u32,
    /// How long a last-known-good value stays usable
    stale_after: Duration,
}

impl SafetyOverride {
    /// Create the policy
    pub fn new(max_consecutive_errors: u32, stale_after: Duration) -> Self {
        Self {
            max_consecutive_errors,
            stale_after,
        }
    }

    /// Decide the effective speed for a zone this cycle
    ///
    /// The caller has already updated `state`'s reading streak for this
    /// cycle's outcome. Emergency conditions override whatever the curve
    /// computed; otherwise the curve result on the effective temperature
    /// (reading, or fresh last-known-good) applies, clamped to the zone's
    /// limits.
    pub fn apply(&self, state: &ZoneState, reading: Reading, zone: &ThermalZone) -> SafetyDecision {
        match reading {
            Reading::Valid(temp) => {
                if temp >= zone.max_safe_temp {
                    return SafetyDecision {
                        effective_speed: zone.emergency_speed,
                        emergency: Some(EmergencyReason::OverTemperature(temp)),
                        effective_temp: Some(temp),
                    };
                }
                SafetyDecision {
                    effective_speed: zone.curve.evaluate(temp).clamp_to(zone.limits),
                    emergency: None,
                    effective_temp: Some(temp),
                }
            }
            Reading::Unavailable => {
                let streak = state.consecutive_read_failures();
                if streak >= self.max_consecutive_errors {
                    return SafetyDecision {
                        effective_speed: zone.emergency_speed,
                        emergency: Some(EmergencyReason::FailureStreak(streak)),
                        effective_temp: None,
                    };
                }
                match state.fresh_last_known_good(self.stale_after) {
                    Some(temp) => SafetyDecision {
                        effective_speed: zone.curve.evaluate(temp).clamp_to(zone.limits),
                        emergency: None,
                        effective_temp: Some(temp),
                    },
                    // Never silently under-cool: no usable value means we
                    // behave as if at the maximum safe temperature
                    None => SafetyDecision {
                        effective_speed: zone.emergency_speed,
                        emergency: Some(EmergencyReason::SensingLost),
                        effective_temp: None,
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Aggregation, FanCurve, FanCurvePoint, FanTarget, SanityWindow, SourceSelectors,
        SpeedLimits,
    };

    fn test_zone() -> ThermalZone {
        let curve = FanCurve::new(
            vec![
                FanCurvePoint::new(Temperature::new(80), FanSpeed::new(200)),
                FanCurvePoint::new(Temperature::new(60), FanSpeed::new(100)),
            ],
            FanSpeed::new(50),
        )
        .unwrap();
        ThermalZone {
            id: "CPU1".to_string(),
            targets: vec![FanTarget::Fan(0)],
            curve,
            limits: SpeedLimits::default(),
            aggregation: Aggregation::Maximum,
            sanity: SanityWindow::cpu(),
            max_safe_temp: Temperature::new(90),
            emergency_speed: FanSpeed::new(255),
            sources: SourceSelectors {
                thermal_zones: vec!["unused".into()],
                ..Default::default()
            },
        }
    }

    fn policy() -> SafetyOverride {
        SafetyOverride::new(3, Duration::from_secs(120))
    }

    #[test]
    fn test_normal_reading_follows_curve() {
        let state = ZoneState::new();
        let decision = policy().apply(&state, Reading::Valid(Temperature::new(65)), &test_zone());
        assert_eq!(decision.effective_speed, FanSpeed::new(100));
        assert!(!decision.is_emergency());
    }

    #[test]
    fn test_over_temperature_overrides_curve() {
        let state = ZoneState::new();
        let decision = policy().apply(&state, Reading::Valid(Temperature::new(92)), &test_zone());
        assert_eq!(decision.effective_speed, FanSpeed::new(255));
        assert_eq!(
            decision.emergency,
            Some(EmergencyReason::OverTemperature(Temperature::new(92)))
        );
    }

    #[test]
    fn test_exactly_at_max_safe_is_emergency() {
        let state = ZoneState::new();
        let decision = policy().apply(&state, Reading::Valid(Temperature::new(90)), &test_zone());
        assert!(decision.is_emergency());
    }

    #[test]
    fn test_unavailable_uses_fresh_last_known_good() {
        let mut state = ZoneState::new();
        state.record_good_reading(Temperature::new(82));
        state.record_unavailable();

        let decision = policy().apply(&state, Reading::Unavailable, &test_zone());
        assert!(!decision.is_emergency());
        assert_eq!(decision.effective_speed, FanSpeed::new(200));
        assert_eq!(decision.effective_temp, Some(Temperature::new(82)));
    }

    #[test]
    fn test_unavailable_without_history_escalates() {
        let mut state = ZoneState::new();
        state.record_unavailable();

        let decision = policy().apply(&state, Reading::Unavailable, &test_zone());
        assert_eq!(decision.emergency, Some(EmergencyReason::SensingLost));
        assert_eq!(decision.effective_speed, FanSpeed::new(255));
    }

    #[test]
    fn test_failure_streak_forces_emergency_despite_fresh_lkg() {
        let mut state = ZoneState::new();
        state.record_good_reading(Temperature::new(55));
        for _ in 0..3 {
            state.record_unavailable();
        }

        let decision = policy().apply(&state, Reading::Unavailable, &test_zone());
        assert_eq!(decision.emergency, Some(EmergencyReason::FailureStreak(3)));
    }

    #[test]
    fn test_streak_below_threshold_does_not_escalate() {
        let mut state = ZoneState::new();
        state.record_good_reading(Temperature::new(55));
        state.record_unavailable();
        state.record_unavailable();

        let decision = policy().apply(&state, Reading::Unavailable, &test_zone());
        assert!(!decision.is_emergency());
    }

    #[test]
    fn test_curve_result_clamped_to_limits() {
        let mut zone = test_zone();
        zone.limits = SpeedLimits::new(FanSpeed::new(120), FanSpeed::new(180)).unwrap();

        let state = ZoneState::new();
        // Curve says 50 at 20°C; the zone floor wins
        let decision = policy().apply(&state, Reading::Valid(Temperature::new(20)), &zone);
        assert_eq!(decision.effective_speed, FanSpeed::new(120));
    }
}
