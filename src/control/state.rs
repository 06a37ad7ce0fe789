//! Control loop state
//!
//! Per-zone cross-cycle state, the loop's state machine labels, and the
//! cancellation token the host process uses to request shutdown.

use crate::domain::{FanSpeed, Temperature};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Control loop lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Verifying reachability, disabling sensors, applying baselines
    Initializing,
    /// Baseline speeds being applied
    Baseline,
    /// Normal periodic control
    Monitoring,
    /// At least one zone under emergency override this cycle
    EmergencyOverride,
    /// Terminal: applying safe speeds before exit
    ShuttingDown,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopState::Initializing => write!(f, "initializing"),
            LoopState::Baseline => write!(f, "baseline"),
            LoopState::Monitoring => write!(f, "monitoring"),
            LoopState::EmergencyOverride => write!(f, "emergency-override"),
            LoopState::ShuttingDown => write!(f, "shutting-down"),
        }
    }
}

/// Cross-cycle state for one zone
///
/// Owned and mutated exclusively by the controller driving the zone.
/// Never persisted; a restart begins from safe defaults.
#[derive(Debug, Default)]
pub struct ZoneState {
    last_known_good: Option<Temperature>,
    last_good_at: Option<Instant>,
    last_commanded: Option<FanSpeed>,
    consecutive_read_failures: u32,
    consecutive_command_failures: u32,
    cycles: u64,
}

impl ZoneState {
    /// Fresh state with safe defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a plausible reading, resetting the failure streak
    pub fn record_good_reading(&mut self, temp: Temperature) {
        self.last_known_good = Some(temp);
        self.last_good_at = Some(Instant::now());
        self.consecutive_read_failures = 0;
    }

    /// Record an unavailable reading
    pub fn record_unavailable(&mut self) {
        self.consecutive_read_failures += 1;
    }

    /// Record a successfully commanded speed
    pub fn record_command(&mut self, speed: FanSpeed) {
        self.last_commanded = Some(speed);
        self.consecutive_command_failures = 0;
    }

    /// Record a failed command; the last commanded speed stays as-is so
    /// the next cycle re-issues rather than dedups the lost command
    pub fn record_command_failure(&mut self) {
        self.consecutive_command_failures += 1;
    }

    /// Bump the per-zone cycle counter
    pub fn tick(&mut self) {
        self.cycles += 1;
    }

    /// Reset the read-failure streak (after a successful emergency
    /// application for a sensing outage)
    pub fn reset_read_failures(&mut self) {
        self.consecutive_read_failures = 0;
    }

    /// The last known good value, if still within the staleness window
    pub fn fresh_last_known_good(&self, stale_after: Duration) -> Option<Temperature> {
        let at = self.last_good_at?;
        if at.elapsed() <= stale_after {
            self.last_known_good
        } else {
            None
        }
    }

    /// Last speed successfully commanded, if any
    pub fn last_commanded(&self) -> Option<FanSpeed> {
        self.last_commanded
    }

    /// Current unavailable-reading streak
    pub fn consecutive_read_failures(&self) -> u32 {
        self.consecutive_read_failures
    }

    /// Current command-failure streak
    pub fn consecutive_command_failures(&self) -> u32 {
        self.consecutive_command_failures
    }

    /// Cycles this zone has been through
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

/// Cancellation token checked each tick (and inside sleeps)
///
/// The host process cancels it from a signal handler; the loop then
/// transitions to shutdown within one bounded operation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether shutdown was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_state_defaults() {
        let state = ZoneState::new();
        assert_eq!(state.last_commanded(), None);
        assert_eq!(state.consecutive_read_failures(), 0);
        assert_eq!(state.fresh_last_known_good(Duration::from_secs(60)), None);
    }

    #[test]
    fn test_good_reading_resets_streak() {
        let mut state = ZoneState::new();
        state.record_unavailable();
        state.record_unavailable();
        assert_eq!(state.consecutive_read_failures(), 2);

        state.record_good_reading(Temperature::new(55));
        assert_eq!(state.consecutive_read_failures(), 0);
        assert_eq!(
            state.fresh_last_known_good(Duration::from_secs(60)),
            Some(Temperature::new(55))
        );
    }

    #[test]
    fn test_stale_last_known_good() {
        let mut state = ZoneState::new();
        state.record_good_reading(Temperature::new(55));
        // Zero staleness window: anything already recorded counts as stale
        // once any time at all has passed; poll until it does.
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(state.fresh_last_known_good(Duration::ZERO), None);
    }

    #[test]
    fn test_command_failure_keeps_last_commanded() {
        let mut state = ZoneState::new();
        state.record_command(FanSpeed::new(100));
        state.record_command_failure();
        assert_eq!(state.last_commanded(), Some(FanSpeed::new(100)));
        assert_eq!(state.consecutive_command_failures(), 1);
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
