//! Retry policy for actuator command execution
//!
//! One policy object parameterizes every command path: overall attempt
//! budget, inter-attempt delay, the separate bounded budget for the
//! empty-output quirk, per-command timeout, and the bound on session
//! re-establishment attempts.

use std::time::Duration;

/// Resilience parameters for command execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per command before giving up
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
    /// Separate budget for empty/ambiguous output, distinct from
    /// transport-failure retries
    pub empty_output_retries: u32,
    /// Overall timeout wrapping each command execution
    pub command_timeout: Duration,
    /// Bounded attempts to re-establish an expired session
    pub reconnect_attempts: u32,
}

impl RetryPolicy {
    /// Worst-case wall-clock bound for one command under this policy
    pub fn worst_case(&self) -> Duration {
        let attempts = self.max_attempts + self.empty_output_retries;
        (self.command_timeout + self.delay) * attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(3),
            empty_output_retries: 2,
            command_timeout: Duration::from_secs(30),
            reconnect_attempts: 2,
        }
    }
}
