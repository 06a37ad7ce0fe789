//! Resilient actuator client
//!
//! Wraps a transport with the retry policy: bounded attempts with a fixed
//! inter-attempt delay, a separate bounded budget for the empty-output
//! quirk, bounded session re-establishment, and strict serialization of
//! commands against one controller endpoint.

use crate::actuator::{ActuatorCommand, Dialect, OutputClass, RetryPolicy, Transport};
use crate::error::ActuatorError;
use std::sync::Mutex;
use std::thread;

/// Command executor with retry, timeout, and session-recovery semantics
pub struct ActuatorClient {
    transport: Box<dyn Transport>,
    dialect: Dialect,
    policy: RetryPolicy,
    /// One in-flight command per endpoint, submission order
    session: Mutex<()>,
}

impl ActuatorClient {
    /// Create a new client over the given transport
    pub fn new(transport: Box<dyn Transport>, dialect: Dialect, policy: RetryPolicy) -> Self {
        Self {
            transport,
            dialect,
            policy,
            session: Mutex::new(()),
        }
    }

    /// Execute a command through the full resilience policy
    ///
    /// Exhausting the retry budget is fatal to this command only; callers
    /// log it and move on to the next zone or cycle.
    pub fn execute(&self, command: &ActuatorCommand) -> Result<String, ActuatorError> {
        let wire = self.dialect.render(command)?;
        let _guard = self.session.lock().unwrap_or_else(|e| e.into_inner());

        let mut attempts: u32 = 0;
        let mut transport_failures: u32 = 0;
        let mut empty_retries: u32 = 0;

        loop {
            if attempts > 0 {
                thread::sleep(self.policy.delay);
            }
            attempts += 1;

            match self.transport.execute(&wire, self.policy.command_timeout) {
                Ok(output) => match self.dialect.classify(&output) {
                    OutputClass::Ok => {
                        log::debug!("actuator accepted '{}' after {} attempt(s)", command, attempts);
                        return Ok(output);
                    }
                    OutputClass::Empty => {
                        empty_retries += 1;
                        log::debug!(
                            "empty output for '{}' (retry {}/{})",
                            command,
                            empty_retries,
                            self.policy.empty_output_retries
                        );
                        if empty_retries > self.policy.empty_output_retries {
                            return Err(ActuatorError::ExhaustedRetries {
                                attempts,
                                last_error: "empty output from controller".to_string(),
                            });
                        }
                    }
                    OutputClass::SessionExpired => {
                        log::warn!("session expired while executing '{}'", command);
                        self.recover_session()?;
                        transport_failures += 1;
                        if transport_failures >= self.policy.max_attempts {
                            return Err(ActuatorError::ExhaustedRetries {
                                attempts,
                                last_error: ActuatorError::SessionExpired.to_string(),
                            });
                        }
                    }
                    OutputClass::AuthFailed => {
                        return Err(ActuatorError::AuthenticationFailed(trim_detail(&output)));
                    }
                    OutputClass::Rejected(detail) => {
                        // Retrying an explicitly rejected command won't help
                        return Err(ActuatorError::CommandRejected(detail));
                    }
                },
                Err(err) if err.is_retryable() => {
                    if matches!(err, ActuatorError::SessionExpired) {
                        self.recover_session()?;
                    } else {
                        log::debug!("transport failure for '{}': {}", command, err);
                    }
                    transport_failures += 1;
                    if transport_failures >= self.policy.max_attempts {
                        return Err(ActuatorError::ExhaustedRetries {
                            attempts,
                            last_error: err.to_string(),
                        });
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Execute a command with a single attempt (no retry budget).
    /// Used for sensor reads (failure means a skipped source) and for
    /// best-effort shutdown commands that must stay bounded.
    pub fn execute_once(&self, command: &ActuatorCommand) -> Result<String, ActuatorError> {
        let wire = self.dialect.render(command)?;
        let _guard = self.session.lock().unwrap_or_else(|e| e.into_inner());
        let output = self
            .transport
            .execute(&wire, self.policy.command_timeout)?;
        match self.dialect.classify(&output) {
            OutputClass::Ok => Ok(output),
            OutputClass::Empty => Err(ActuatorError::TransportUnavailable(
                "empty output from controller".to_string(),
            )),
            OutputClass::SessionExpired => Err(ActuatorError::SessionExpired),
            OutputClass::AuthFailed => {
                Err(ActuatorError::AuthenticationFailed(trim_detail(&output)))
            }
            OutputClass::Rejected(detail) => Err(ActuatorError::CommandRejected(detail)),
        }
    }

    /// Cheap liveness probe, used at init and by the periodic health check
    pub fn test_connection(&self) -> bool {
        let _guard = self.session.lock().unwrap_or_else(|e| e.into_inner());
        self.transport.is_session_alive()
    }

    /// Proactive session validation: probe, and on failure run the bounded
    /// recovery path. Returns whether the session is usable afterwards.
    pub fn revalidate(&self) -> bool {
        let _guard = self.session.lock().unwrap_or_else(|e| e.into_inner());
        if self.transport.is_session_alive() {
            return true;
        }
        log::warn!("actuator session at {} failed health check", self.transport.endpoint());
        self.recover_session().is_ok()
    }

    /// Bounded session re-establishment; fatal to the command when the
    /// session cannot be restored.
    fn recover_session(&self) -> Result<(), ActuatorError> {
        for attempt in 1..=self.policy.reconnect_attempts {
            match self.transport.reconnect() {
                Ok(()) => {
                    log::info!("actuator session re-established (attempt {})", attempt);
                    return Ok(());
                }
                Err(err) => {
                    log::warn!(
                        "session re-establishment {}/{} failed: {}",
                        attempt,
                        self.policy.reconnect_attempts,
                        err
                    );
                    if attempt < self.policy.reconnect_attempts {
                        thread::sleep(self.policy.delay);
                    }
                }
            }
        }
        Err(ActuatorError::TransportUnavailable(format!(
            "session re-establishment failed after {} attempts",
            self.policy.reconnect_attempts
        )))
    }

    /// The active dialect
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The active retry policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Endpoint description for logs
    pub fn endpoint(&self) -> String {
        self.transport.endpoint()
    }
}

fn trim_detail(output: &str) -> String {
    output.lines().next().unwrap_or("").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FanSpeed;
    use crate::mock::{MockResponse, MockTransport};
    use std::time::Duration;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::ZERO,
            empty_output_retries: 2,
            command_timeout: Duration::from_millis(50),
            reconnect_attempts: 2,
        }
    }

    fn set_fan() -> ActuatorCommand {
        ActuatorCommand::SetFan {
            index: 1,
            speed: FanSpeed::new(200),
        }
    }

    #[test]
    fn test_success_first_attempt() {
        let transport = MockTransport::new(vec![MockResponse::Output("ok".into())]);
        let handle = transport.handle();
        let client = ActuatorClient::new(Box::new(transport), Dialect::Ilo4Ssh, fast_policy());

        let result = client.execute(&set_fan());
        assert!(result.is_ok());
        assert_eq!(handle.executed().len(), 1);
        assert_eq!(handle.executed()[0], "fan p 1 max 200");
    }

    #[test]
    fn test_exhausted_after_exact_attempt_count() {
        let transport = MockTransport::always(MockResponse::Error(ActuatorError::Timeout(1)));
        let handle = transport.handle();
        let client = ActuatorClient::new(Box::new(transport), Dialect::Ilo4Ssh, fast_policy());

        let result = client.execute(&set_fan());
        assert!(matches!(
            result,
            Err(ActuatorError::ExhaustedRetries { attempts: 3, .. })
        ));
        // Never fewer, never more
        assert_eq!(handle.executed().len(), 3);
    }

    #[test]
    fn test_session_recovery_single_reconnect() {
        let transport = MockTransport::new(vec![
            MockResponse::Output("CLI session stopped".into()),
            MockResponse::Output("ok".into()),
        ]);
        let handle = transport.handle();
        let client = ActuatorClient::new(Box::new(transport), Dialect::Ilo4Ssh, fast_policy());

        let result = client.execute(&set_fan());
        assert!(result.is_ok());
        assert_eq!(handle.reconnects(), 1);
        assert_eq!(handle.executed().len(), 2);
    }

    #[test]
    fn test_failed_recovery_is_fatal_to_command() {
        let transport = MockTransport::new(vec![MockResponse::Output(
            "CLI session stopped".into(),
        )])
        .with_reconnect_failures(usize::MAX);
        let handle = transport.handle();
        let client = ActuatorClient::new(Box::new(transport), Dialect::Ilo4Ssh, fast_policy());

        let result = client.execute(&set_fan());
        assert!(matches!(
            result,
            Err(ActuatorError::TransportUnavailable(_))
        ));
        assert_eq!(handle.reconnects(), 2); // bounded, not forever
    }

    #[test]
    fn test_empty_output_retried_within_separate_budget() {
        let transport = MockTransport::new(vec![
            MockResponse::Output("".into()),
            MockResponse::Output("".into()),
            MockResponse::Output("ok".into()),
        ]);
        let handle = transport.handle();
        let client = ActuatorClient::new(Box::new(transport), Dialect::Ilo4Ssh, fast_policy());

        let result = client.execute(&set_fan());
        assert!(result.is_ok());
        assert_eq!(handle.executed().len(), 3);
    }

    #[test]
    fn test_empty_output_never_treated_as_success() {
        let transport = MockTransport::always(MockResponse::Output("".into()));
        let client = ActuatorClient::new(Box::new(transport), Dialect::Ilo4Ssh, fast_policy());

        let result = client.execute(&set_fan());
        assert!(matches!(result, Err(ActuatorError::ExhaustedRetries { .. })));
    }

    #[test]
    fn test_rejection_not_retried() {
        let transport = MockTransport::always(MockResponse::Output("Invalid fan number".into()));
        let handle = transport.handle();
        let client = ActuatorClient::new(Box::new(transport), Dialect::Ilo4Ssh, fast_policy());

        let result = client.execute(&set_fan());
        assert!(matches!(result, Err(ActuatorError::CommandRejected(_))));
        assert_eq!(handle.executed().len(), 1);
    }

    #[test]
    fn test_transport_auth_failure_not_retried() {
        let transport = MockTransport::always(MockResponse::Error(
            ActuatorError::AuthenticationFailed("bad password".into()),
        ));
        let handle = transport.handle();
        let client = ActuatorClient::new(Box::new(transport), Dialect::Ilo4Ssh, fast_policy());

        let result = client.execute(&set_fan());
        assert!(matches!(result, Err(ActuatorError::AuthenticationFailed(_))));
        assert_eq!(handle.executed().len(), 1);
    }

    #[test]
    fn test_unsupported_command_rejected_before_transport() {
        let transport = MockTransport::always(MockResponse::Output("ok".into()));
        let handle = transport.handle();
        let client =
            ActuatorClient::new(Box::new(transport), Dialect::SupermicroIpmi, fast_policy());

        // Individual fan addressing is an iLO concept
        let result = client.execute(&set_fan());
        assert!(matches!(result, Err(ActuatorError::CommandRejected(_))));
        assert!(handle.executed().is_empty());
    }

    #[test]
    fn test_execute_once_single_attempt() {
        let transport = MockTransport::always(MockResponse::Error(ActuatorError::Timeout(1)));
        let handle = transport.handle();
        let client = ActuatorClient::new(Box::new(transport), Dialect::SupermicroIpmi, fast_policy());

        let result = client.execute_once(&ActuatorCommand::ReadSensor {
            name: "CPU Temp".into(),
        });
        assert!(result.is_err());
        assert_eq!(handle.executed().len(), 1);
    }
}
