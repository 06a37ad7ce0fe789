//! Mock implementations for testing
//!
//! Provides a scripted transport and temperature source for unit testing
//! the control stack without real hardware.

use crate::actuator::Transport;
use crate::domain::{SourceKind, Temperature};
use crate::error::{ActuatorError, SensorError};
use crate::sensors::TempSource;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted transport response
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Raw output as the controller would return it
    Output(String),
    /// Transport-level failure
    Error(ActuatorError),
}

struct TransportInner {
    script: Mutex<VecDeque<MockResponse>>,
    fallback: Option<MockResponse>,
    executed: Mutex<Vec<String>>,
    reconnects: AtomicUsize,
    reconnect_failures_left: AtomicUsize,
    alive: AtomicBool,
}

/// Scripted transport recording every executed command
pub struct MockTransport {
    inner: Arc<TransportInner>,
}

/// Observer handle onto a mock transport's recorded state
#[derive(Clone)]
pub struct MockHandle {
    inner: Arc<TransportInner>,
}

impl MockTransport {
    /// Respond with the scripted sequence, then fail
    pub fn new(script: Vec<MockResponse>) -> Self {
        Self {
            inner: Arc::new(TransportInner {
                script: Mutex::new(script.into()),
                fallback: None,
                executed: Mutex::new(Vec::new()),
                reconnects: AtomicUsize::new(0),
                reconnect_failures_left: AtomicUsize::new(0),
                alive: AtomicBool::new(true),
            }),
        }
    }

    /// Respond with the same response forever
    pub fn always(response: MockResponse) -> Self {
        Self {
            inner: Arc::new(TransportInner {
                script: Mutex::new(VecDeque::new()),
                fallback: Some(response),
                executed: Mutex::new(Vec::new()),
                reconnects: AtomicUsize::new(0),
                reconnect_failures_left: AtomicUsize::new(0),
                alive: AtomicBool::new(true),
            }),
        }
    }

    /// Builder: make the next `count` reconnect attempts fail
    pub fn with_reconnect_failures(self, count: usize) -> Self {
        self.inner
            .reconnect_failures_left
            .store(count, Ordering::SeqCst);
        self
    }

    /// Builder: mark the session as dead for liveness probes
    pub fn with_dead_session(self) -> Self {
        self.inner.alive.store(false, Ordering::SeqCst);
        self
    }

    /// Get an observer handle that outlives the transport
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl MockHandle {
    /// Wire strings executed so far, in submission order
    pub fn executed(&self) -> Vec<String> {
        self.inner.executed.lock().unwrap().clone()
    }

    /// How many reconnect attempts were made
    pub fn reconnects(&self) -> usize {
        self.inner.reconnects.load(Ordering::SeqCst)
    }

    /// Count of executed commands matching a substring
    pub fn count_matching(&self, needle: &str) -> usize {
        self.inner
            .executed
            .lock()
            .unwrap()
            .iter()
            .filter(|cmd| cmd.contains(needle))
            .count()
    }
}

impl Transport for MockTransport {
    fn execute(&self, command: &str, _timeout: Duration) -> Result<String, ActuatorError> {
        self.inner
            .executed
            .lock()
            .unwrap()
            .push(command.to_string());

        let next = {
            let mut script = self.inner.script.lock().unwrap();
            script.pop_front().or_else(|| self.inner.fallback.clone())
        };

        match next {
            Some(MockResponse::Output(output)) => Ok(output),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(ActuatorError::TransportUnavailable(
                "mock script exhausted".to_string(),
            )),
        }
    }

    fn is_session_alive(&self) -> bool {
        self.inner.alive.load(Ordering::SeqCst)
    }

    fn reconnect(&self) -> Result<(), ActuatorError> {
        self.inner.reconnects.fetch_add(1, Ordering::SeqCst);
        let left = self.inner.reconnect_failures_left.load(Ordering::SeqCst);
        if left > 0 {
            if left != usize::MAX {
                self.inner
                    .reconnect_failures_left
                    .store(left - 1, Ordering::SeqCst);
            }
            return Err(ActuatorError::TransportUnavailable(
                "mock reconnect refused".to_string(),
            ));
        }
        self.inner.alive.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn endpoint(&self) -> String {
        "mock://controller".to_string()
    }
}

/// Scripted temperature source
pub struct MockSource {
    kind: SourceKind,
    script: Mutex<VecDeque<Result<Vec<Temperature>, SensorError>>>,
    constant: Option<Vec<Temperature>>,
}

impl MockSource {
    /// Yield the scripted read results in order, then fail
    pub fn scripted(
        kind: SourceKind,
        script: Vec<Result<Vec<Temperature>, SensorError>>,
    ) -> Self {
        Self {
            kind,
            script: Mutex::new(script.into()),
            constant: None,
        }
    }

    /// Yield the same values forever
    pub fn constant(kind: SourceKind, values: Vec<Temperature>) -> Self {
        Self {
            kind,
            script: Mutex::new(VecDeque::new()),
            constant: Some(values),
        }
    }

    /// A source that always fails
    pub fn broken(kind: SourceKind) -> Self {
        Self {
            kind,
            script: Mutex::new(VecDeque::new()),
            constant: None,
        }
    }
}

impl TempSource for MockSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn read(&self) -> Result<Vec<Temperature>, SensorError> {
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return next;
        }
        match &self.constant {
            Some(values) => Ok(values.clone()),
            None => Err(SensorError::NotFound("mock script exhausted".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_transport_script_order() {
        let transport = MockTransport::new(vec![
            MockResponse::Output("first".into()),
            MockResponse::Output("second".into()),
        ]);
        assert_eq!(
            transport.execute("a", Duration::from_secs(1)).unwrap(),
            "first"
        );
        assert_eq!(
            transport.execute("b", Duration::from_secs(1)).unwrap(),
            "second"
        );
        assert!(transport.execute("c", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_mock_transport_records_commands() {
        let transport = MockTransport::always(MockResponse::Output("ok".into()));
        let handle = transport.handle();
        transport.execute("fan p 0 max 100", Duration::from_secs(1)).unwrap();
        transport.execute("fan p 1 max 100", Duration::from_secs(1)).unwrap();
        assert_eq!(handle.executed().len(), 2);
        assert_eq!(handle.count_matching("fan p 1"), 1);
    }

    #[test]
    fn test_mock_source_constant() {
        let source = MockSource::constant(SourceKind::ThermalZone, vec![Temperature::new(55)]);
        assert_eq!(source.read().unwrap(), vec![Temperature::new(55)]);
        assert_eq!(source.read().unwrap(), vec![Temperature::new(55)]);
    }

    #[test]
    fn test_mock_source_broken() {
        let source = MockSource::broken(SourceKind::SmartAttr);
        assert!(source.read().is_err());
    }
}
