//! Actuator transports
//!
//! A transport executes one text command against the remote controller and
//! returns its raw output. Session handling below the command-string level
//! lives here; everything above (retry, classification) is the client's.

use crate::error::ActuatorError;
use crate::exec::{run_with_timeout, ExecError};
use std::time::Duration;

/// Liveness probe timeout, deliberately shorter than command timeouts
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Black-box command executor against one controller endpoint
pub trait Transport: Send + Sync {
    /// Execute a single command string, returning raw combined output
    fn execute(&self, command: &str, timeout: Duration) -> Result<String, ActuatorError>;

    /// Cheap probe: is the session/endpoint currently usable?
    fn is_session_alive(&self) -> bool;

    /// Re-establish the logical session after detected invalidation
    fn reconnect(&self) -> Result<(), ActuatorError>;

    /// Human-readable endpoint description for logs
    fn endpoint(&self) -> String;
}

/// Connection parameters shared by both transports
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
}

/// SSH transport to the iLO4 command line
///
/// Each command is one ssh invocation; the iLO side multiplexes these onto
/// its internal CLI session, which is what expires and needs recovery.
pub struct SshTransport {
    endpoint: Endpoint,
    probe_command: String,
}

impl SshTransport {
    /// Create a new SSH transport
    pub fn new(endpoint: Endpoint, probe_command: impl Into<String>) -> Self {
        Self {
            endpoint,
            probe_command: probe_command.into(),
        }
    }

    fn invoke(&self, command: &str, timeout: Duration) -> Result<String, ActuatorError> {
        let destination = format!("{}@{}", self.endpoint.username, self.endpoint.host);
        let port = self.endpoint.port.to_string();
        let connect_timeout = timeout.as_secs().clamp(1, 30).to_string();
        let connect_opt = format!("ConnectTimeout={}", connect_timeout);

        let ssh_args = [
            "-o",
            "StrictHostKeyChecking=no",
            "-o",
            connect_opt.as_str(),
            "-o",
            "KexAlgorithms=+diffie-hellman-group14-sha1",
            "-p",
            port.as_str(),
            destination.as_str(),
            command,
        ];

        // iLO4 only does password auth; route through sshpass when one is set
        let output = match &self.endpoint.password {
            Some(password) => {
                let mut args: Vec<&str> = vec!["-p", password.as_str(), "ssh"];
                args.extend_from_slice(&ssh_args);
                run_with_timeout("sshpass", &args, timeout)
            }
            None => run_with_timeout("ssh", &ssh_args, timeout),
        };

        let output = output.map_err(map_exec_error)?;

        if !output.success {
            let stderr_lower = output.stderr.to_lowercase();
            if stderr_lower.contains("permission denied") {
                return Err(ActuatorError::AuthenticationFailed(
                    first_line(&output.stderr),
                ));
            }
            // ssh exit code 255 is its own transport failure marker
            if output.code == Some(255) {
                return Err(ActuatorError::TransportUnavailable(first_line(
                    &output.stderr,
                )));
            }
        }

        Ok(merge_output(&output.stdout, &output.stderr))
    }
}

impl Transport for SshTransport {
    fn execute(&self, command: &str, timeout: Duration) -> Result<String, ActuatorError> {
        self.invoke(command, timeout)
    }

    fn is_session_alive(&self) -> bool {
        self.invoke(&self.probe_command, PROBE_TIMEOUT).is_ok()
    }

    fn reconnect(&self) -> Result<(), ActuatorError> {
        // A fresh ssh invocation opens a fresh iLO CLI session; probing it
        // confirms the session is usable again.
        self.invoke(&self.probe_command, PROBE_TIMEOUT).map(|_| ())
    }

    fn endpoint(&self) -> String {
        format!("ssh://{}:{}", self.endpoint.host, self.endpoint.port)
    }
}

/// IPMI transport via ipmitool lanplus
pub struct IpmiTransport {
    endpoint: Endpoint,
    probe_command: String,
}

impl IpmiTransport {
    /// Create a new IPMI transport
    pub fn new(endpoint: Endpoint, probe_command: impl Into<String>) -> Self {
        Self {
            endpoint,
            probe_command: probe_command.into(),
        }
    }

    fn invoke(&self, command: &str, timeout: Duration) -> Result<String, ActuatorError> {
        let port = self.endpoint.port.to_string();
        let mut args: Vec<String> = vec![
            "-I".into(),
            "lanplus".into(),
            "-H".into(),
            self.endpoint.host.clone(),
            "-p".into(),
            port,
            "-U".into(),
            self.endpoint.username.clone(),
        ];
        if let Some(password) = &self.endpoint.password {
            args.push("-P".into());
            args.push(password.clone());
        }
        args.extend(split_command(command));

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = run_with_timeout("ipmitool", &arg_refs, timeout)
            .map_err(map_exec_error)?;

        if !output.success {
            let stderr_lower = output.stderr.to_lowercase();
            if stderr_lower.contains("authentication") || stderr_lower.contains("password") {
                return Err(ActuatorError::AuthenticationFailed(
                    first_line(&output.stderr),
                ));
            }
            if stderr_lower.contains("unable to establish") {
                return Err(ActuatorError::TransportUnavailable(first_line(
                    &output.stderr,
                )));
            }
        }

        Ok(merge_output(&output.stdout, &output.stderr))
    }
}

impl Transport for IpmiTransport {
    fn execute(&self, command: &str, timeout: Duration) -> Result<String, ActuatorError> {
        self.invoke(command, timeout)
    }

    fn is_session_alive(&self) -> bool {
        self.invoke(&self.probe_command, PROBE_TIMEOUT).is_ok()
    }

    fn reconnect(&self) -> Result<(), ActuatorError> {
        self.invoke(&self.probe_command, PROBE_TIMEOUT).map(|_| ())
    }

    fn endpoint(&self) -> String {
        format!("ipmi://{}:{}", self.endpoint.host, self.endpoint.port)
    }
}

fn map_exec_error(err: ExecError) -> ActuatorError {
    match err {
        ExecError::TimedOut { timeout, .. } => ActuatorError::Timeout(timeout.as_secs()),
        ExecError::Spawn { .. } => ActuatorError::TransportUnavailable(err.to_string()),
    }
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or("").trim().to_string()
}

fn merge_output(stdout: &str, stderr: &str) -> String {
    if stderr.trim().is_empty() {
        stdout.to_string()
    } else if stdout.trim().is_empty() {
        stderr.to_string()
    } else {
        format!("{}\n{}", stdout, stderr)
    }
}

/// Split a rendered command into argv entries, honoring double quotes
/// (sensor names like "CPU Temp" arrive quoted from the dialect).
fn split_command(command: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in command.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_command_plain() {
        assert_eq!(
            split_command("raw 0x30 0x45 0x01 0x01"),
            vec!["raw", "0x30", "0x45", "0x01", "0x01"]
        );
    }

    #[test]
    fn test_split_command_quoted() {
        assert_eq!(
            split_command("sensor reading \"CPU Temp\""),
            vec!["sensor", "reading", "CPU Temp"]
        );
    }

    #[test]
    fn test_merge_output() {
        assert_eq!(merge_output("out", ""), "out");
        assert_eq!(merge_output("", "err"), "err");
        assert_eq!(merge_output("out", "err"), "out\nerr");
    }

    #[test]
    fn test_map_exec_timeout() {
        let err = ExecError::TimedOut {
            program: "ssh".into(),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(map_exec_error(err), ActuatorError::Timeout(30));
    }

    #[test]
    fn test_endpoint_display() {
        let transport = SshTransport::new(
            Endpoint {
                host: "10.0.0.5".into(),
                port: 22,
                username: "Administrator".into(),
                password: None,
            },
            "fan info",
        );
        assert_eq!(transport.endpoint(), "ssh://10.0.0.5:22");
    }
}
