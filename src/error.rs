//! Unified error types for bmcfan
//!
//! This module defines all error types used throughout the application.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from actuator operations
    #[error("Actuator error: {0}")]
    Actuator(#[from] ActuatorError),

    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from domain type validation
    #[error("Domain validation error: {0}")]
    Domain(#[from] DomainError),

    /// Error from temperature sensing
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    /// Controller could not reach or authenticate to the actuator at startup
    #[error("Initialization failed: {0}")]
    InitializationFatal(String),

    /// Zone referenced by name was not found in configuration
    #[error("Thermal zone not found: {0}")]
    ZoneNotFound(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from actuator command execution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActuatorError {
    /// Cannot reach the controller endpoint
    #[error("Actuator transport unavailable: {0}")]
    TransportUnavailable(String),

    /// Controller refused our credentials
    #[error("Actuator authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Controller returned an explicit error for the command
    #[error("Actuator rejected command: {0}")]
    CommandRejected(String),

    /// Command did not complete within its timeout
    #[error("Actuator command timed out after {0} seconds")]
    Timeout(u64),

    /// Remote session has expired and must be re-established
    #[error("Actuator session expired")]
    SessionExpired,

    /// Retry budget consumed without a successful execution
    #[error("Actuator retries exhausted after {attempts} attempts: {last_error}")]
    ExhaustedRetries { attempts: u32, last_error: String },
}

impl ActuatorError {
    /// Whether another attempt of the same command could plausibly succeed.
    ///
    /// Explicit rejections and credential failures are final; retrying
    /// them is unlikely to help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ActuatorError::TransportUnavailable(_)
                | ActuatorError::Timeout(_)
                | ActuatorError::SessionExpired
        )
    }
}

/// Errors from temperature sources
#[derive(Error, Debug)]
pub enum SensorError {
    /// Sensor file or device missing
    #[error("Sensor not found: {0}")]
    NotFound(String),

    /// Sensor utility produced output we could not parse
    #[error("Unparseable sensor output from {origin}: {detail}")]
    Unparseable { origin: String, detail: String },

    /// Sensor utility invocation failed
    #[error("Sensor command failed: {0}")]
    CommandFailed(String),

    /// IO error while reading a sensor
    #[error("Sensor IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from domain type validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Speed limits where min exceeds max
    #[error("Invalid speed limits: min {min} > max {max}")]
    InvalidSpeedLimits { min: u8, max: u8 },

    /// Fan curve must have at least one breakpoint
    #[error("Fan curve must have at least one breakpoint")]
    EmptyFanCurve,

    /// Two breakpoints share the same temperature threshold
    #[error("Duplicate fan curve threshold: {0}°C")]
    DuplicateThreshold(i32),

    /// Invalid fan curve (malformed breakpoint, bad format, etc.)
    #[error("Invalid fan curve: {0}")]
    InvalidFanCurve(String),

    /// Zone has no fan or zone targets to command
    #[error("Thermal zone '{0}' has no actuator targets")]
    NoTargets(String),

    /// Invalid value provided
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required config field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// Configuration declares no thermal zones
    #[error("Configuration declares no thermal zones")]
    NoZones,

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actuator_error_display() {
        let err = ActuatorError::Timeout(30);
        assert_eq!(
            err.to_string(),
            "Actuator command timed out after 30 seconds"
        );
    }

    #[test]
    fn test_exhausted_retries_display() {
        let err = ActuatorError::ExhaustedRetries {
            attempts: 3,
            last_error: "connection reset".to_string(),
        };
        assert!(err.to_string().contains("3 attempts"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ActuatorError::Timeout(5).is_retryable());
        assert!(ActuatorError::SessionExpired.is_retryable());
        assert!(ActuatorError::TransportUnavailable("no route".into()).is_retryable());
        assert!(!ActuatorError::CommandRejected("bad fan index".into()).is_retryable());
        assert!(!ActuatorError::AuthenticationFailed("bad password".into()).is_retryable());
    }

    #[test]
    fn test_unparseable_display_names_origin() {
        let err = SensorError::Unparseable {
            origin: "smartctl /dev/sda".to_string(),
            detail: "no temperature attribute found".to_string(),
        };
        assert!(err.to_string().contains("smartctl /dev/sda"));
        // variant carries no underlying error
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_domain_error_display() {
        let err = DomainError::DuplicateThreshold(70);
        assert_eq!(err.to_string(), "Duplicate fan curve threshold: 70°C");
    }

    #[test]
    fn test_error_conversion() {
        let domain_err = DomainError::EmptyFanCurve;
        let app_err: AppError = domain_err.into();
        assert!(matches!(app_err, AppError::Domain(_)));
    }
}
