//! Configuration builder
//!
//! Merges configuration from files and CLI arguments.

use crate::config::{Config, ConfigFile};

/// Builder for merging configuration sources
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Load configuration from a file
    pub fn with_file(mut self, path: Option<&str>) -> Self {
        let file_config = if let Some(path) = path {
            ConfigFile::load(path).ok()
        } else {
            ConfigFile::load_default()
        };

        if let Some(cfg) = file_config {
            self.config = cfg;
        }

        self
    }

    /// Override with CLI host
    pub fn with_host(mut self, host: Option<String>) -> Self {
        if let Some(h) = host {
            self.config.connection.host = Some(h);
        }
        self
    }

    /// Override with CLI interval
    pub fn with_interval(mut self, interval: Option<u64>) -> Self {
        if let Some(i) = interval {
            self.config.control.interval_seconds = i;
        }
        self
    }

    /// Override with CLI dry-run flag
    pub fn with_dry_run(mut self, dry_run: Option<bool>) -> Self {
        if let Some(d) = dry_run {
            self.config.control.dry_run = d;
        }
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ConfigBuilder::new().build();
        assert!(!config.control.dry_run);
        assert_eq!(config.control.interval_seconds, 30);
    }

    #[test]
    fn test_builder_overrides() {
        let config = ConfigBuilder::new()
            .with_host(Some("ilo.example".to_string()))
            .with_interval(Some(10))
            .with_dry_run(Some(true))
            .build();

        assert_eq!(config.connection.host.as_deref(), Some("ilo.example"));
        assert_eq!(config.control.interval_seconds, 10);
        assert!(config.control.dry_run);
    }

    #[test]
    fn test_builder_absent_overrides_keep_file_values() {
        let config = ConfigBuilder::new()
            .with_host(None)
            .with_interval(None)
            .with_dry_run(None)
            .build();
        assert_eq!(config.connection.host, None);
        assert_eq!(config.control.interval_seconds, 30);
    }
}
