//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod apply;
pub mod check;
pub mod run;
pub mod status;

pub use apply::run_apply;
pub use check::run_check;
pub use run::run_daemon;
pub use status::run_status;

use crate::actuator::{ActuatorClient, Dialect, IpmiTransport, SshTransport, Transport};
use crate::cli::Cli;
use crate::config::{Config, ConfigBuilder};
use crate::error::Result;

use std::sync::Arc;

/// Load configuration with CLI overrides applied
pub fn load_config(cli: &Cli) -> Config {
    ConfigBuilder::new()
        .with_file(cli.config.as_deref())
        .with_host(cli.host.clone())
        .with_dry_run(if cli.dry_run { Some(true) } else { None })
        .build()
}

/// Build the actuator client for the configured controller
pub fn build_client(config: &Config) -> Result<Arc<ActuatorClient>> {
    let endpoint = config.to_endpoint()?;
    let dialect = config.connection.kind;

    let transport: Box<dyn Transport> = match dialect {
        Dialect::Ilo4Ssh => Box::new(SshTransport::new(endpoint, dialect.probe_command())),
        Dialect::SupermicroIpmi => Box::new(IpmiTransport::new(endpoint, dialect.probe_command())),
    };

    Ok(Arc::new(ActuatorClient::new(
        transport,
        dialect,
        config.control.to_retry_policy(),
    )))
}
