//! Run command implementation
//!
//! Starts the control loop against the configured controller.

use crate::cli::args::{Cli, RunArgs};
use crate::commands::build_client;
use crate::config::ConfigBuilder;
use crate::control::{CancelToken, Controller, SafetyOverride};
use crate::error::{AppError, Result};
use crate::sensors::TemperatureReader;

/// Execute the run command
pub fn run_daemon(args: &RunArgs, cli: &Cli) -> Result<()> {
    let config = ConfigBuilder::new()
        .with_file(cli.config.as_deref())
        .with_host(cli.host.clone())
        .with_interval(args.interval)
        .with_dry_run(if cli.dry_run { Some(true) } else { None })
        .build();
    config.validate()?;

    let zones = config.to_zones()?;
    let client = build_client(&config)?;
    log::debug!(
        "worst-case command latency under retry policy: {:?}",
        client.policy().worst_case()
    );
    let reader = TemperatureReader::from_zones(&zones, Some(client.clone()));
    let safety = SafetyOverride::new(
        config.control.max_consecutive_errors,
        config.control.stale_after(),
    );

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        log::info!("Interrupt received, shutting down");
        handler_token.cancel();
    })
    .map_err(|e| AppError::InitializationFatal(format!("failed to install signal handler: {}", e)))?;

    let mut controller = Controller::new(
        zones,
        reader,
        client,
        safety,
        config.to_controller_config(),
        cancel,
    );
    controller.run()
}
