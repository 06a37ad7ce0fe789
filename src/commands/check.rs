//! Check command implementation
//!
//! Verifies the controller connection and reports the result.

use crate::actuator::ActuatorCommand;
use crate::cli::args::{Cli, OutputFormat};
use crate::cli::output::{print_output, CheckReport};
use crate::commands::{build_client, load_config};
use crate::error::{AppError, Result};

/// Execute the check command
pub fn run_check(cli: &Cli, format: OutputFormat) -> Result<()> {
    let config = load_config(cli);
    let client = build_client(&config)?;

    // A passing check means a command actually ran, not just that the
    // session probe answered
    let reachable = client.test_connection()
        && match client.execute_once(&ActuatorCommand::FanInfo) {
            Ok(output) => {
                log::debug!("fan info:\n{}", output);
                true
            }
            Err(err) => {
                log::warn!("fan info query failed: {}", err);
                false
            }
        };
    let report = CheckReport {
        endpoint: client.endpoint(),
        dialect: client.dialect().to_string(),
        reachable,
    };
    print_output(&report, format)?;

    if reachable {
        Ok(())
    } else {
        Err(AppError::InitializationFatal(format!(
            "controller {} is not reachable",
            client.endpoint()
        )))
    }
}
