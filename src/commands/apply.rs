//! Apply command implementation
//!
//! Issues a single manual speed command through the full resilience layer.

use crate::actuator::ActuatorCommand;
use crate::cli::args::{ApplyArgs, Cli, OutputFormat};
use crate::cli::output::{print_output, Message};
use crate::commands::{build_client, load_config};
use crate::domain::{FanSpeed, FanTarget};
use crate::error::{AppError, ConfigError, Result};

/// Execute the apply command
pub fn run_apply(args: &ApplyArgs, cli: &Cli, format: OutputFormat) -> Result<()> {
    let config = load_config(cli);
    let client = build_client(&config)?;

    let (target, speed) = match (args.fan, args.speed, args.zone, args.duty) {
        (Some(fan), Some(speed), _, _) => (FanTarget::Fan(fan), FanSpeed::new(speed)),
        // Zone commands take a duty percentage; scale to the raw range
        // so the dialect renders whichever unit it needs
        (_, _, Some(zone), Some(duty)) => (
            FanTarget::Zone(zone),
            FanSpeed::new(((duty as u16 * 255 + 50) / 100) as u8),
        ),
        _ => {
            return Err(AppError::Config(ConfigError::MissingField(
                "--fan N --speed S or --zone Z --duty D".to_string(),
            )))
        }
    };

    let command = ActuatorCommand::set_speed(target, speed);
    if cli.dry_run {
        let msg = Message {
            message: format!("DRY RUN: would execute '{}'", command),
            success: true,
        };
        print_output(&msg, format)?;
        return Ok(());
    }

    client.execute(&command)?;
    let msg = Message {
        message: format!("Applied {} to {}", speed, target),
        success: true,
    };
    print_output(&msg, format)?;

    Ok(())
}
