//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Remote fan control for server management controllers
///
/// Drives iLO4 and Supermicro BMC fan speeds from local and remote
/// temperature readings via configurable fan curves.
#[derive(Parser, Debug)]
#[command(name = "bmcfan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "BMCFAN_CONFIG")]
    pub config: Option<String>,

    /// Controller host, overriding the config file
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Dry run mode - don't actually command the controller
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop
    Run(RunArgs),

    /// Read all zones once and show computed speeds without commanding
    Status,

    /// Apply one fan or zone speed through the resilience layer
    Apply(ApplyArgs),

    /// Test the controller connection
    Check,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the control loop command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Monitoring interval in seconds, overriding the config file
    #[arg(short, long)]
    pub interval: Option<u64>,
}

/// Arguments for the apply command
#[derive(Parser, Debug)]
pub struct ApplyArgs {
    /// Fan index to set
    #[arg(long, requires = "speed", conflicts_with_all = ["zone", "duty"])]
    pub fan: Option<u8>,

    /// Raw speed (0-255) for --fan
    #[arg(long)]
    pub speed: Option<u8>,

    /// Controller fan zone to set
    #[arg(long, requires = "duty")]
    pub zone: Option<u8>,

    /// Duty percentage (0-100) for --zone
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub duty: Option<u8>,
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_status() {
        let args = Cli::try_parse_from(["bmcfan", "status"]).unwrap();
        assert!(matches!(args.command, Commands::Status));
    }

    #[test]
    fn test_cli_parse_verbose() {
        let args = Cli::try_parse_from(["bmcfan", "-v", "check"]).unwrap();
        assert!(args.verbose);
    }

    #[test]
    fn test_cli_parse_run_interval() {
        let args = Cli::try_parse_from(["bmcfan", "run", "--interval", "10"]).unwrap();
        if let Commands::Run(run_args) = args.command {
            assert_eq!(run_args.interval, Some(10));
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_cli_parse_apply_fan() {
        let args =
            Cli::try_parse_from(["bmcfan", "apply", "--fan", "2", "--speed", "200"]).unwrap();
        if let Commands::Apply(apply) = args.command {
            assert_eq!(apply.fan, Some(2));
            assert_eq!(apply.speed, Some(200));
        } else {
            panic!("Expected Apply command");
        }
    }

    #[test]
    fn test_cli_apply_fan_requires_speed() {
        let result = Cli::try_parse_from(["bmcfan", "apply", "--fan", "2"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_apply_fan_conflicts_with_zone() {
        let result = Cli::try_parse_from([
            "bmcfan", "apply", "--fan", "2", "--speed", "200", "--zone", "0", "--duty", "50",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_apply_duty_validation() {
        let result = Cli::try_parse_from(["bmcfan", "apply", "--zone", "0", "--duty", "150"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_host_override() {
        let args = Cli::try_parse_from(["bmcfan", "--host", "ilo.example", "check"]).unwrap();
        assert_eq!(args.host.as_deref(), Some("ilo.example"));
    }
}
