//! bmcfan - remote fan control for server management controllers
//!
//! A command-line tool that drives iLO4 and Supermicro BMC fan speeds
//! from temperature readings via configurable fan curves.

use bmcfan::cli::args::{generate_completions, Cli, Commands};
use bmcfan::commands::{run_apply, run_check, run_daemon, run_status};
use bmcfan::error::{ActuatorError, AppError};
use clap::Parser;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Set log level based on verbose flag
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    // Run the appropriate command
    let result = run(&cli);

    if let Err(e) = result {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    match &cli.command {
        Commands::Run(args) => run_daemon(args, cli),

        Commands::Status => run_status(cli, cli.format),

        Commands::Apply(args) => run_apply(args, cli, cli.format),

        Commands::Check => run_check(cli, cli.format),

        Commands::Completions { shell } => {
            generate_completions(*shell);
            Ok(())
        }
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::Actuator(ActuatorError::AuthenticationFailed(_)) => {
            eprintln!();
            eprintln!("Hint: Check connection.username and connection.password");
            eprintln!("      in the configuration file.");
        }
        AppError::Actuator(ActuatorError::TransportUnavailable(_)) => {
            eprintln!();
            eprintln!("Hint: Make sure the controller is reachable and the");
            eprintln!("      required client tool (ssh/sshpass or ipmitool)");
            eprintln!("      is installed.");
        }
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Hint: See the default config locations with --help,");
            eprintln!("      or pass an explicit path with --config.");
        }
        _ => {}
    }
}
