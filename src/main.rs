//! Unified enclave-rs CLI.
//!
//! This binary provides a unified interface to all relay components:
//! - `enclave-rs inner` - Run the inner relay (inside the enclave)
//! - `enclave-rs outer` - Run the outer relay (on the parent host)
//! - `enclave-rs connect` - Run the interactive connector
//! - `enclave-rs validate-config` - Check a configuration file
//!
//! Each relay role can also be run as a standalone binary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use enclave_config::{CliOverrides, apply_overrides, apply_process_env, load_or_default, validate_config};

/// enclave-rs unified CLI.
#[derive(Parser)]
#[command(
    name = "enclave-rs",
    version,
    about = "Relay chain between an enclave and a key-management backend",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the inner relay.
    #[command(name = "inner")]
    Inner(Box<enclave_relay::InnerArgs>),

    /// Run the outer relay.
    #[command(name = "outer")]
    Outer(Box<enclave_relay::OuterArgs>),

    /// Run the interactive connector.
    #[command(name = "connect", alias = "connector")]
    Connect(Box<enclave_relay::ConnectArgs>),

    /// Load, layer and validate a configuration, then print it.
    #[command(name = "validate-config")]
    ValidateConfig(ValidateArgs),
}

#[derive(Args)]
struct ValidateArgs {
    /// Config file path (toml, json or yaml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: CliOverrides,
}

fn validate(args: ValidateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_or_default(args.config.as_deref())?;
    apply_process_env(&mut config);
    apply_overrides(&mut config, &args.overrides);
    validate_config(&config)?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Inner(args) => enclave_relay::cli::run_inner(*args).await,
        Commands::Outer(args) => enclave_relay::cli::run_outer(*args).await,
        Commands::Connect(args) => enclave_relay::cli::run_connector(*args).await,
        Commands::ValidateConfig(args) => validate(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
