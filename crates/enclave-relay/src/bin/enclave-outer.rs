//! Outer relay standalone binary.

use clap::Parser;
use enclave_relay::{OuterArgs, cli};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = OuterArgs::parse();
    cli::run_outer(args).await
}
