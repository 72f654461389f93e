//! Connector standalone binary.

use clap::Parser;
use enclave_relay::{ConnectArgs, cli};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ConnectArgs::parse();
    cli::run_connector(args).await
}
