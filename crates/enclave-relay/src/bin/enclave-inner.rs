//! Inner relay standalone binary.

use clap::Parser;
use enclave_relay::{InnerArgs, cli};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = InnerArgs::parse();
    cli::run_inner(args).await
}
