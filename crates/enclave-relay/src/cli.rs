//! CLI module for the inner relay, outer relay and connector.

use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use enclave_config::{
    CliOverrides, Config, LoggingConfig, TransportKind, apply_overrides, apply_process_env,
    load_or_default, validate_config,
};
use enclave_kms::KmsClient;
use enclave_transport::ChannelTransport;
use enclave_transport::tcp::TcpTransport;
#[cfg(all(target_os = "linux", feature = "vsock"))]
use enclave_transport::vsock::VsockTransport;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::bind::BindPolicy;
use crate::connector::Connector;
use crate::endpoint::{RelayEndpoint, Role};
use crate::error::RelayError;
use crate::exchange::{EncryptHandler, ForwardHandler};
use crate::forwarder::Forwarder;
use crate::framing::SingleShot;

/// CLI arguments for the inner relay (enclave side).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "enclave-inner",
    version,
    about = "Inner relay: accepts connector requests and forwards them to the outer relay"
)]
pub struct InnerArgs {
    /// Config file path (toml, json or yaml). Defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: CliOverrides,
}

/// CLI arguments for the outer relay (parent side).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "enclave-outer",
    version,
    about = "Outer relay: encrypts forwarded requests with the key-management backend"
)]
pub struct OuterArgs {
    /// Config file path (toml, json or yaml). Defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: CliOverrides,
}

/// CLI arguments for the interactive connector.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "enclave-connector",
    version,
    about = "Interactive client: sends each input line through the relay chain"
)]
pub struct ConnectArgs {
    /// Config file path (toml, json or yaml). Defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: CliOverrides,
}

/// Pick the transport named in the config and evaluate `$body` with it.
macro_rules! with_transport {
    ($config:expr, $transport:ident => $body:expr) => {
        match $config.relay.transport {
            TransportKind::Tcp => {
                let $transport = TcpTransport::from_host(&$config.relay.tcp_host)
                    .map_err(|e| RelayError::Config(e.to_string()))?;
                $body
            }
            #[cfg(all(target_os = "linux", feature = "vsock"))]
            TransportKind::Vsock => {
                let $transport = VsockTransport;
                $body
            }
            #[cfg(not(all(target_os = "linux", feature = "vsock")))]
            TransportKind::Vsock => {
                return Err(RelayError::Config(
                    "vsock transport is not available in this build, use --transport tcp".into(),
                )
                .into());
            }
        }
    };
}

/// Run the inner relay with the given CLI arguments.
pub async fn run_inner(args: InnerArgs) -> Result<(), Box<dyn Error>> {
    let config = prepare_config(args.config.as_deref(), &args.overrides)?;
    let shutdown = spawn_shutdown_listener();
    info!(
        listen = %config.inner_addr(),
        upstream = %config.outer_addr(),
        transport = ?config.relay.transport,
        "starting inner relay"
    );
    with_transport!(config, transport => Ok(serve_inner(&config, transport, shutdown).await?))
}

/// Run the outer relay with the given CLI arguments.
pub async fn run_outer(args: OuterArgs) -> Result<(), Box<dyn Error>> {
    let config = prepare_config(args.config.as_deref(), &args.overrides)?;
    let shutdown = spawn_shutdown_listener();
    info!(
        listen = %config.outer_addr(),
        kms = %config.kms.endpoint,
        key_id = %config.kms.key_id,
        transport = ?config.relay.transport,
        "starting outer relay"
    );

    let kms = KmsClient::new(
        config.kms.endpoint.clone(),
        config.kms.key_id.clone(),
        Duration::from_secs(config.kms.timeout_secs),
        Duration::from_secs(config.kms.verify_timeout_secs),
    )
    .map_err(|e| RelayError::Config(e.to_string()))?;

    if config.kms.verify_on_startup {
        match kms.verify_configuration().await {
            Ok(inventory) => info!(
                keys = inventory.keys.len(),
                aliases = inventory.aliases.len(),
                "KMS configuration checked"
            ),
            Err(e) => warn!(error = %e, "KMS configuration check failed, continuing"),
        }
    }

    with_transport!(config, transport => Ok(serve_outer(&config, transport, kms, shutdown).await?))
}

/// Run the interactive connector on stdin/stdout.
pub async fn run_connector(args: ConnectArgs) -> Result<(), Box<dyn Error>> {
    let config = prepare_config(args.config.as_deref(), &args.overrides)?;
    with_transport!(config, transport => Ok(connect_stdio(&config, transport).await?))
}

async fn serve_inner<T: ChannelTransport>(
    config: &Config,
    transport: T,
    shutdown: CancellationToken,
) -> Result<(), RelayError> {
    let framing = SingleShot::new(config.relay.buffer_size);
    let forwarder = Forwarder::with_framing(transport.clone(), framing);
    let handler = ForwardHandler::new(forwarder, config.outer_addr());
    RelayEndpoint::new(Role::Inner, transport, config.inner_addr(), handler)
        .with_backlog(config.relay.backlog)
        .with_bind_policy(BindPolicy::from_config(&config.relay))
        .with_framing(framing)
        .run(shutdown)
        .await
}

async fn serve_outer<T: ChannelTransport>(
    config: &Config,
    transport: T,
    kms: KmsClient,
    shutdown: CancellationToken,
) -> Result<(), RelayError> {
    RelayEndpoint::new(Role::Outer, transport, config.outer_addr(), EncryptHandler::new(kms))
        .with_backlog(config.relay.backlog)
        .with_bind_policy(BindPolicy::from_config(&config.relay))
        .with_framing(SingleShot::new(config.relay.buffer_size))
        .run(shutdown)
        .await
}

async fn connect_stdio<T: ChannelTransport>(config: &Config, transport: T) -> io::Result<()> {
    let forwarder = Forwarder::with_framing(transport, SingleShot::new(config.relay.buffer_size));
    Connector::new(forwarder, config.inner_addr())
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
}

/// Load the layered configuration and start logging.
///
/// Precedence is command line, then environment, then file. Logging starts
/// before the environment is read so that a rejected variable is reported.
fn prepare_config(path: Option<&Path>, overrides: &CliOverrides) -> Result<Config, Box<dyn Error>> {
    let mut config = load_or_default(path)?;
    if let Some(level) = &overrides.log_level {
        config.logging.level = Some(level.clone());
    }
    init_tracing(&config.logging);

    apply_process_env(&mut config);
    apply_overrides(&mut config, overrides);
    validate_config(&config)?;
    Ok(config)
}

fn spawn_shutdown_listener() -> CancellationToken {
    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();

    tokio::spawn(async move {
        shutdown_signal_handler().await;
        info!("shutdown signal received");
        shutdown_signal.cancel();
    });

    shutdown
}

/// Wait for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal_handler() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn init_tracing(config: &LoggingConfig) {
    // Build the env filter from base level and per-module filters
    let base_level = config.level.as_deref().unwrap_or("info");
    let mut filter_str = base_level.to_string();

    for (module, level) in &config.filters {
        filter_str.push(',');
        filter_str.push_str(module);
        filter_str.push('=');
        filter_str.push_str(level);
    }

    let filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new("info"));

    let format = config.format.as_deref().unwrap_or("pretty");
    let output = config.output.as_deref().unwrap_or("stderr");

    match (format, output) {
        ("json", "stdout") => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(io::stdout))
                .init();
        }
        ("json", _) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(io::stderr))
                .init();
        }
        ("compact", "stdout") => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(io::stdout))
                .init();
        }
        ("compact", _) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
        (_, "stdout") => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stdout))
                .init();
        }
        _ => {
            // pretty to stderr is default
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr))
                .init();
        }
    }
}
