//! Round-robin HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request      ┌──────────┐    ┌────────────┐    ┌─────────────┐
//!     ───────────────────▶│  http    │───▶│ dispatcher │───▶│ round robin │
//!                         │  server  │    └─────┬──────┘    └─────────────┘
//!                         └──────────┘          │ live backend
//!                              ▲                ▼
//!     Client Response          │          ┌───────────┐          Backend
//!     ◀────────────────────────┴──────────│  backend  │◀────────▶ Server
//!                                         │  forward  │
//!                                         └───────────┘
//!                              health: static | active probe | passive
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use roundrobin_proxy::config::{self, BackendConfig, BalancerConfig, ConfigError};
use roundrobin_proxy::lifecycle::{signals, startup, Shutdown};
use roundrobin_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "roundrobin-proxy")]
#[command(about = "Forward HTTP requests to a fixed pool of backends in round-robin order", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file).
    #[arg(short, long)]
    port: Option<u16>,

    /// Backend URL; repeat to build the pool in order (replaces configured backends).
    #[arg(short, long = "backend", value_name = "URL")]
    backends: Vec<String>,

    /// Log level used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn load(&self) -> Result<BalancerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::load_config(path)?,
            None => BalancerConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if !self.backends.is_empty() {
            config.backends = self
                .backends
                .iter()
                .map(|address| BackendConfig::new(address.as_str()))
                .collect::<Vec<_>>()
                .into();
        }

        config::validate_config(&config)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        backends = config.backends.len(),
        health = ?config.health_check.mode,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    if let Err(e) = startup::run(config, &shutdown).await {
        tracing::error!(error = %e, "Fatal error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
