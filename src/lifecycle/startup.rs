//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize logging and metrics from validated configuration
//! - Bind the listener
//! - Run the server until a stop signal arrives
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener binds last, once everything else is ready

use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::http::HttpServer;
use crate::lifecycle::{spawn_signal_listener, Shutdown};
use crate::observability::{logging, metrics};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to initialize logging: {0}")]
    Logging(#[from] logging::LoggingError),

    #[error("invalid {field}: {value}")]
    Address { field: &'static str, value: String },

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

fn parse_address(field: &'static str, value: &str) -> Result<SocketAddr, StartupError> {
    value.parse().map_err(|_| StartupError::Address {
        field,
        value: value.to_string(),
    })
}

/// Bring the service up and block until it has shut down.
pub async fn start(config: ServiceConfig) -> Result<(), StartupError> {
    // Held until return so buffered log lines are flushed on shutdown
    let _log_guards = logging::init_logging(&config.observability)?;

    tracing::info!(
        environment = ?config.environment,
        auth_enabled = !config.auth.api_keys.is_empty(),
        rate_limit_enabled = config.rate_limit.enabled,
        "Starting phonegen-api"
    );

    if config.observability.metrics_enabled {
        let addr = parse_address("metrics_address", &config.observability.metrics_address)?;
        metrics::init_metrics(addr);
    }

    let address = parse_address("bind_address", &config.listener.bind_address)?;
    let server = HttpServer::new(config);
    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    server.run(listener, shutdown.subscribe()).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
