//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Pick output format from configuration
//! - Mirror events to an optional log file
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - The log file always receives JSON lines
//! - Console and file writes go through `tracing-appender` worker threads,
//!   so request tasks never wait on log I/O
//! - Log level configurable via config, `RUST_LOG` wins when set

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::{Layer, Layered, SubscriberExt};
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::{LogFormat, ObservabilityConfig};

type Filtered = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Filtered> + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to install subscriber: {0}")]
    Install(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Flushes buffered log lines when dropped. Hold it for the life of the process.
#[must_use = "dropping the guards stops log delivery"]
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

impl std::fmt::Debug for LogGuards {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogGuards")
            .field("writers", &self._guards.len())
            .finish()
    }
}

/// Default filter directive for a configured level.
pub fn default_directive(level: &str) -> String {
    format!("phonegen_api={level},tower_http={level}")
}

fn open_log_file(path: &Path) -> Result<fs::File, LoggingError> {
    let file_error = |source| LoggingError::File {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(file_error)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(file_error)
}

/// Build the subscriber without installing it.
pub fn build_subscriber(
    config: &ObservabilityConfig,
) -> Result<(Box<dyn Subscriber + Send + Sync>, LogGuards), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(&config.log_level).into());

    let mut guards = Vec::new();
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let (stdout, guard) = tracing_appender::non_blocking(io::stdout());
    guards.push(guard);
    layers.push(match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(stdout)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().with_writer(stdout).boxed(),
    });

    if let Some(path) = &config.log_file {
        let (file, guard) = tracing_appender::non_blocking(open_log_file(Path::new(path))?);
        guards.push(guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_ansi(false)
                .with_writer(file)
                .boxed(),
        );
    }

    let subscriber = tracing_subscriber::registry().with(filter).with(layers);
    Ok((Box::new(subscriber), LogGuards { _guards: guards }))
}

/// Install the global subscriber. Returns an error if one is already set.
pub fn init_logging(config: &ObservabilityConfig) -> Result<LogGuards, LoggingError> {
    let (subscriber, guards) = build_subscriber(config)?;
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(guards)
}
