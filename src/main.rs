//! phonegen-api server.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ security headers ─▶ trace ─▶ CORS ─▶ pipeline ─▶ timeout ─▶ handler
//!                                                          │                        │
//!                                                          │ identify               │ validate
//!                                                          │ authenticate           │ generate
//!                                                          │ rate limit             │
//!     Client Response                                      ▼                        ▼
//!     ◀────────────── envelope + X-Request-Id + RateLimit-* ◀──────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use phonegen_api::config::load_config;
use phonegen_api::lifecycle::start;

#[derive(Parser)]
#[command(name = "phonegen-api")]
#[command(about = "Phone number generator API server", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match start(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal startup error");
            eprintln!("Fatal: {e}");
            ExitCode::FAILURE
        }
    }
}
