//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum Router with all handlers
//! - Wire up middleware (pipeline, timeout, CORS, tracing, security headers)
//! - Bind server to listener and serve with connect info
//! - Prune expired rate-limit windows in the background
//! - Stop on the shutdown broadcast
//!
//! # Layer order (outermost first)
//! ```text
//! security headers → TraceLayer → CORS → pipeline → timeout → routes
//! ```

use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::generator::PhoneNumberGenerator;
use crate::http::handlers;
use crate::pipeline::{orchestrate, Pipeline, X_REQUEST_ID};
use crate::security::{with_security_headers, Clock, CounterStore, MemoryCounterStore, SystemClock};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub generator: PhoneNumberGenerator,
}

/// HTTP server for the phone number API.
pub struct HttpServer {
    router: Router,
    config: Arc<ServiceConfig>,
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_parts(
            config,
            PhoneNumberGenerator::default(),
            Arc::new(MemoryCounterStore::new()),
            Arc::new(SystemClock),
        )
    }

    /// Create a server with injected generator, counter store and clock.
    pub fn with_parts(
        config: ServiceConfig,
        generator: PhoneNumberGenerator,
        store: Arc<dyn CounterStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let config = Arc::new(config);
        let pipeline = Pipeline::from_config(&config, store.clone(), clock.clone());
        tracing::debug!(stages = ?pipeline.stage_names(), "Pipeline assembled");

        let state = AppState { generator };
        let router = Self::build_router(&config, pipeline, state);

        Self {
            router,
            config,
            store,
            clock,
        }
    }

    /// Build the axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, pipeline: Pipeline, state: AppState) -> Router {
        let router = Router::new()
            .route("/health", get(handlers::health))
            .route("/api/phone", get(handlers::phone))
            .route("/api/phone/bulk", get(handlers::bulk))
            .route("/api/formats", get(handlers::formats))
            .route("/api/area-codes", get(handlers::area_codes))
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(from_fn_with_state(pipeline, orchestrate))
            .layer(cors_layer(config))
            .layer(TraceLayer::new_for_http());

        with_security_headers(router)
    }

    /// The fully layered router, for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Run the server until the shutdown broadcast fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = ?self.config.environment,
            "HTTP server starting"
        );

        let pruner = if self.config.rate_limit.enabled {
            let interval = Duration::from_secs(self.config.rate_limit.prune_interval_secs);
            Some(tokio::spawn(prune_windows(
                self.store.clone(),
                self.clock.clone(),
                interval,
                shutdown.resubscribe(),
            )))
        } else {
            None
        };

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        if let Some(pruner) = pruner {
            pruner.abort();
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn cors_layer(config: &ServiceConfig) -> CorsLayer {
    let origin = match config.cors.allowed_origin.as_str() {
        "*" => AllowOrigin::any(),
        origin => match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!(origin, "Invalid CORS origin, allowing any");
                AllowOrigin::any()
            }
        },
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            HeaderName::from_bytes(config.auth.header.as_bytes())
                .unwrap_or(HeaderName::from_static("x-api-key")),
        ])
        .expose_headers([X_REQUEST_ID])
}

/// Periodically drop expired rate-limit windows.
async fn prune_windows(
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = store.prune(clock.now());
                if removed > 0 {
                    tracing::debug!(removed, "Pruned expired rate-limit windows");
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}
