//! Pipeline orchestration and error translation.
//!
//! # Responsibilities
//! - Run the fixed stage list for every inbound request
//! - Hand admitted requests to the router with their context attached
//! - Translate every failure (stage, handler, panic, framework rejection)
//!   into the uniform error envelope
//! - Emit exactly one response log line per request
//!
//! # Design Decisions
//! - Identification is always first and can never be skipped
//! - Gate stages are skipped for exempt paths
//! - Handler panics are caught here; nothing reaches the transport

use axum::extract::{ConnectInfo, FromRequestParts, Request, State};
use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::TimeDelta;
use futures_util::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::config::validation::MAX_WINDOW_MS;
use crate::config::ServiceConfig;
use crate::observability::metrics;
use crate::pipeline::auth::AuthStage;
use crate::pipeline::context::RequestContext;
use crate::pipeline::error::{ApiError, ErrorEnvelope};
use crate::pipeline::identify::IdentifyStage;
use crate::pipeline::rate_limit::RateLimitStage;
use crate::pipeline::stage::{Outcome, Stage};
use crate::security::{Clock, CounterStore, SystemClock};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
pub const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
pub const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

const DEFAULT_CREDENTIAL_HEADER: &str = "x-api-key";

struct Inner {
    stages: Vec<Box<dyn Stage>>,
    exempt_paths: HashSet<String>,
    credential_header: HeaderName,
    expose_internal_errors: bool,
    clock: Arc<dyn Clock>,
}

/// The ordered admission chain plus error translation. Cheap to clone.
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .field("exempt_paths", &self.inner.exempt_paths)
            .field("expose_internal_errors", &self.inner.expose_internal_errors)
            .finish()
    }
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Assemble the standard chain: identify, authenticate, rate limit.
    pub fn from_config(
        config: &ServiceConfig,
        store: Arc<dyn CounterStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut builder = Pipeline::builder()
            .credential_header(&config.auth.header)
            .exempt_paths(config.admission.exempt_paths.iter().cloned())
            .expose_internal_errors(!config.environment.is_production())
            .clock(clock.clone())
            .stage(AuthStage::new(config.auth.api_keys.iter().cloned()));

        if config.rate_limit.enabled {
            let window_ms = config.rate_limit.window_ms.min(MAX_WINDOW_MS) as i64;
            builder = builder.stage(RateLimitStage::new(
                store,
                clock,
                TimeDelta::milliseconds(window_ms),
                config.rate_limit.max_requests,
            ));
        }

        builder.build()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.inner.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn credential_header(&self) -> &HeaderName {
        &self.inner.credential_header
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.inner.exempt_paths.contains(path)
    }

    /// Run every applicable stage in order, stopping at the first failure.
    pub fn admit(&self, ctx: &mut RequestContext) -> Outcome {
        let exempt = self.is_exempt(&ctx.path);
        for stage in &self.inner.stages {
            if exempt && stage.is_gate() {
                continue;
            }
            if let Err(err) = stage.attempt(ctx) {
                tracing::debug!(request_id = %ctx.id, stage = stage.name(), "Admission stopped");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Log a failure and render its envelope.
    pub fn render_error(&self, ctx: &RequestContext, err: &ApiError) -> Response {
        let status = err.status();
        match err {
            ApiError::NotFound => {
                tracing::warn!(
                    request_id = %ctx.id,
                    method = %ctx.method,
                    path = %ctx.path,
                    error = %err,
                    "Route not found"
                );
            }
            _ if status.is_server_error() => {
                tracing::error!(
                    request_id = %ctx.id,
                    method = %ctx.method,
                    path = %ctx.path,
                    error = %err,
                    "Error occurred"
                );
            }
            _ => {
                tracing::warn!(
                    request_id = %ctx.id,
                    method = %ctx.method,
                    path = %ctx.path,
                    error = %err,
                    "Request rejected"
                );
            }
        }

        let envelope = err.envelope(&ctx.id, self.inner.expose_internal_errors);
        (status, Json(envelope)).into_response()
    }

    /// Ensure a handler's response is enveloped if it is a failure.
    fn normalize(&self, ctx: &RequestContext, response: Response) -> Response {
        if let Some(err) = response.extensions().get::<ApiError>().cloned() {
            return self.render_error(ctx, &err);
        }

        let status = response.status();
        if !(status.is_client_error() || status.is_server_error()) || is_json(&response) {
            return response;
        }

        // Framework-produced failures (method mismatch, timeouts) carry no
        // ApiError; wrap them while keeping their headers.
        let message = status.canonical_reason().unwrap_or("Request failed");
        if status.is_server_error() {
            tracing::error!(request_id = %ctx.id, method = %ctx.method, path = %ctx.path, error = message, "Error occurred");
        } else {
            tracing::warn!(request_id = %ctx.id, method = %ctx.method, path = %ctx.path, error = message, "Request rejected");
        }

        let envelope = ErrorEnvelope {
            error: message.to_string(),
            request_id: ctx.id.clone(),
            details: None,
        };
        let (mut parts, _) = response.into_parts();
        parts.headers.remove(axum::http::header::CONTENT_LENGTH);
        let rendered = Json(envelope).into_response();
        parts.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Response::from_parts(parts, rendered.into_body())
    }

    /// Attach correlation and quota headers.
    fn decorate(&self, ctx: &RequestContext, mut response: Response) -> Response {
        let headers = response.headers_mut();
        if let Ok(id) = HeaderValue::from_str(&ctx.id) {
            headers.insert(X_REQUEST_ID, id);
        }
        if let Some(quota) = ctx.rate_limit {
            let reset_after = quota.reset_after(self.inner.clock.now());
            headers.insert(RATELIMIT_LIMIT, HeaderValue::from(quota.limit));
            headers.insert(RATELIMIT_REMAINING, HeaderValue::from(quota.remaining));
            headers.insert(RATELIMIT_RESET, HeaderValue::from(reset_after));
            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                response.headers_mut().insert(RETRY_AFTER, HeaderValue::from(reset_after));
            }
        }
        response
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("handler panicked: {message}")
    } else {
        "handler panicked".to_string()
    }
}

/// axum middleware entry point. Install with
/// `axum::middleware::from_fn_with_state(pipeline, orchestrate)`.
pub async fn orchestrate(State(pipeline): State<Pipeline>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let client = <ConnectInfo<SocketAddr> as FromRequestParts<()>>::from_request_parts(&mut parts, &())
        .await
        .ok()
        .map(|ConnectInfo(addr)| addr);
    let mut ctx = RequestContext::new(&parts, client, pipeline.credential_header());

    let response = match pipeline.admit(&mut ctx) {
        Ok(()) => {
            parts.extensions.insert(ctx.clone());
            let request = Request::from_parts(parts, body);
            match AssertUnwindSafe(next.run(request)).catch_unwind().await {
                Ok(response) => pipeline.normalize(&ctx, response),
                Err(panic) => {
                    pipeline.render_error(&ctx, &ApiError::Internal(panic_message(&*panic)))
                }
            }
        }
        Err(err) => pipeline.render_error(&ctx, &err),
    };
    let response = pipeline.decorate(&ctx, response);

    let elapsed = ctx.elapsed();
    tracing::info!(
        request_id = %ctx.id,
        status_code = response.status().as_u16(),
        response_time_ms = elapsed.as_millis() as u64,
        "Outgoing response"
    );
    metrics::record_request(ctx.method.as_str(), response.status().as_u16(), elapsed);

    response
}

/// Builder for [`Pipeline`]. Identification is prepended automatically.
pub struct PipelineBuilder {
    stages: Vec<Box<dyn Stage>>,
    exempt_paths: HashSet<String>,
    credential_header: HeaderName,
    expose_internal_errors: bool,
    clock: Arc<dyn Clock>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            stages: vec![Box::new(IdentifyStage)],
            exempt_paths: HashSet::new(),
            credential_header: HeaderName::from_static(DEFAULT_CREDENTIAL_HEADER),
            expose_internal_errors: false,
            clock: Arc::new(SystemClock),
        }
    }

    /// Append a stage after those already added.
    pub fn stage(mut self, stage: impl Stage) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn exempt_paths<I: IntoIterator<Item = String>>(mut self, paths: I) -> Self {
        self.exempt_paths.extend(paths);
        self
    }

    /// Header carrying the client credential. Invalid names keep the default.
    pub fn credential_header(mut self, name: &str) -> Self {
        match HeaderName::from_bytes(name.as_bytes()) {
            Ok(header) => self.credential_header = header,
            Err(_) => tracing::warn!(header = name, "Invalid credential header name, keeping default"),
        }
        self
    }

    pub fn expose_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            inner: Arc::new(Inner {
                stages: self.stages,
                exempt_paths: self.exempt_paths,
                credential_header: self.credential_header,
                expose_internal_errors: self.expose_internal_errors,
                clock: self.clock,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{MemoryCounterStore, MockClock};
    use axum::body::{to_bytes, Body};
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::Request as HttpRequest;
    use axum::routing::get;
    use axum::{Extension, Router};
    use chrono::Utc;
    use serde_json::Value;
    use tower::ServiceExt;

    fn config(keys: &[&str], max_requests: u64) -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.auth.api_keys = keys.iter().map(|k| k.to_string()).collect();
        config.rate_limit.max_requests = max_requests;
        config
    }

    fn pipeline(config: &ServiceConfig) -> Pipeline {
        Pipeline::from_config(
            config,
            Arc::new(MemoryCounterStore::new()),
            Arc::new(MockClock::new(Utc::now())),
        )
    }

    async fn echo_id(Extension(ctx): Extension<RequestContext>) -> String {
        ctx.id
    }

    async fn explode() -> &'static str {
        panic!("kaboom")
    }

    async fn fail() -> Result<&'static str, ApiError> {
        Err(ApiError::Internal("disk on fire".into()))
    }

    fn app(pipeline: Pipeline) -> Router {
        Router::new()
            .route("/health", get(echo_id))
            .route("/echo", get(echo_id))
            .route("/explode", get(explode))
            .route("/fail", get(fail))
            .fallback(|| async { ApiError::NotFound })
            .layer(axum::middleware::from_fn_with_state(pipeline, orchestrate))
            .layer(MockConnectInfo(SocketAddr::from(([203, 0, 113, 9], 4000))))
    }

    async fn send(app: &Router, uri: &str, key: Option<&str>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let mut request = HttpRequest::builder().uri(uri);
        if let Some(key) = key {
            request = request.header("x-api-key", key);
        }
        let response = app
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
        (status, headers, body)
    }

    #[test]
    fn test_stage_order() {
        let p = pipeline(&config(&[], 10));
        assert_eq!(p.stage_names(), vec!["identify", "authenticate", "rate_limit"]);

        let mut disabled = config(&[], 10);
        disabled.rate_limit.enabled = false;
        assert_eq!(pipeline(&disabled).stage_names(), vec!["identify", "authenticate"]);
    }

    #[tokio::test]
    async fn test_request_id_is_threaded_to_handler_and_header() {
        let app = app(pipeline(&config(&[], 10)));
        let (status, headers, body) = send(&app, "/echo", None).await;
        assert_eq!(status, StatusCode::OK);
        let id = String::from_utf8(body).unwrap();
        assert_eq!(headers.get(X_REQUEST_ID).unwrap().to_str().unwrap(), id);
        assert_eq!(headers.get(RATELIMIT_REMAINING).unwrap(), "9");
    }

    #[tokio::test]
    async fn test_unauthorized_envelope() {
        let app = app(pipeline(&config(&["secret"], 10)));
        let (status, headers, body) = send(&app, "/echo", Some("wrong")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Invalid or missing API key");
        assert_eq!(json["request_id"], headers.get(X_REQUEST_ID).unwrap().to_str().unwrap());
        assert!(!String::from_utf8_lossy(&body).contains("secret"));

        let (status, _, _) = send(&app, "/echo", Some("secret")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_and_reports_quota() {
        let app = app(pipeline(&config(&[], 2)));
        send(&app, "/echo", None).await;
        send(&app, "/echo", None).await;

        let (status, headers, body) = send(&app, "/echo", None).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(headers.get(RATELIMIT_REMAINING).unwrap(), "0");
        assert!(headers.contains_key(RETRY_AFTER));

        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Too many requests, please try again later");
        assert_eq!(json["details"]["rate_limit_remaining"], 0);
    }

    #[tokio::test]
    async fn test_exempt_path_skips_gates() {
        let app = app(pipeline(&config(&["secret"], 1)));
        for _ in 0..3 {
            let (status, headers, _) = send(&app, "/health", None).await;
            assert_eq!(status, StatusCode::OK);
            assert!(headers.contains_key(X_REQUEST_ID));
            assert!(!headers.contains_key(RATELIMIT_REMAINING));
        }
    }

    #[tokio::test]
    async fn test_not_found_envelope() {
        let app = app(pipeline(&config(&[], 10)));
        let (status, _, body) = send(&app, "/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Route not found");
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_not_found_log_carries_request_fields() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();

        let p = pipeline(&config(&[], 10));
        let (parts, _) = HttpRequest::builder()
            .method("DELETE")
            .uri("/nope")
            .body(())
            .unwrap()
            .into_parts();
        let mut ctx = RequestContext::new(&parts, None, p.credential_header());

        let response = tracing::subscriber::with_default(subscriber, || {
            p.admit(&mut ctx).unwrap();
            p.render_error(&ctx, &ApiError::NotFound)
        });
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let line = output
            .lines()
            .find(|line| line.contains("Route not found"))
            .expect("no Route not found line");
        assert!(line.contains(&format!("request_id={}", ctx.id)));
        assert!(line.contains("method=DELETE"));
        assert!(line.contains("path=/nope"));
        assert!(line.contains("error=Route not found"));
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let app = app(pipeline(&config(&[], 10)));
        let (status, _, body) = send(&app, "/explode", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "handler panicked: kaboom");
    }

    #[tokio::test]
    async fn test_internal_detail_hidden_in_production() {
        let mut production = config(&[], 10);
        production.environment = crate::config::Environment::Production;
        let app = app(pipeline(&production));

        let (status, _, body) = send(&app, "/fail", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_framework_rejection_is_enveloped() {
        let app = app(pipeline(&config(&[], 10)));
        let response = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/echo")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Method Not Allowed");
        assert!(json["request_id"].as_str().is_some_and(|id| !id.is_empty()));
    }
}
