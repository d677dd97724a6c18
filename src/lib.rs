//! Phone number generator API library.
//!
//! Synthesizes syntactically valid North-American-style phone numbers and
//! serves them over HTTP behind a request pipeline (identification,
//! authentication, rate limiting, validation, error envelopes).

pub mod config;
pub mod generator;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod security;

pub use config::ServiceConfig;
pub use generator::{PhoneFormat, PhoneNumber, PhoneNumberGenerator};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{ApiError, Pipeline};
