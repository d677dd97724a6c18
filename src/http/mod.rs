//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, middleware stack)
//!     → pipeline (identify, authenticate, rate limit)
//!     → handlers.rs (validate, generate)
//!     → response.rs (success envelope)
//!     → Send to client
//! ```

pub mod handlers;
pub mod response;
pub mod server;

pub use response::{timestamp, Envelope, RateLimitMetadata};
pub use server::{AppState, HttpServer};
