//! The per-request log record.
//!
//! A [`LogRecord`] is assembled by the middleware after the inner service has
//! produced its response, and handed to the compiled template for rendering.
//! It is built fresh for every request and never reused.

use axum::http::{Method, StatusCode};
use std::time::Duration;

/// A snapshot of one completed request, ready for rendering.
///
/// All fields are populated before the record is handed to the template;
/// there is no partially-filled state. The record is a plain value — cloning
/// it is cheap and it carries no references into the request or response.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Request start instant, already rendered with the configured
    /// date-format pattern.
    pub start_time: String,
    /// Final HTTP status of the response. Rendered as a bare decimal code
    /// (`200`), not the canonical reason form (`200 OK`).
    pub status: StatusCode,
    /// Wall time elapsed between request arrival and response completion.
    pub duration: Duration,
    /// The `Host` header of the incoming request, falling back to the URI
    /// authority, or empty when neither is present.
    pub hostname: String,
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request URI path, without query parameters.
    pub path: String,
}
