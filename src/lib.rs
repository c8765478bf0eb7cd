//! # Logline
//!
//! Template-driven access logging middleware for Axum and Tower. Logline
//! wraps your handler stack, times every request, captures the response
//! status, and writes one formatted line per request to a configurable sink.
//!
//! ## Features
//!
//! - **One line per request**: timing, status, host, method and path,
//!   rendered through a compile-once template
//! - **Configurable format**: format and date-format strings validated at
//!   configuration time, never at request time
//! - **Pluggable output**: stdout by default, or anything implementing
//!   [`LogSink`]
//! - **Never on the request's critical path of correctness**: a failed log
//!   write never fails the HTTP request
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use axum::{routing::get, Router};
//! use logline::AccessLogLayer;
//!
//! async fn health() -> &'static str {
//!     "ok"
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let access_log = AccessLogLayer::new();
//!
//!     // Optional: reconfigure before traffic starts.
//!     access_log
//!         .set_format("{{Method}} {{Path}} -> {{Status}} in {{Duration}}\n")
//!         .unwrap();
//!
//!     let app = Router::new()
//!         .route("/health", get(health))
//!         .layer(access_log);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```
//!
//! ## Format strings
//!
//! A format string is literal text plus `{{Field}}` references to the six
//! record fields: `StartTime`, `Status`, `Duration`, `Hostname`, `Method`,
//! `Path`. The default is [`DEFAULT_FORMAT`]. Unknown fields are rejected
//! when the format is set, so rendering cannot fail mid-request.
//!
//! ## Reconfiguration
//!
//! [`AccessLogLayer::set_format`] and [`AccessLogLayer::set_date_format`] are
//! meant for application setup. Calling them while traffic is flowing is
//! safe memory-wise (the template is swapped atomically and in-flight
//! requests keep the one they started with), but the exact request on which
//! a change takes effect is unspecified.

use axum::{extract::Request, http::header, response::Response};
use chrono::Local;
use std::{
    pin::Pin,
    sync::{Arc, PoisonError, RwLock},
    task::{Context, Poll},
    time::Instant,
};
use tower::{Layer, Service};
use tracing::{debug, error, instrument};

pub mod record;
pub use record::LogRecord;

pub mod sink;
pub use sink::{LogSink, StdoutSink, WriterSink};

pub mod template;
pub use template::{LogTemplate, TemplateError, DEFAULT_DATE_FORMAT, DEFAULT_FORMAT};

/// Configuration for the access-log middleware.
///
/// Both fields default to the named constants [`DEFAULT_FORMAT`] and
/// [`DEFAULT_DATE_FORMAT`].
///
/// # Examples
///
/// ```rust
/// use logline::AccessLogConfig;
///
/// // Default configuration
/// let config = AccessLogConfig::default();
///
/// // Custom configuration
/// let config = AccessLogConfig {
///     format: "{{Method}} {{Path}} -> {{Status}}\n".to_owned(),
///     date_format: "%d/%b/%Y:%H:%M:%S %z".to_owned(),
/// };
/// ```
#[derive(Clone, Debug)]
pub struct AccessLogConfig {
    /// Log-line format string (see [`LogTemplate`]).
    pub format: String,
    /// strftime-style pattern used to render the request start time.
    pub date_format: String,
}

impl Default for AccessLogConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_FORMAT.to_owned(),
            date_format: DEFAULT_DATE_FORMAT.to_owned(),
        }
    }
}

/// State shared between the layer handle and every service clone.
struct Shared {
    template: RwLock<Arc<LogTemplate>>,
    date_format: RwLock<String>,
    sink: Arc<dyn LogSink>,
}

impl Shared {
    /// Snapshot the template and date format for one request. The lock is
    /// held only long enough to clone, so a concurrent swap is visible to
    /// the next request, never to one already in flight.
    fn snapshot(&self) -> (Arc<LogTemplate>, String) {
        let template = self
            .template
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let date_format = self
            .date_format
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        (template, date_format)
    }
}

/// Tower layer that adds per-request access logging.
///
/// This is the main entry point. The layer is cheap to clone and every clone
/// (and every service built from it) shares the same template, date format
/// and sink, so a `set_format` on the layer handle is seen by live services.
///
/// # Examples
///
/// ```rust,no_run
/// use axum::{routing::get, Router};
/// use logline::{AccessLogLayer, WriterSink};
/// use std::sync::Arc;
///
/// # async fn hello() -> &'static str { "Hello" }
/// # #[tokio::main]
/// # async fn main() {
/// // Default: lines go to stdout.
/// let access_log = AccessLogLayer::new();
///
/// // Or direct them anywhere that implements std::io::Write.
/// let to_stderr = AccessLogLayer::with_sink(Arc::new(WriterSink::new(std::io::stderr())));
///
/// let app = Router::new().route("/hello", get(hello)).layer(access_log);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
/// axum::serve(listener, app).await.unwrap();
/// # }
/// ```
#[derive(Clone)]
pub struct AccessLogLayer {
    shared: Arc<Shared>,
}

impl AccessLogLayer {
    /// Create a layer with the default format, date format and stdout sink.
    pub fn new() -> Self {
        Self::with_sink(Arc::new(StdoutSink))
    }

    /// Create a layer with the default format writing to an explicit sink.
    pub fn with_sink(sink: Arc<dyn LogSink>) -> Self {
        Self {
            shared: Arc::new(Shared {
                template: RwLock::new(Arc::new(LogTemplate::default())),
                date_format: RwLock::new(DEFAULT_DATE_FORMAT.to_owned()),
                sink,
            }),
        }
    }

    /// Create a layer from an explicit configuration.
    ///
    /// Fails if the configured format string does not compile. Pass `None`
    /// for the sink to use stdout.
    pub fn with_config(
        config: AccessLogConfig,
        sink: Option<Arc<dyn LogSink>>,
    ) -> Result<Self, TemplateError> {
        let template = LogTemplate::compile(&config.format)?;
        Ok(Self {
            shared: Arc::new(Shared {
                template: RwLock::new(Arc::new(template)),
                date_format: RwLock::new(config.date_format),
                sink: sink.unwrap_or_else(|| Arc::new(StdoutSink)),
            }),
        })
    }

    /// Compile `format` and swap it in as the active template.
    ///
    /// The swap is atomic: requests that started before the call keep
    /// rendering with the template they captured, requests that start after
    /// it use the new one. On error the previous template stays active.
    pub fn set_format(&self, format: &str) -> Result<(), TemplateError> {
        let template = LogTemplate::compile(format)?;
        *self
            .shared
            .template
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(template);
        Ok(())
    }

    /// Replace the date-format pattern used for `StartTime`.
    ///
    /// The pattern is not validated; a pattern chrono cannot interpret
    /// degrades to being emitted literally.
    pub fn set_date_format(&self, pattern: &str) {
        *self
            .shared
            .date_format
            .write()
            .unwrap_or_else(PoisonError::into_inner) = pattern.to_owned();
    }
}

impl Default for AccessLogLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for AccessLogLayer {
    type Service = AccessLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessLogService {
            inner,
            shared: self.shared.clone(),
        }
    }
}

/// Tower service wrapping an inner service with access logging.
///
/// Created by [`AccessLogLayer`]; users don't normally name this type. The
/// service observes without touching: the request is delegated unchanged and
/// only the status is read from the response.
#[derive(Clone)]
pub struct AccessLogService<S> {
    inner: S,
    shared: Arc<Shared>,
}

impl<S> Service<Request> for AccessLogService<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future =
        Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    #[instrument(skip_all)]
    fn call(&mut self, request: Request) -> Self::Future {
        let start = Instant::now();
        let started_at = Local::now();

        let method = request.method().clone();
        let path = request.uri().path().to_owned();
        let hostname = request
            .headers()
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .or_else(|| request.uri().authority().map(|a| a.to_string()))
            .unwrap_or_default();

        // Captured before the inner call: a format swap mid-request must not
        // affect this request's line.
        let (template, date_format) = self.shared.snapshot();
        let shared = self.shared.clone();

        debug!(method = %method, path = %path, "observing request");

        let future = self.inner.call(request);

        Box::pin(async move {
            let response = future.await?;

            let record = LogRecord {
                start_time: template::format_timestamp(started_at, &date_format),
                status: response.status(),
                duration: start.elapsed(),
                hostname,
                method,
                path,
            };

            let line = template.render(&record);
            if let Err(e) = shared.sink.write_line(line.as_bytes()) {
                // Logging is advisory; the response has already been served.
                error!(error = %e, "access log write failed");
            }

            Ok(response)
        })
    }
}
