//! Output sinks for rendered log lines.
//!
//! A sink receives one complete line per request. Implementations must make
//! `write_line` atomic with respect to concurrent callers — lines from
//! concurrent requests may arrive in any order, but must never interleave
//! byte-wise.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// Destination for rendered log lines.
///
/// One call per completed request, carrying the full line (including its
/// trailing newline, if the format has one). Errors returned from
/// `write_line` are advisory: the middleware reports them through `tracing`
/// and never fails the HTTP request over them.
pub trait LogSink: Send + Sync + 'static {
    /// Write one complete line, atomically.
    fn write_line(&self, line: &[u8]) -> io::Result<()>;
}

/// The default sink: the process's standard output.
///
/// Each line is written under the stdout lock in a single `write_all`, so
/// lines from concurrent requests never interleave.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(line)?;
        out.flush()
    }
}

/// Adapter turning any `Write` into a [`LogSink`].
///
/// The writer is guarded by a mutex, which provides the whole-line atomicity
/// the sink contract requires.
///
/// # Examples
///
/// ```rust
/// use logline::{AccessLogLayer, WriterSink};
/// use std::sync::Arc;
///
/// let file = std::io::sink(); // any std::io::Write
/// let layer = AccessLogLayer::with_sink(Arc::new(WriterSink::new(file)));
/// ```
#[derive(Debug)]
pub struct WriterSink<W> {
    inner: Mutex<W>,
}

impl<W: Write + Send + 'static> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send + 'static> LogSink for WriterSink<W> {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let mut writer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(line)?;
        writer.flush()
    }
}
