//! Log-line templates.
//!
//! This module implements a small compile-once / render-many substitution
//! engine scoped to the six [`LogRecord`] fields. A format string is literal
//! text interleaved with `{{Field}}` references:
//!
//! ```text
//! {{Method}} {{Path}} -> {{Status}} in {{Duration}}
//! ```
//!
//! Field references are validated when the template is compiled, so rendering
//! a compiled template can never fail. Recognized fields are `StartTime`,
//! `Status`, `Duration`, `Hostname`, `Method` and `Path`; a leading dot
//! (`{{.Status}}`) is accepted for compatibility with classic format strings.

use crate::record::LogRecord;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use std::fmt::Write;
use std::time::Duration;

/// Format string used when none is configured.
pub const DEFAULT_FORMAT: &str =
    "{{StartTime}} | {{Status}} | \t {{Duration}} | {{Hostname}} | {{Method}} {{Path}} \n";

/// Date-format pattern used for `StartTime` when none is configured (RFC 3339).
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Error compiling a format string into a [`LogTemplate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// The format string references a field that is not part of the record.
    #[error("unknown field `{0}` in log format")]
    UnknownField(String),
    /// A `{{` opener with no matching `}}`.
    #[error("unterminated field reference at byte {offset} in log format")]
    UnterminatedField { offset: usize },
}

/// The six attributes a format string can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    StartTime,
    Status,
    Duration,
    Hostname,
    Method,
    Path,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "StartTime" => Some(Self::StartTime),
            "Status" => Some(Self::Status),
            "Duration" => Some(Self::Duration),
            "Hostname" => Some(Self::Hostname),
            "Method" => Some(Self::Method),
            "Path" => Some(Self::Path),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// A compiled log-line template.
///
/// Compile once at configuration time, then render for every request.
/// Rendering is a pure function of the record — the template holds no
/// mutable state and is freely shared across concurrent requests.
///
/// # Examples
///
/// ```rust
/// use logline::{LogRecord, LogTemplate};
/// use axum::http::{Method, StatusCode};
/// use std::time::Duration;
///
/// let template = LogTemplate::compile("{{Method}} {{Path}} -> {{Status}}\n").unwrap();
/// let record = LogRecord {
///     start_time: "2024-01-01T00:00:00Z".into(),
///     status: StatusCode::OK,
///     duration: Duration::from_millis(3),
///     hostname: "example.com".into(),
///     method: Method::GET,
///     path: "/health".into(),
/// };
/// assert_eq!(template.render(&record), "GET /health -> 200\n");
/// ```
#[derive(Debug, Clone)]
pub struct LogTemplate {
    segments: Vec<Segment>,
}

impl LogTemplate {
    /// Parse a format string, validating every field reference.
    pub fn compile(format: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = format;
        let mut offset = 0;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_owned()));
            }
            let after = &rest[open + 2..];
            let close = after
                .find("}}")
                .ok_or(TemplateError::UnterminatedField { offset: offset + open })?;
            let name = after[..close].trim();
            let name = name.strip_prefix('.').unwrap_or(name);
            let field = Field::from_name(name)
                .ok_or_else(|| TemplateError::UnknownField(name.to_owned()))?;
            segments.push(Segment::Field(field));
            offset += open + close + 4;
            rest = &after[close + 2..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_owned()));
        }

        Ok(Self { segments })
    }

    /// Substitute the record into the template.
    ///
    /// Literal text (including embedded whitespace and newlines) is emitted
    /// verbatim. This cannot fail: every field reference was resolved at
    /// compile time and every record field is always populated.
    pub fn render(&self, record: &LogRecord) -> String {
        let mut out = String::with_capacity(96);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(Field::StartTime) => out.push_str(&record.start_time),
                Segment::Field(Field::Status) => {
                    let _ = write!(out, "{}", record.status.as_u16());
                }
                Segment::Field(Field::Duration) => {
                    out.push_str(&format_duration(record.duration));
                }
                Segment::Field(Field::Hostname) => out.push_str(&record.hostname),
                Segment::Field(Field::Method) => out.push_str(record.method.as_str()),
                Segment::Field(Field::Path) => out.push_str(&record.path),
            }
        }
        out
    }
}

impl Default for LogTemplate {
    fn default() -> Self {
        // DEFAULT_FORMAT is a fixed constant; compilation is covered by a
        // unit test and cannot fail at runtime.
        Self::compile(DEFAULT_FORMAT).expect("default log format compiles")
    }
}

/// Render a timestamp with a strftime-style pattern.
///
/// Pattern validity is the caller's problem: a pattern with an unrecognized
/// specifier degrades to emitting the pattern text itself, rather than
/// failing the request's log line.
pub(crate) fn format_timestamp(instant: DateTime<Local>, pattern: &str) -> String {
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return pattern.to_owned();
    }
    instant.format_with_items(items.into_iter()).to_string()
}

/// Render a duration in the conventional compact form: `450ns`, `1.5µs`,
/// `1.5ms`, `2s`, `1m30s`, `1h0m0s`. Fractions are trimmed of trailing
/// zeros and only the seconds component carries a fraction.
pub fn format_duration(duration: Duration) -> String {
    let ns = duration.as_nanos();
    if ns == 0 {
        return "0s".to_owned();
    }
    if ns < 1_000 {
        return format!("{ns}ns");
    }
    if ns < 1_000_000 {
        return scaled(ns, 1_000, "µs");
    }
    if ns < 1_000_000_000 {
        return scaled(ns, 1_000_000, "ms");
    }

    let total_secs = ns / 1_000_000_000;
    let seconds = scaled(ns % 60_000_000_000, 1_000_000_000, "s");
    let minutes = total_secs / 60;
    if minutes == 0 {
        return seconds;
    }
    let hours = minutes / 60;
    if hours == 0 {
        return format!("{minutes}m{seconds}");
    }
    format!("{hours}h{}m{seconds}", minutes % 60)
}

fn scaled(ns: u128, unit: u128, suffix: &str) -> String {
    let whole = ns / unit;
    let frac = ns % unit;
    if frac == 0 {
        return format!("{whole}{suffix}");
    }
    let width = unit.ilog10() as usize;
    let mut digits = format!("{:0width$}", frac, width = width);
    while digits.ends_with('0') {
        digits.pop();
    }
    format!("{whole}.{digits}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};
    use chrono::TimeZone;

    fn sample_record() -> LogRecord {
        LogRecord {
            start_time: "2024-01-01T00:00:00Z".to_owned(),
            status: StatusCode::OK,
            duration: Duration::from_nanos(1_500_000),
            hostname: "example.com".to_owned(),
            method: Method::GET,
            path: "/health".to_owned(),
        }
    }

    #[test]
    fn default_format_round_trip() {
        let template = LogTemplate::default();
        assert_eq!(
            template.render(&sample_record()),
            "2024-01-01T00:00:00Z | 200 | \t 1.5ms | example.com | GET /health \n"
        );
    }

    #[test]
    fn status_renders_as_bare_code() {
        let template = LogTemplate::compile("{{Status}}").unwrap();
        let mut record = sample_record();
        record.status = StatusCode::NOT_FOUND;
        assert_eq!(template.render(&record), "404");
    }

    #[test]
    fn dotted_field_names_are_accepted() {
        let template = LogTemplate::compile("{{.Method}} {{.Path}}").unwrap();
        assert_eq!(template.render(&sample_record()), "GET /health");
    }

    #[test]
    fn literal_only_format() {
        let template = LogTemplate::compile("no fields here\n").unwrap();
        assert_eq!(template.render(&sample_record()), "no fields here\n");
    }

    #[test]
    fn unknown_field_is_a_compile_error() {
        let err = LogTemplate::compile("{{.Nope}}").unwrap_err();
        assert_eq!(err, TemplateError::UnknownField("Nope".to_owned()));
    }

    #[test]
    fn unterminated_reference_is_a_compile_error() {
        let err = LogTemplate::compile("before {{Status").unwrap_err();
        assert_eq!(err, TemplateError::UnterminatedField { offset: 7 });
    }

    #[test]
    fn surrounding_whitespace_in_reference_is_tolerated() {
        let template = LogTemplate::compile("{{ Hostname }}").unwrap();
        assert_eq!(template.render(&sample_record()), "example.com");
    }

    #[test]
    fn duration_formatting() {
        let cases = [
            (Duration::ZERO, "0s"),
            (Duration::from_nanos(450), "450ns"),
            (Duration::from_nanos(1_500), "1.5µs"),
            (Duration::from_nanos(1_500_000), "1.5ms"),
            (Duration::from_nanos(1_000_000), "1ms"),
            (Duration::from_nanos(999_999), "999.999µs"),
            (Duration::from_secs(2), "2s"),
            (Duration::from_nanos(1_234_567_891), "1.234567891s"),
            (Duration::from_millis(61_500), "1m1.5s"),
            (Duration::from_secs(90), "1m30s"),
            (Duration::from_secs(3600), "1h0m0s"),
            (Duration::from_secs(3661), "1h1m1s"),
        ];
        for (duration, expected) in cases {
            assert_eq!(format_duration(duration), expected, "for {duration:?}");
        }
    }

    #[test]
    fn timestamp_uses_pattern() {
        let instant = Local.with_ymd_and_hms(2024, 6, 15, 12, 30, 45).unwrap();
        assert_eq!(format_timestamp(instant, "%Y/%m/%d"), "2024/06/15");
    }

    #[test]
    fn invalid_timestamp_pattern_degrades_to_literal() {
        let instant = Local.with_ymd_and_hms(2024, 6, 15, 12, 30, 45).unwrap();
        assert_eq!(format_timestamp(instant, "%Q-oops"), "%Q-oops");
    }
}
