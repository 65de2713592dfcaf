//! Line layouts shared by every sink of a [`Logger`](crate::Logger).

use crate::error::LoggerError;
use crate::palette::{RESET, Severity};
use crate::paths::PathRewriter;
use chrono::{DateTime, Local, SecondsFormat};
use serde_json::{Map, Value, json};
use std::borrow::Cow;
use std::fmt::{self, Write as _};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Field names with special meaning to the formatter.
const MESSAGE_FIELD: &str = "message";
const FILE_FIELD: &str = "log.file";
const LINE_FIELD: &str = "log.line";
const CRITICAL_FIELD: &str = "critical";

/// How a record is laid out on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogFormat {
    /// `[2024-05-01 17:05:32,000] | ~/src/main.rs:12 | INFO | message`
    #[default]
    Standard,
    /// `2024-05-01 17:05:32,000 INFO app::module: message`
    Compact,
    /// One JSON object per line, never coloured.
    Json,
}

impl LogFormat {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Compact => "compact",
            Self::Json => "json",
        }
    }

    const fn to_u8(self) -> u8 {
        match self {
            Self::Standard => 0,
            Self::Compact => 1,
            Self::Json => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Compact,
            2 => Self::Json,
            _ => Self::Standard,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(LoggerError::invalid(format!(
                "Unknown log format '{other}' (expected standard, compact or json)"
            ))),
        }
    }
}

/// Runtime-switchable format shared between the sinks of one logger.
#[derive(Debug, Clone, Default)]
pub(crate) struct FormatHandle(Arc<AtomicU8>);

impl FormatHandle {
    pub(crate) fn new(format: LogFormat) -> Self {
        Self(Arc::new(AtomicU8::new(format.to_u8())))
    }

    pub(crate) fn get(&self) -> LogFormat {
        LogFormat::from_u8(self.0.load(Ordering::Relaxed))
    }

    pub(crate) fn set(&self, format: LogFormat) {
        self.0.store(format.to_u8(), Ordering::Relaxed);
    }
}

/// Renders events in the logger's current [`LogFormat`].
#[derive(Debug, Clone)]
pub(crate) struct EventFormatter {
    logger: Arc<str>,
    format: FormatHandle,
    paths: Arc<PathRewriter>,
}

impl EventFormatter {
    pub(crate) fn new(logger: &str, format: FormatHandle, paths: PathRewriter) -> Self {
        Self { logger: Arc::from(logger), format, paths: Arc::new(paths) }
    }

    /// Location printed for a record. Records without a source file show their target
    /// and line `0`.
    fn location(&self, file: Option<String>, line: Option<u64>, target: &str) -> (String, u64) {
        match file {
            Some(file) => (self.paths.source(&file).into_owned(), line.unwrap_or_default()),
            None => (target.to_owned(), 0),
        }
    }
}

impl<S, N> FormatEvent<S, N> for EventFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let mut fields = EventFields::default();
        event.record(&mut fields);

        let severity = Severity::from_level(*meta.level(), fields.critical);
        let (file, line) = self.location(
            fields.file.take().or_else(|| meta.file().map(str::to_owned)),
            fields.line.or_else(|| meta.line().map(u64::from)),
            meta.target(),
        );
        let record = Record {
            now: Local::now(),
            severity,
            target: meta.target(),
            file,
            line,
            fields: &fields,
        };

        match self.format.get() {
            LogFormat::Json => {
                let spans = ctx
                    .event_scope()
                    .map(|scope| scope.from_root().map(|span| span.name()).collect::<Vec<_>>())
                    .unwrap_or_default();
                write_json(&mut writer, &self.logger, &record, &spans)
            },
            format => write_text(&mut writer, format, &record),
        }
    }
}

struct Record<'a> {
    now: DateTime<Local>,
    severity: Severity,
    target: &'a str,
    file: String,
    line: u64,
    fields: &'a EventFields,
}

fn write_text(writer: &mut Writer<'_>, format: LogFormat, record: &Record<'_>) -> fmt::Result {
    let ansi = writer.has_ansi_escapes();
    if ansi {
        writer.write_str(record.severity.color())?;
    }

    let timestamp = record.now.format(TIMESTAMP_FORMAT);
    if format == LogFormat::Compact {
        write!(writer, "{timestamp} {} {}: ", record.severity, record.target)?;
    } else {
        write!(writer, "[{timestamp}] | {}:{} | {} | ", record.file, record.line, record.severity)?;
    }

    writer.write_str(record.fields.message.as_deref().unwrap_or_default())?;
    for (name, value) in &record.fields.extra {
        write!(writer, " {name}={}", text(value))?;
    }

    if ansi {
        writer.write_str(RESET)?;
    }
    writeln!(writer)
}

fn write_json(
    writer: &mut Writer<'_>,
    logger: &str,
    record: &Record<'_>,
    spans: &[&str],
) -> fmt::Result {
    let fields: Map<String, Value> =
        record.fields.extra.iter().map(|(name, value)| ((*name).to_owned(), value.clone())).collect();

    let line = json!({
        "timestamp": record.now.to_rfc3339_opts(SecondsFormat::Millis, false),
        "level": record.severity.label(),
        "logger": logger,
        "target": record.target,
        "file": record.file,
        "line": record.line,
        "message": record.fields.message.as_deref().unwrap_or_default(),
        "fields": fields,
        "spans": spans,
    });

    let rendered = serde_json::to_string(&line).map_err(|_| fmt::Error)?;
    writeln!(writer, "{rendered}")
}

fn text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

/// Collects an event's fields, pulling out the ones the layouts treat specially.
#[derive(Debug, Default)]
struct EventFields {
    message: Option<String>,
    file: Option<String>,
    line: Option<u64>,
    critical: bool,
    extra: Vec<(&'static str, Value)>,
}

impl EventFields {
    fn insert(&mut self, field: &Field, value: Value) {
        match (field.name(), value) {
            (MESSAGE_FIELD, Value::String(message)) => self.message = Some(message),
            (FILE_FIELD, Value::String(file)) => self.file = Some(file),
            (LINE_FIELD, Value::Number(line)) => self.line = line.as_u64(),
            (CRITICAL_FIELD, Value::Bool(critical)) => self.critical = critical,
            (name, value) => self.extra.push((name, value)),
        }
    }
}

impl Visit for EventFields {
    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number);
        self.insert(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_owned()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{value:?}")));
    }
}
