// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Pipe-separated log records.
//!
//! Every tracing event becomes one or more lines of the form
//!
//! ```text
//! TLOG|1|SEVERITY|task id|pid|process group|application|program|correlation id|file:line|timestamp|message
//! ```
//!
//! Multi-line messages produce one record per line, all sharing the header.
//! `ERROR` and `ALARM` records go to stderr, everything else to stdout.
//!
//! The severity comes from the tracing level unless the event carries a
//! `severity` field:
//!
//! ```ignore
//! tracing::info!(severity = "STAT", offers = 3, "Offer round complete");
//! tether_sdk::logging::emit(Severity::Event, format_args!("task {} started", id));
//! ```

use std::env;
use std::fmt::{self, Write as _};
use std::io::{self, Write};
use std::panic::Location;
use std::path::Path;

use chrono::Utc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber, debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// First field of every record.
pub const RECORD_MARKER: &str = "TLOG";
/// Record layout version.
pub const RECORD_VERSION: u32 = 1;

/// Log severities understood by downstream collectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Discarded
    Nop,
    Alarm,
    Error,
    /// Metrics-style records
    Stat,
    Info,
    /// Business events
    Event,
    Debug,
    Unknown,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Nop => "NOP",
            Severity::Alarm => "ALARM",
            Severity::Error => "ERROR",
            Severity::Stat => "STAT",
            Severity::Info => "INFO",
            Severity::Event => "EVENT",
            Severity::Debug => "DEBUG",
            Severity::Unknown => "UNKNOWN",
        }
    }

    /// Parse a severity name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let severity = match name.to_ascii_uppercase().as_str() {
            "NOP" => Severity::Nop,
            "ALARM" => Severity::Alarm,
            "ERROR" => Severity::Error,
            "STAT" => Severity::Stat,
            "INFO" => Severity::Info,
            "EVENT" => Severity::Event,
            "DEBUG" => Severity::Debug,
            "UNKNOWN" => Severity::Unknown,
            _ => return None,
        };
        Some(severity)
    }

    pub fn from_level(level: &Level) -> Self {
        match *level {
            Level::ERROR => Severity::Error,
            Level::WARN => Severity::Alarm,
            Level::INFO => Severity::Info,
            _ => Severity::Debug,
        }
    }

    /// Whether records of this severity belong on stderr.
    pub fn is_alert(self) -> bool {
        matches!(self, Severity::Error | Severity::Alarm)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-level fields stamped on every record.
///
/// Read once at startup; later changes to the environment are not picked up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogContext {
    pub task_id: String,
    pub pid: u32,
    pub process_group: String,
    pub application: String,
    pub program: String,
    pub correlation_id: String,
}

impl LogContext {
    /// Capture the context from the environment.
    ///
    /// # Optional Environment Variables
    /// - `MESOS_TASK_ID` - Task the process runs as
    /// - `TETHER_PROCESS_GROUP` - Process group name
    /// - `TETHER_APP_NAME` - Application name
    /// - `TETHER_CORRELATION_ID` - Correlation id shared across processes
    pub fn from_env() -> Self {
        let program = env::args()
            .next()
            .as_deref()
            .and_then(|arg0| Path::new(arg0).file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            task_id: env::var("MESOS_TASK_ID").unwrap_or_default(),
            pid: std::process::id(),
            process_group: env::var("TETHER_PROCESS_GROUP").unwrap_or_default(),
            application: env::var("TETHER_APP_NAME").unwrap_or_default(),
            program,
            correlation_id: env::var("TETHER_CORRELATION_ID").unwrap_or_default(),
        }
    }

    /// Render `message` as records, one per line, each ending in `\n`.
    pub fn format_records(
        &self,
        severity: Severity,
        location: &str,
        timestamp: &str,
        message: &str,
    ) -> String {
        let header = format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|",
            RECORD_MARKER,
            RECORD_VERSION,
            severity,
            self.task_id,
            self.pid,
            self.process_group,
            self.application,
            self.program,
            self.correlation_id,
            location,
            timestamp,
        );

        let mut out = String::new();
        let mut lines = message.lines().peekable();
        if lines.peek().is_none() {
            out.push_str(&header);
            out.push('\n');
        }
        for line in lines {
            out.push_str(&header);
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Tracing layer writing pipe-separated records.
pub struct PipeLayer<O = fn() -> io::Stdout, E = fn() -> io::Stderr> {
    context: LogContext,
    stdout: O,
    stderr: E,
}

impl PipeLayer {
    /// Layer writing to the process's stdout and stderr.
    pub fn new(context: LogContext) -> Self {
        Self {
            context,
            stdout: io::stdout,
            stderr: io::stderr,
        }
    }
}

impl<O, E> PipeLayer<O, E> {
    /// Layer writing to the given writers instead of stdout/stderr.
    pub fn with_writers(context: LogContext, stdout: O, stderr: E) -> Self {
        Self {
            context,
            stdout,
            stderr,
        }
    }

    pub fn context(&self) -> &LogContext {
        &self.context
    }
}

impl<S, O, E> Layer<S> for PipeLayer<O, E>
where
    S: Subscriber,
    O: for<'w> MakeWriter<'w> + 'static,
    E: for<'w> MakeWriter<'w> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let severity = visitor
            .severity
            .as_deref()
            .and_then(Severity::from_name)
            .unwrap_or_else(|| Severity::from_level(metadata.level()));
        if severity == Severity::Nop {
            return;
        }

        let location = match (visitor.caller_file.as_deref(), visitor.caller_line) {
            (Some(file), Some(line)) => format!("{}:{}", file, line),
            _ => format!(
                "{}:{}",
                metadata.file().unwrap_or(metadata.target()),
                metadata.line().unwrap_or(0)
            ),
        };
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string();
        let records =
            self.context
                .format_records(severity, &location, &timestamp, &visitor.into_message());

        // A failed log write has nowhere to be reported
        let _ = if severity.is_alert() {
            self.stderr.make_writer().write_all(records.as_bytes())
        } else {
            self.stdout.make_writer().write_all(records.as_bytes())
        };
    }
}

/// Collects the message, the severity override and the remaining fields.
#[derive(Default)]
struct RecordVisitor {
    message: String,
    severity: Option<String>,
    caller_file: Option<String>,
    caller_line: Option<u64>,
    fields: String,
}

impl RecordVisitor {
    fn into_message(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            self.message + &self.fields
        }
    }
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "severity" => self.severity = Some(value.to_string()),
            "caller.file" => self.caller_file = Some(value.to_string()),
            name => {
                let _ = write!(self.fields, " {}={}", name, value);
            }
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "caller.line" => self.caller_line = Some(value),
            name => {
                let _ = write!(self.fields, " {}={}", name, value);
            }
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{:?}", value),
            name => {
                let _ = write!(self.fields, " {}={:?}", name, value);
            }
        }
    }
}

/// Emit one message at `severity`, attributed to the caller's location.
#[track_caller]
pub fn emit(severity: Severity, args: fmt::Arguments<'_>) {
    let caller = Location::caller();
    let (file, line) = (caller.file(), caller.line());
    match severity {
        Severity::Nop => {}
        Severity::Alarm => warn!(caller.file = file, caller.line = line, "{}", args),
        Severity::Error => error!(caller.file = file, caller.line = line, "{}", args),
        Severity::Info => info!(caller.file = file, caller.line = line, "{}", args),
        Severity::Debug => debug!(caller.file = file, caller.line = line, "{}", args),
        Severity::Stat | Severity::Event | Severity::Unknown => info!(
            severity = severity.as_str(),
            caller.file = file,
            caller.line = line,
            "{}",
            args
        ),
    }
}

/// Install the pipe layer as the global subscriber.
///
/// Filtering follows `RUST_LOG`, defaulting to `info`.
pub fn init(context: LogContext) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(PipeLayer::new(context))
        .try_init()
}
