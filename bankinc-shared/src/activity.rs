//! Append-only activity log shown to the user.
//!
//! Every dispatched call, every session milestone and every local
//! validation message becomes an [`ActivityEntry`]. Entries are kept in
//! memory most-recent-first and, when a [`LogSurface`] is attached, rendered
//! onto it as they are recorded. Without a surface, recording only updates
//! the in-memory history.

use chrono::{DateTime, Local};
use serde_json::{Map, Value, json};
use std::{
    collections::VecDeque,
    fmt,
    io::{self, Write},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::transport::{ApiResponse, ResponseBody};

/// What happened.
#[derive(Debug, Clone, PartialEq)]
pub enum LogRecord {
    /// A call reached (or tried to reach) the service. `status` is `None`
    /// when no HTTP status was obtained.
    Response {
        /// Requested URL.
        url: String,
        /// HTTP status, if one was obtained.
        status: Option<u16>,
        /// Decoded body, or the transport error text.
        body: ResponseBody,
    },
    /// A session milestone such as `login` or `registered_but_card_failed`.
    Event {
        /// Milestone name.
        event: String,
        /// Extra fields, merged into the rendered object.
        detail: Value,
    },
    /// A local message, usually a validation failure.
    Notice(String),
}

impl LogRecord {
    /// Session milestone with extra fields merged into the rendered object.
    pub fn event(event: impl Into<String>, detail: Value) -> Self {
        Self::Event {
            event: event.into(),
            detail,
        }
    }

    /// Event name, for events.
    #[must_use]
    pub fn event_name(&self) -> Option<&str> {
        match self {
            Self::Event { event, .. } => Some(event),
            _ => None,
        }
    }

    /// Structured form, as it is rendered.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Response { url, status, body } => {
                json!({"url": url, "status": status, "body": body.to_json()})
            }
            Self::Event { event, detail } => {
                let mut fields = Map::new();
                fields.insert("event".to_string(), Value::String(event.clone()));
                if let Value::Object(extra) = detail {
                    fields.extend(extra.clone());
                }
                Value::Object(fields)
            }
            Self::Notice(message) => Value::String(message.clone()),
        }
    }
}

impl From<&ApiResponse> for LogRecord {
    fn from(response: &ApiResponse) -> Self {
        Self::Response {
            url: response.url.clone(),
            status: Some(response.status),
            body: response.body.clone(),
        }
    }
}

/// A timestamped [`LogRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    /// When the record was logged.
    pub timestamp: DateTime<Local>,
    /// What was logged.
    pub record: LogRecord,
}

impl ActivityEntry {
    /// `HH:MM:SS - <pretty JSON>`.
    #[must_use]
    pub fn render(&self) -> String {
        let body = serde_json::to_string_pretty(&self.record.to_json()).unwrap_or_default();
        format!("{} - {body}", self.timestamp.format("%H:%M:%S"))
    }
}

/// Where rendered entries are shown.
pub trait LogSurface: Send + Sync + fmt::Debug {
    /// Puts `line` on top of whatever is shown. Must not fail.
    fn prepend(&self, line: &str);
}

/// Shared, clonable activity log.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: Arc<Mutex<VecDeque<ActivityEntry>>>,
    surface: Option<Arc<dyn LogSurface>>,
}

impl ActivityLog {
    /// A log rendering onto `surface`, if any.
    #[must_use]
    pub fn new(surface: Option<Arc<dyn LogSurface>>) -> Self {
        Self {
            entries: Arc::default(),
            surface,
        }
    }

    /// A log with no display surface attached.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(None)
    }

    fn history(&self) -> MutexGuard<'_, VecDeque<ActivityEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Timestamps `record` and puts it on top.
    pub fn record(&self, record: LogRecord) {
        let entry = ActivityEntry {
            timestamp: Local::now(),
            record,
        };
        if let Some(surface) = &self.surface {
            surface.prepend(&entry.render());
        }
        self.history().push_front(entry);
    }

    /// Snapshot of every entry, most recent first.
    #[must_use]
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.history().iter().cloned().collect()
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history().len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history().is_empty()
    }
}

/// Text panel kept in memory, newest line first.
#[derive(Debug, Default)]
pub struct MemorySurface {
    text: Mutex<String>,
}

impl MemorySurface {
    /// Current panel contents.
    #[must_use]
    pub fn text(&self) -> String {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LogSurface for MemorySurface {
    fn prepend(&self, line: &str) {
        let mut text = self.text.lock().unwrap_or_else(PoisonError::into_inner);
        *text = format!("{line}\n{text}");
    }
}

/// Streams entries to a writer as they arrive.
///
/// A stream cannot prepend, so the newest entry is simply the last one
/// written; completion order is preserved either way.
pub struct WriterSurface<W> {
    writer: Mutex<W>,
}

impl WriterSurface<io::Stdout> {
    /// Surface printing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> WriterSurface<W> {
    /// Wraps `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W> fmt::Debug for WriterSurface<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSurface").finish_non_exhaustive()
    }
}

impl<W: Write + Send> LogSurface for WriterSurface<W> {
    fn prepend(&self, line: &str) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        // A closed pipe must not take the client down with it.
        let _ = writeln!(writer, "{line}").and_then(|()| writer.flush());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(text: &str) -> LogRecord {
        LogRecord::Notice(text.to_string())
    }

    #[test]
    fn test_entries_are_most_recent_first() {
        let log = ActivityLog::detached();
        log.record(notice("first"));
        log.record(notice("second"));

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].record, notice("second"));
        assert_eq!(entries[1].record, notice("first"));
    }

    #[test]
    fn test_detached_log_never_fails() {
        let log = ActivityLog::detached();
        assert!(log.is_empty());
        log.record(LogRecord::event("login", json!({"user": "ana"})));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_memory_surface_prepends_rendered_lines() {
        let surface = Arc::new(MemorySurface::default());
        let log = ActivityLog::new(Some(surface.clone()));

        log.record(notice("Enter a card id"));
        log.record(LogRecord::Response {
            url: "http://localhost:8081/cards/c/balance".into(),
            status: Some(200),
            body: ResponseBody::Json(json!(25.5)),
        });

        let text = surface.text();
        let balance_at = text.find("/cards/c/balance").unwrap();
        let notice_at = text.find("Enter a card id").unwrap();
        assert!(balance_at < notice_at);
    }

    #[test]
    fn test_render_format() {
        let entry = ActivityEntry {
            timestamp: Local::now(),
            record: LogRecord::Response {
                url: "http://localhost:8081/transaction/tx-1".into(),
                status: Some(404),
                body: ResponseBody::Text("Transacción no encontrada.".into()),
            },
        };
        let rendered = entry.render();
        let (time, json) = rendered.split_once(" - ").unwrap();

        assert_eq!(time.len(), 8);
        assert_eq!(time.matches(':').count(), 2);
        let parsed: Value = serde_json::from_str(json).unwrap();
        assert_eq!(parsed["status"], json!(404));
        assert_eq!(parsed["body"], json!("Transacción no encontrada."));
    }

    #[test]
    fn test_event_fields_are_flattened() {
        let record = LogRecord::event("registered", json!({"user": "ana", "card": "PROD01"}));
        assert_eq!(
            record.to_json(),
            json!({"event": "registered", "user": "ana", "card": "PROD01"})
        );
        assert_eq!(record.event_name(), Some("registered"));
        assert_eq!(notice("x").to_json(), json!("x"));
    }

    #[test]
    fn test_transport_failure_renders_null_status() {
        let record = LogRecord::Response {
            url: "http://localhost:8081/cards/me".into(),
            status: None,
            body: ResponseBody::Text("connection refused".into()),
        };
        assert_eq!(record.to_json()["status"], Value::Null);
    }

    #[test]
    fn test_writer_surface_writes_each_line() {
        let surface = WriterSurface::new(Vec::new());
        surface.prepend("one");
        surface.prepend("two");
        let written = String::from_utf8(surface.into_inner()).unwrap();
        assert_eq!(written, "one\ntwo\n");
    }
}
