//! Structured JSON logger for rankdb
//!
//! - Structured logs (JSON), one line per event
//! - Deterministic key ordering
//! - Synchronous, no buffering
//! - ERROR and FATAL go to stderr

use std::fmt;
use std::io::{self, Write};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Invariant breaches
    Fatal = 4,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One structured log event.
///
/// The event name and severity always lead the line; remaining fields are
/// emitted in alphabetical key order so identical events produce identical
/// bytes.
pub struct LogEvent<'a> {
    severity: Severity,
    event: &'a str,
    fields: &'a [(&'a str, &'a str)],
}

impl<'a> LogEvent<'a> {
    /// Create an event
    pub fn new(severity: Severity, event: &'a str, fields: &'a [(&'a str, &'a str)]) -> Self {
        Self {
            severity,
            event,
            fields,
        }
    }

    /// Emit the event to stdout (stderr for ERROR and FATAL)
    pub fn emit(&self) {
        if self.severity >= Severity::Error {
            self.write_to(&mut io::stderr());
        } else {
            self.write_to(&mut io::stdout());
        }
    }

    /// Render the event into a writer as one JSON line
    pub fn write_to<W: Write>(&self, writer: &mut W) {
        let mut line = String::with_capacity(128);

        line.push_str("{\"event\":\"");
        escape_json_string(&mut line, self.event);
        line.push_str("\",\"severity\":\"");
        line.push_str(self.severity.as_str());
        line.push('"');

        let mut sorted: Vec<&(&str, &str)> = self.fields.iter().collect();
        sorted.sort_by_key(|(key, _)| *key);

        for (key, value) in sorted {
            line.push_str(",\"");
            escape_json_string(&mut line, key);
            line.push_str("\":\"");
            escape_json_string(&mut line, value);
            line.push('"');
        }

        line.push_str("}\n");

        // One write, one flush per event
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }
}

fn escape_json_string(output: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if c.is_control() => {
                output.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => output.push(c),
        }
    }
}

/// Log at TRACE level
pub fn trace(event: &str, fields: &[(&str, &str)]) {
    LogEvent::new(Severity::Trace, event, fields).emit();
}

/// Log at INFO level
pub fn info(event: &str, fields: &[(&str, &str)]) {
    LogEvent::new(Severity::Info, event, fields).emit();
}

/// Log at WARN level
pub fn warn(event: &str, fields: &[(&str, &str)]) {
    LogEvent::new(Severity::Warn, event, fields).emit();
}

/// Log at ERROR level
pub fn error(event: &str, fields: &[(&str, &str)]) {
    LogEvent::new(Severity::Error, event, fields).emit();
}

/// Log at FATAL level
pub fn fatal(event: &str, fields: &[(&str, &str)]) {
    LogEvent::new(Severity::Fatal, event, fields).emit();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut buffer = Vec::new();
        LogEvent::new(severity, event, fields).write_to(&mut buffer);
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Trace < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_line_is_valid_json() {
        let line = render(Severity::Info, "CONTAINER_READY", &[("views", "4")]);

        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "CONTAINER_READY");
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["views"], "4");
    }

    #[test]
    fn test_deterministic_field_ordering() {
        let one = render(
            Severity::Info,
            "TEST",
            &[("zebra", "1"), ("apple", "2"), ("mango", "3")],
        );
        let two = render(
            Severity::Info,
            "TEST",
            &[("apple", "2"), ("mango", "3"), ("zebra", "1")],
        );

        assert_eq!(one, two);

        let apple = one.find("apple").unwrap();
        let mango = one.find("mango").unwrap();
        let zebra = one.find("zebra").unwrap();
        assert!(apple < mango);
        assert!(mango < zebra);
    }

    #[test]
    fn test_escapes_special_characters() {
        let line = render(Severity::Warn, "TEST", &[("message", "say \"hi\"\nbye")]);

        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["message"], "say \"hi\"\nbye");
    }

    #[test]
    fn test_one_event_one_line() {
        let line = render(Severity::Info, "TEST", &[("a", "1"), ("b", "2")]);

        assert_eq!(line.chars().filter(|c| *c == '\n').count(), 1);
        assert!(line.ends_with('\n'));
    }
}
