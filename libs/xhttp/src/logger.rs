//! Caller-supplied request logging.
//!
//! The built-in hooks describe each outgoing request in one line (method,
//! headers, URL and body). Lines only go to a logger registered with
//! [`RequestOption::logger`](crate::RequestOption::logger); errors are never
//! sent there.

use crate::config::Headers;

/// External logger receiving informational request traces
pub trait RequestLogger: Send + Sync {
    /// Print one line
    fn log_line(&self, line: &str);
}

impl<F> RequestLogger for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log_line(&self, line: &str) {
        self(line);
    }
}

/// Logger forwarding lines to `tracing` at INFO level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl RequestLogger for TracingLogger {
    fn log_line(&self, line: &str) {
        tracing::info!(target: "xhttp::request", "{line}");
    }
}

/// Render headers as `name: value` pairs for a log line.
pub fn format_headers(headers: &Headers) -> String {
    let mut out = String::from("{");
    for (i, (name, value)) in headers.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
    }
    out.push('}');
    out
}
