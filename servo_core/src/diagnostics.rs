//! Key/value diagnostic output. Purely observational; the controller never
//! reads anything back from a sink.

use std::fmt::Display;

pub trait DiagnosticSink {
    fn record(&mut self, key: &str, value: &dyn Display);
}

/// Collects pairs as strings; handy for tests and for the CLI's JSON output.
impl DiagnosticSink for Vec<(String, String)> {
    fn record(&mut self, key: &str, value: &dyn Display) {
        self.push((key.to_string(), value.to_string()));
    }
}

/// Emits each pair as an `info` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&mut self, key: &str, value: &dyn Display) {
        tracing::info!(key, value = %value, "servo diagnostic");
    }
}
