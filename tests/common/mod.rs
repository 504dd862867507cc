//! Shared test infrastructure for clock-engine integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use std::sync::{Arc, Mutex};

use clock_engine::{Duration, TimeSink};

// ============================================================================
// Mock Sink
// ============================================================================

/// Mock sink that records every write for testing
#[derive(Debug, Default)]
pub struct RecordingSink {
    displayed: String,
    history: Vec<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn displayed(&self) -> &str {
        &self.displayed
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Overwrite the display without going through a clock, as a controller would
    pub fn overwrite(&mut self, text: &str) {
        self.displayed = text.to_string();
    }
}

impl TimeSink for RecordingSink {
    fn write(&mut self, text: &str) {
        self.displayed = text.to_string();
        self.history.push(text.to_string());
    }

    fn is_displaying(&self, text: &str) -> bool {
        self.displayed == text
    }
}

/// Sink shared between a spawned task and the test body
pub type SharedSink = Arc<Mutex<RecordingSink>>;

pub fn shared_sink() -> SharedSink {
    Arc::new(Mutex::new(RecordingSink::new()))
}

pub fn displayed(sink: &SharedSink) -> String {
    sink.lock().unwrap().displayed().to_string()
}

pub fn history(sink: &SharedSink) -> Vec<String> {
    sink.lock().unwrap().history().to_vec()
}

// ============================================================================
// Test Helper Functions
// ============================================================================

/// Shorthand for a valid duration
pub fn hms(hour: i64, minute: i64, second: i64) -> Duration {
    Duration::new(hour, minute, second).unwrap()
}

/// Build the expected write history from string literals
pub fn texts(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
