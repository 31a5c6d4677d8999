//! Common test utilities shared across all test modules
//!
//! This module provides builders for synthetic Klipper stats lines, temporary
//! log files and float assertions.

#![allow(dead_code)]

use std::io::Write;
use tempfile::NamedTempFile;

/// Builder for one `Stats` line
#[derive(Clone, Debug)]
pub struct StatsLine {
    marker: &'static str,
    time: f64,
    tokens: Vec<String>,
}

impl StatsLine {
    pub fn new(time: f64) -> Self {
        Self {
            marker: "Stats",
            time,
            tokens: Vec::new(),
        }
    }

    /// Use the python logging form of the marker
    pub fn with_info_marker(mut self) -> Self {
        self.marker = "INFO:root:Stats";
        self
    }

    /// Start a new `name:` scope
    pub fn section(mut self, name: &str) -> Self {
        self.tokens.push(format!("{}:", name));
        self
    }

    /// Add `key=value` to the current scope
    pub fn field(mut self, key: &str, value: impl ToString) -> Self {
        self.tokens.push(format!("{}={}", key, value.to_string()));
        self
    }

    pub fn render(&self) -> String {
        let mut out = format!("{} {:.1}:", self.marker, self.time);
        for token in &self.tokens {
            out.push(' ');
            out.push_str(token);
        }
        out
    }
}

/// Primary controller stats line carrying the fields every builder reads
pub fn mcu_line(time: f64, bytes_write: u64, buffer_time: f64, print_stall: i64) -> String {
    StatsLine::new(time)
        .field("gcodein", 0)
        .section("mcu")
        .field("mcu_awake", 0.005)
        .field("mcu_task_avg", 0.00001)
        .field("mcu_task_stddev", 0.00001)
        .field("bytes_write", bytes_write)
        .field("bytes_read", 2000)
        .field("bytes_retransmit", 0)
        .field("freq", 50_000_000)
        .field("adj", 50_000_000)
        .field("print_time", format!("{:.1}", time))
        .field("buffer_time", buffer_time)
        .field("print_stall", print_stall)
        .field("sysload", 0.1)
        .field("cputime", format!("{:.1}", time / 10.0))
        .field("memavail", 100000)
        .render()
}

/// Join lines into a log body, interleaving ordinary log chatter
pub fn log_text(lines: &[String]) -> String {
    let mut out = String::from("Starting Klippy...\nArgs: ['klippy.py']\n");
    for line in lines {
        out.push_str(line);
        out.push('\n');
        out.push_str("Receive: 55 0.1 0.1 11: seq: 1b, identify_response offset=0\n");
    }
    out
}

/// Write `contents` to a fresh temporary file
pub fn temp_log(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents).expect("Failed to write temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

/// Float assertions
pub mod assertions {
    pub const EPSILON: f64 = 1e-9;

    pub fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON,
            "expected {} got {}",
            expected,
            actual
        );
    }

    pub fn assert_all_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(
            actual.len(),
            expected.len(),
            "length mismatch: {:?} vs {:?}",
            actual,
            expected
        );
        for (a, e) in actual.iter().zip(expected) {
            assert_close(*a, *e);
        }
    }
}
