//! Line tokenizer for Klipper host stats lines.
//!
//! A stats line looks like:
//!
//! ```text
//! Stats 1234.5: gcodein=0 mcu: mcu_awake=0.003 ... print_time=12.1 buffer_time=1.2 print_stall=0
//! ```
//!
//! Only the shape of the line is checked here; key handling lives in the
//! assembler.

use regex::Regex;
use std::sync::LazyLock;

/// Markers that introduce a stats line
pub const STATS_MARKERS: [&str; 2] = ["Stats", "INFO:root:Stats"];

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<secs>\d+(?:\.\d+)?):$").expect("Failed to compile timestamp regex")
});

/// A stats line split into its timestamp and the remaining tokens
#[derive(Clone, Debug, PartialEq)]
pub struct RawRecord<'a> {
    /// Timestamp token with the trailing `:` already stripped
    pub timestamp: &'a str,
    /// Tokens after the timestamp, in line order
    pub tail: Vec<Token<'a>>,
}

impl RawRecord<'_> {
    /// Timestamp in seconds
    pub fn sample_time(&self) -> Option<f64> {
        self.timestamp.parse::<f64>().ok()
    }
}

/// A single tail token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    /// `key=value`, split on the first `=`
    Pair { key: &'a str, value: &'a str },
    /// Anything without `=`: a subsystem prefix such as `extruder:`
    Prefix(&'a str),
}

impl<'a> Token<'a> {
    pub fn classify(token: &'a str) -> Self {
        match token.split_once('=') {
            Some((key, value)) => Token::Pair { key, value },
            None => Token::Prefix(token),
        }
    }
}

/// Check whether a token is one of the recognized stats markers
pub fn is_stats_marker(token: &str) -> bool {
    STATS_MARKERS.contains(&token)
}

/// Split one line into a raw record, or reject it
pub fn tokenize_line(line: &str) -> Option<RawRecord<'_>> {
    let mut parts = line.split_whitespace();

    let marker = parts.next()?;
    if !is_stats_marker(marker) {
        return None;
    }

    let stamp = parts.next()?;
    let timestamp = TIMESTAMP_RE.captures(stamp)?.name("secs")?.as_str();

    Some(RawRecord {
        timestamp,
        tail: parts.map(Token::classify).collect(),
    })
}
