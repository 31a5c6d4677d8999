use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use strum::{AsRefStr, EnumIter, EnumString, IntoStaticStr};

/// Well-known stats keys emitted by the Klipper host
#[derive(
    AsRefStr, Clone, Copy, Debug, EnumIter, EnumString, IntoStaticStr, PartialEq, Eq, Hash, Serialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum StatKey {
    PrintTime,
    BufferTime,
    PrintStall,
    McuAwake,
    McuTaskAvg,
    McuTaskStddev,
    BytesWrite,
    BytesRead,
    BytesRetransmit,
    Freq,
    Adj,
    Target,
    Temp,
    Pwm,
    Cputime,
    Sysload,
    Memavail,
}

impl StatKey {
    /// Key name as it appears in the log
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Keys that several subsystems report under the same bare name.
    /// These get qualified with the current prefix context while parsing.
    pub fn is_prefixed(&self) -> bool {
        matches!(
            self,
            StatKey::McuAwake
                | StatKey::McuTaskAvg
                | StatKey::McuTaskStddev
                | StatKey::BytesWrite
                | StatKey::BytesRead
                | StatKey::BytesRetransmit
                | StatKey::Freq
                | StatKey::Adj
                | StatKey::Target
                | StatKey::Temp
                | StatKey::Pwm
        )
    }

    /// Look up a raw key name, returning `Some` only for well-known keys
    pub fn from_name(name: &str) -> Option<Self> {
        StatKey::from_str(name).ok()
    }

    /// Full key for this stat within a prefix scope ("" for the primary controller)
    pub fn scoped(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.name())
    }
}

/// One accepted stats line
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sample {
    /// Host timestamp of the line, in seconds
    pub sample_time: f64,
    /// All `key=value` tokens, keys possibly prefix-qualified
    pub fields: HashMap<String, String>,
}

impl Sample {
    pub fn new(sample_time: f64, fields: HashMap<String, String>) -> Self {
        Self {
            sample_time,
            fields,
        }
    }

    /// Raw value of an unprefixed well-known key
    pub fn value(&self, key: StatKey) -> Option<&str> {
        self.raw(key.name())
    }

    /// Numeric value of an unprefixed well-known key; `None` if missing or not a number
    pub fn float(&self, key: StatKey) -> Option<f64> {
        self.value(key).and_then(parse_float)
    }

    /// Numeric value of a well-known key within a prefix scope
    pub fn scoped_float(&self, prefix: &str, key: StatKey) -> Option<f64> {
        self.raw(&key.scoped(prefix)).and_then(parse_float)
    }

    /// Integer value of an unprefixed well-known key
    pub fn int(&self, key: StatKey) -> Option<i64> {
        self.value(key).and_then(|v| v.trim().parse::<i64>().ok())
    }

    /// Raw value of any key, including controller-prefixed ones
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Host print time reported by this line
    pub fn print_time(&self) -> Option<f64> {
        self.float(StatKey::PrintTime)
    }
}

fn parse_float(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

/// Parsed log: accepted samples in file order
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ParsedLog {
    pub samples: Vec<Sample>,
}

impl ParsedLog {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// First sample, which supplies baselines for the derived series
    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Sample times in file order
    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.sample_time).collect()
    }

    /// Every distinct field key seen anywhere in the log
    pub fn all_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .samples
            .iter()
            .flat_map(|s| s.fields.keys().map(String::as_str))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }
}

impl<'a> IntoIterator for &'a ParsedLog {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Trait for log parsers
pub trait Parseable {
    fn parse(&self, data: &str) -> ParsedLog;
}
