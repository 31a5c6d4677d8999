//! Sample assembly: resolves prefix-qualified keys and enforces the
//! `print_time` requirement.

use std::collections::HashMap;

use super::tokenizer::{RawRecord, Token};
use super::types::{Sample, StatKey};

/// Default name of the primary micro-controller
pub const DEFAULT_MCU: &str = "mcu";

/// Turns raw records into samples
#[derive(Clone, Debug)]
pub struct SampleAssembler {
    /// Prefix token that selects the primary controller scope, e.g. `mcu:`
    mcu_prefix: String,
}

impl Default for SampleAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MCU)
    }
}

impl SampleAssembler {
    pub fn new(mcu: &str) -> Self {
        Self {
            mcu_prefix: format!("{}:", mcu),
        }
    }

    /// Build a sample from a raw record.
    /// Returns `None` when the record carries no `print_time` or its timestamp
    /// is not a number.
    pub fn assemble(&self, record: &RawRecord<'_>) -> Option<Sample> {
        let mut prefix = "";
        let mut fields: HashMap<String, String> = HashMap::with_capacity(record.tail.len());

        for token in &record.tail {
            match *token {
                Token::Prefix(p) => {
                    prefix = if p == self.mcu_prefix { "" } else { p };
                }
                Token::Pair { key, value } => {
                    let name = match StatKey::from_name(key) {
                        Some(stat) if stat.is_prefixed() => format!("{}{}", prefix, key),
                        _ => key.to_string(),
                    };
                    fields.insert(name, value.to_string());
                }
            }
        }

        if !fields.contains_key(StatKey::PrintTime.name()) {
            return None;
        }

        Some(Sample::new(record.sample_time()?, fields))
    }
}
