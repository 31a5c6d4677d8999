pub mod assembler;
pub mod klippy;
pub mod tokenizer;
pub mod types;

pub use assembler::{SampleAssembler, DEFAULT_MCU};
pub use klippy::{KlippyLog, LoadError};
pub use types::{Parseable, ParsedLog, Sample, StatKey};
