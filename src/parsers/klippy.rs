use memmap2::Mmap;
use rayon::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::assembler::{SampleAssembler, DEFAULT_MCU};
use super::tokenizer::tokenize_line;
use super::types::{ParsedLog, Parseable, Sample};

/// Errors that can occur while loading a log file
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be opened or mapped
    #[error("Failed to read log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid UTF-8 text
    #[error("Log file {path} is not valid UTF-8 (first bad byte at offset {offset})")]
    InvalidUtf8 { path: PathBuf, offset: usize },
}

/// Klipper host log parser
#[derive(Clone, Debug)]
pub struct KlippyLog {
    assembler: SampleAssembler,
}

impl Default for KlippyLog {
    fn default() -> Self {
        Self::new(DEFAULT_MCU)
    }
}

impl KlippyLog {
    /// Create a parser that treats `mcu` as the primary controller
    pub fn new(mcu: &str) -> Self {
        Self {
            assembler: SampleAssembler::new(mcu),
        }
    }

    /// Parse a single line
    pub fn parse_line(&self, line: &str) -> Option<Sample> {
        self.assembler.assemble(&tokenize_line(line)?)
    }

    /// Parse lines one after another on the calling thread
    pub fn parse_sequential(&self, data: &str) -> ParsedLog {
        ParsedLog::new(data.lines().filter_map(|l| self.parse_line(l)).collect())
    }

    /// Load and parse a log file from disk
    pub fn load_file(&self, path: &Path) -> Result<ParsedLog, LoadError> {
        let io_err = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let len = file.metadata().map_err(io_err)?.len();
        if len == 0 {
            tracing::info!("Log file {:?} is empty", path);
            return Ok(ParsedLog::default());
        }

        // SAFETY: the mapping is read-only and dropped before returning. The log
        // is not expected to be truncated by another process while it is parsed.
        let mmap = unsafe { Mmap::map(&file) }.map_err(io_err)?;

        let text = std::str::from_utf8(&mmap).map_err(|e| LoadError::InvalidUtf8 {
            path: path.to_path_buf(),
            offset: e.valid_up_to(),
        })?;

        let log = self.parse(text);
        tracing::info!(
            "Loaded {:?}: {} stats samples from {} bytes",
            path,
            log.len(),
            len
        );
        Ok(log)
    }
}

impl Parseable for KlippyLog {
    fn parse(&self, data: &str) -> ParsedLog {
        // Lines carry no state across each other, so they can be assembled in
        // parallel and collected back in file order
        let lines: Vec<&str> = data.lines().collect();
        let samples: Vec<Sample> = lines
            .par_iter()
            .filter_map(|line| self.parse_line(line))
            .collect();

        tracing::debug!(
            "Parsed klippy log: {} stats samples from {} lines",
            samples.len(),
            lines.len()
        );

        ParsedLog::new(samples)
    }
}
