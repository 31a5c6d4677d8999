//! Print restart detection.
//!
//! The scan walks the log from the latest sample to the earliest and groups
//! low-buffer samples into "runoffs". While a runoff is open, a sample whose
//! `print_stall` counter is lower than the one of the sample visited just
//! before it (the chronologically later one) marks the runoff as confirmed.
//!
//! Runoffs that were never confirmed are returned as the exclusion set: the
//! bandwidth builder reports their host buffer health as 0 instead of the
//! measured value. Confirmed runoffs keep their measured value.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::parsers::types::{ParsedLog, StatKey};

/// Maximum gap between consecutive samples of one runoff, in seconds
pub const RUNOFF_MAX_GAP: f64 = 5.0;

/// Buffer time below which a sample starts a new runoff, in seconds
pub const LOW_BUFFER_TIME: f64 = 1.0;

/// One low-buffer run found by the scan
#[derive(Clone, Debug, PartialEq)]
pub struct RunoffRun {
    /// Sample time the run was rooted at (its latest sample). Reopening a
    /// run at the same time replaces it.
    pub start: f64,
    /// Set when the stall counter dropped (in scan order) while the run was open
    pub confirmed: bool,
    /// Member sample times, latest first
    pub members: Vec<f64>,
}

/// Sample times whose host buffer health is reset to 0
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RestartExclusionSet {
    times: HashSet<u64>,
}

impl RestartExclusionSet {
    pub fn contains(&self, sample_time: f64) -> bool {
        self.times.contains(&sample_time.to_bits())
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    fn insert(&mut self, sample_time: f64) {
        self.times.insert(sample_time.to_bits());
    }
}

impl FromIterator<f64> for RestartExclusionSet {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut set = Self::default();
        for t in iter {
            set.insert(t);
        }
        set
    }
}

/// Result of a backward scan
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RestartScan {
    /// Runs in discovery order (latest run first)
    pub runs: Vec<RunoffRun>,
}

impl RestartScan {
    /// Runs attributed to a print restart
    pub fn confirmed(&self) -> impl Iterator<Item = &RunoffRun> {
        self.runs.iter().filter(|r| r.confirmed)
    }

    /// Runs that never saw a stall counter drop
    pub fn unconfirmed(&self) -> impl Iterator<Item = &RunoffRun> {
        self.runs.iter().filter(|r| !r.confirmed)
    }

    /// Member times of every unconfirmed run
    pub fn exclusion_set(&self) -> RestartExclusionSet {
        self.unconfirmed()
            .flat_map(|r| r.members.iter().copied())
            .collect()
    }
}

/// Backward-scan state
#[derive(Debug, Default)]
struct ScanState {
    /// Index into `runs` of the currently open run
    open: Option<usize>,
    last_buffer_time: f64,
    last_sample_time: f64,
    last_print_stall: i64,
    runs: Vec<RunoffRun>,
    /// Run index by `start.to_bits()`
    by_start: HashMap<u64, usize>,
}

impl ScanState {
    fn track_runoff(&mut self, sample_time: f64, buffer_time: f64) {
        let open = self.open;
        let extends_open = open.is_some()
            && self.last_sample_time - sample_time < RUNOFF_MAX_GAP
            && buffer_time > self.last_buffer_time;

        match open {
            Some(idx) if extends_open => self.runs[idx].members.push(sample_time),
            _ if buffer_time < LOW_BUFFER_TIME => self.open_run(sample_time),
            _ => self.open = None,
        }
    }

    /// Open a run rooted at `start`, discarding any earlier run with the same root
    fn open_run(&mut self, start: f64) {
        let run = RunoffRun {
            start,
            confirmed: false,
            members: vec![start],
        };
        let idx = match self.by_start.entry(start.to_bits()) {
            Entry::Occupied(entry) => {
                let idx = *entry.get();
                tracing::trace!("Runoff at {} reopened, dropping its earlier members", start);
                self.runs[idx] = run;
                idx
            }
            Entry::Vacant(entry) => {
                self.runs.push(run);
                *entry.insert(self.runs.len() - 1)
            }
        };
        self.open = Some(idx);
    }

    fn track_stall(&mut self, print_stall: i64) {
        if print_stall < self.last_print_stall {
            if let Some(idx) = self.open {
                self.runs[idx].confirmed = true;
            }
        }
        self.last_print_stall = print_stall;
    }
}

/// Detects print restarts by scanning a log backwards
#[derive(Clone, Copy, Debug, Default)]
pub struct RestartDetector;

impl RestartDetector {
    pub fn new() -> Self {
        Self
    }

    /// Run the backward scan and return every runoff found
    pub fn scan(&self, log: &ParsedLog) -> RestartScan {
        let mut state = ScanState::default();
        let samples = &log.samples;

        let mut idx = samples.len();
        while idx > 0 {
            idx -= 1;
            let sample = &samples[idx];
            let buffer_time = sample.float(StatKey::BufferTime).unwrap_or(0.0);

            state.track_runoff(sample.sample_time, buffer_time);
            state.last_buffer_time = buffer_time;
            state.last_sample_time = sample.sample_time;

            match sample.int(StatKey::PrintStall) {
                Some(stall) => state.track_stall(stall),
                None => tracing::trace!(
                    "Sample at {} has no print_stall counter",
                    sample.sample_time
                ),
            }
        }

        let confirmed = state.runs.iter().filter(|r| r.confirmed).count();
        tracing::debug!(
            "Restart scan: {} runoffs, {} confirmed restarts",
            state.runs.len(),
            confirmed
        );

        RestartScan { runs: state.runs }
    }

    /// Sample times whose host buffer health is reported as 0
    pub fn exclusion_set(&self, log: &ParsedLog) -> RestartExclusionSet {
        self.scan(log).exclusion_set()
    }
}
