//! klipstats - Klipper host log statistics
//!
//! This library parses the periodic `Stats` lines a Klipper host writes to
//! its log and derives the time series behind the usual diagnostic charts:
//! controller bandwidth and load, host buffer health, clock drift, host
//! system load and heater behaviour.
//!
//! ## Module Structure
//!
//! - [`parsers`] - Line tokenizer, sample assembly and log loading
//! - [`analysis`] - Restart detection and the per-chart series builders
//! - [`settings`] - Analysis constants and their persistence
//! - [`export`] - JSON and text output of derived series
//! - [`cli`] - Command line arguments

pub mod analysis;
pub mod cli;
pub mod export;
pub mod parsers;
pub mod settings;
