//! Metric derivation for parsed Klipper logs.
//!
//! Each plot category is produced by a type implementing [`SeriesBuilder`].
//! Builders only read the [`ParsedLog`] and the restart exclusion set, so the
//! [`BuilderRegistry`] computes the exclusion set once and then runs every
//! builder in parallel.
//!
//! Builders never fail because of the log contents: samples missing a field a
//! builder needs are skipped by that builder, and an empty log produces empty
//! groups. Errors are reserved for invalid parameters.

pub mod bandwidth;
pub mod frequency;
pub mod restarts;
pub mod system;
pub mod temperature;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;
use strum::{AsRefStr, EnumIter, EnumString};
use thiserror::Error;

use crate::parsers::types::{ParsedLog, StatKey};
use crate::settings::AnalysisSettings;
use restarts::{RestartDetector, RestartExclusionSet};

/// Errors that can occur while deriving series
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalysisError {
    /// Invalid parameter configuration
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Plot category produced by a builder
#[derive(AsRefStr, Clone, Copy, Debug, EnumIter, EnumString, PartialEq, Eq, Hash, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Bandwidth, scheduler load, host buffer and awake time
    Mcu,
    /// Clock deviation from nominal for every controller
    McuFreq,
    /// Raw clock frequency of the primary controller
    McuFrequency,
    /// Host process time, system load and free memory
    System,
    /// Heater temperature, target and pwm
    Heater,
}

/// Which y axis a series is drawn against
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    #[default]
    Primary,
    Secondary,
}

/// One point of a derived series
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// A named, ordered `(timestamp, value)` series
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DerivedSeries {
    /// Legend label
    pub name: String,
    /// Unit for the values
    pub unit: String,
    pub axis: Axis,
    pub points: Vec<SeriesPoint>,
}

impl DerivedSeries {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            axis: Axis::Primary,
            points: Vec::new(),
        }
    }

    /// Draw this series against the secondary axis
    pub fn on_secondary_axis(mut self) -> Self {
        self.axis = Axis::Secondary;
        self
    }

    pub fn push(&mut self, time: DateTime<Utc>, value: f64) {
        self.points.push(SeriesPoint { time, value });
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True if at least one value is non-zero
    pub fn has_nonzero(&self) -> bool {
        self.points.iter().any(|p| p.value != 0.0)
    }
}

/// Metadata about a derivation run
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SeriesMetadata {
    /// Key parameters and their values
    pub parameters: Vec<(String, String)>,
    /// Notes about skipped data
    pub warnings: Vec<String>,
    /// Time taken for computation in milliseconds
    pub computation_time_ms: u64,
}

/// All series of one plot category
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeriesGroup {
    pub category: Category,
    /// Chart title
    pub title: String,
    /// Label of the primary y axis
    pub y_label: String,
    /// Label of the secondary y axis, if the chart has one
    pub y2_label: Option<String>,
    pub series: Vec<DerivedSeries>,
    pub metadata: SeriesMetadata,
}

impl SeriesGroup {
    pub fn new(category: Category, title: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            category,
            title: title.into(),
            y_label: y_label.into(),
            y2_label: None,
            series: Vec::new(),
            metadata: SeriesMetadata::default(),
        }
    }

    pub fn with_secondary_axis(mut self, label: impl Into<String>) -> Self {
        self.y2_label = Some(label.into());
        self
    }

    /// True when no series carries any point
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(DerivedSeries::is_empty)
    }

    /// Find a series by legend label
    pub fn find(&self, name: &str) -> Option<&DerivedSeries> {
        self.series.iter().find(|s| s.name == name)
    }
}

/// Shared inputs computed once before builders fan out
#[derive(Clone, Debug, Default)]
pub struct BuildContext {
    pub exclusions: RestartExclusionSet,
}

impl BuildContext {
    pub fn for_log(log: &ParsedLog) -> Self {
        Self {
            exclusions: RestartDetector::new().exclusion_set(log),
        }
    }
}

/// Core trait for all series builders
pub trait SeriesBuilder: Send + Sync {
    /// Unique identifier for this builder
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    fn category(&self) -> Category;

    /// Derive the series for this category
    fn build(&self, log: &ParsedLog, ctx: &BuildContext) -> Result<SeriesGroup, AnalysisError>;

    /// Clone into a boxed trait object
    fn clone_box(&self) -> Box<dyn SeriesBuilder>;
}

impl Clone for Box<dyn SeriesBuilder> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Registry of series builders
#[derive(Default, Clone)]
pub struct BuilderRegistry {
    builders: Vec<Box<dyn SeriesBuilder>>,
}

impl BuilderRegistry {
    /// Create a registry with the default builders configured from `settings`
    pub fn new(settings: &AnalysisSettings) -> Self {
        let mut registry = Self::default();
        registry.register(Box::new(bandwidth::McuBandwidthBuilder::from_settings(
            settings,
        )));
        registry.register(Box::new(frequency::FrequencyDeviationBuilder));
        registry.register(Box::new(frequency::McuFrequencyBuilder::new(&settings.mcu)));
        registry.register(Box::new(system::SystemLoadBuilder));
        registry.register(Box::new(temperature::TemperatureBuilder::new(
            &settings.heaters,
        )));
        registry
    }

    /// Register a new builder
    pub fn register(&mut self, builder: Box<dyn SeriesBuilder>) {
        self.builders.push(builder);
    }

    /// Get all registered builders
    pub fn all(&self) -> &[Box<dyn SeriesBuilder>] {
        &self.builders
    }

    /// Run every builder over `log`, in registration order
    pub fn build_all(&self, log: &ParsedLog) -> Result<Vec<SeriesGroup>, AnalysisError> {
        let ctx = BuildContext::for_log(log);
        tracing::debug!(
            "Running {} builders over {} samples ({} excluded buffer samples)",
            self.builders.len(),
            log.len(),
            ctx.exclusions.len()
        );

        self.builders
            .par_iter()
            .map(|b| -> Result<SeriesGroup, AnalysisError> {
                let group = b.build(log, &ctx)?;
                tracing::debug!(
                    "{} ({}): {} series in {} ms",
                    b.name(),
                    b.id(),
                    group.series.len(),
                    group.metadata.computation_time_ms
                );
                Ok(group)
            })
            .collect()
    }
}

/// Helper function to measure builder execution time
pub fn timed_build<F, T>(f: F) -> (T, u64)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed().as_millis() as u64;
    (result, elapsed)
}

/// Convert a sample time (seconds since the Unix epoch) into a UTC timestamp
pub fn sample_timestamp(sample_time: f64) -> Option<DateTime<Utc>> {
    if !sample_time.is_finite() {
        return None;
    }
    DateTime::from_timestamp_micros((sample_time * 1_000_000.0).round() as i64)
}

/// Helper to reject non-positive constants
pub fn require_positive(name: &str, value: f64) -> Result<(), AnalysisError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(AnalysisError::InvalidParameter(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}
