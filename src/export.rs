//! Hand-off of derived series to whatever draws them.
//!
//! The export configuration is an immutable value passed in by the caller;
//! nothing here reads or changes process-wide state.

use clap::ValueEnum;
use serde::Serialize;
use std::io::Write;
use thiserror::Error;

use crate::analysis::{DerivedSeries, SeriesGroup};

/// Errors that can occur while writing an export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize export: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output format for derived series
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Full series as a JSON document
    #[default]
    Json,
    /// One line per series with point count and value range
    Summary,
}

/// How series are written out
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportConfig {
    pub format: ExportFormat,
    /// Indent JSON output
    pub pretty: bool,
    /// Name of the source log, recorded in the document
    pub source: Option<String>,
}

/// Top-level JSON document
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub source: Option<&'a str>,
    pub samples: usize,
    pub groups: &'a [SeriesGroup],
}

/// Value range of a series
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeriesSummary {
    pub points: usize,
    pub min: f64,
    pub max: f64,
    pub last: f64,
}

impl SeriesSummary {
    pub fn of(series: &DerivedSeries) -> Option<Self> {
        let last = series.points.last()?.value;
        let (min, max) = series
            .points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.value), hi.max(p.value))
            });
        Some(Self {
            points: series.len(),
            min,
            max,
            last,
        })
    }
}

/// Write `groups` to `out` according to `config`
pub fn export_groups<W: Write>(
    config: &ExportConfig,
    samples: usize,
    groups: &[SeriesGroup],
    out: &mut W,
) -> Result<(), ExportError> {
    match config.format {
        ExportFormat::Json => {
            let report = Report {
                source: config.source.as_deref(),
                samples,
                groups,
            };
            if config.pretty {
                serde_json::to_writer_pretty(&mut *out, &report)?;
            } else {
                serde_json::to_writer(&mut *out, &report)?;
            }
            writeln!(out)?;
        }
        ExportFormat::Summary => write_summary(config, samples, groups, out)?,
    }
    Ok(())
}

fn write_summary<W: Write>(
    config: &ExportConfig,
    samples: usize,
    groups: &[SeriesGroup],
    out: &mut W,
) -> std::io::Result<()> {
    if let Some(source) = &config.source {
        writeln!(out, "{}: {} stats samples", source, samples)?;
    } else {
        writeln!(out, "{} stats samples", samples)?;
    }

    for group in groups {
        writeln!(out, "[{}] {}", group.category.as_ref(), group.title)?;
        if group.is_empty() {
            writeln!(out, "  no data")?;
            continue;
        }
        for series in &group.series {
            match SeriesSummary::of(series) {
                Some(s) => writeln!(
                    out,
                    "  {} ({}): {} points, min {:.2}, max {:.2}, last {:.2}",
                    series.name, series.unit, s.points, s.min, s.max, s.last
                )?,
                None => writeln!(out, "  {} ({}): no points", series.name, series.unit)?,
            }
        }
        for warning in &group.metadata.warnings {
            writeln!(out, "  warning: {}", warning)?;
        }
    }
    Ok(())
}
