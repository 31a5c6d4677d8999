//! Controller clock frequency series.
//!
//! The host reports each controller's estimated clock (`freq`) and the
//! adjusted clock (`adj`). Values of exactly "0" or "1" mean the estimate is
//! not ready yet and are ignored.

use std::collections::BTreeMap;

use super::*;

/// Raw values that mean "not sampled yet"
pub const UNSET_SENTINELS: [&str; 2] = ["0", "1"];

const CLOCK_KEYS: [StatKey; 2] = [StatKey::Freq, StatKey::Adj];

/// True for `freq`, `adj` and their controller-prefixed variants
pub fn is_clock_key(key: &str) -> bool {
    CLOCK_KEYS.iter().any(|k| {
        let name = k.name();
        key == name
            || key
                .strip_suffix(name)
                .is_some_and(|prefix| prefix.ends_with(':'))
    })
}

/// Parse a clock value, rejecting the unset sentinels
fn clock_value(raw: &str) -> Option<f64> {
    if UNSET_SENTINELS.contains(&raw) {
        return None;
    }
    raw.parse::<f64>().ok()
}

/// Collect `(time, value)` pairs for each selected key, keys sorted
fn collect_clock_points(
    log: &ParsedLog,
    keys: &[&str],
) -> BTreeMap<String, Vec<(DateTime<Utc>, f64)>> {
    let mut points: BTreeMap<String, Vec<(DateTime<Utc>, f64)>> = keys
        .iter()
        .map(|k| (k.to_string(), Vec::new()))
        .collect();

    for sample in log {
        let Some(time) = sample_timestamp(sample.sample_time) else {
            continue;
        };
        for (key, values) in points.iter_mut() {
            if let Some(value) = sample.raw(key).and_then(clock_value) {
                values.push((time, value));
            }
        }
    }

    points
}

/// Nominal clock in whole MHz estimated from the mean of the readings.
/// Halves round to the even MHz.
pub fn estimate_mhz(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some((mean / 1_000_000.0).round_ties_even())
}

/// Clock deviation from nominal, in microseconds per second, for every controller
#[derive(Clone, Copy, Debug, Default)]
pub struct FrequencyDeviationBuilder;

impl SeriesBuilder for FrequencyDeviationBuilder {
    fn id(&self) -> &str {
        "mcu_frequency_deviation"
    }

    fn name(&self) -> &str {
        "MCU frequencies"
    }

    fn category(&self) -> Category {
        Category::McuFreq
    }

    fn build(&self, log: &ParsedLog, _ctx: &BuildContext) -> Result<SeriesGroup, AnalysisError> {
        let mut group = SeriesGroup::new(Category::McuFreq, "MCU frequencies", "Microsecond deviation");

        let ((series, warnings), computation_time) = timed_build(|| {
            let keys: Vec<&str> = log
                .all_keys()
                .into_iter()
                .filter(|k| is_clock_key(k))
                .collect();

            let mut series = Vec::new();
            let mut warnings = Vec::new();

            for (key, points) in collect_clock_points(log, &keys) {
                let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
                let mhz = match estimate_mhz(&values) {
                    Some(mhz) if mhz > 0.0 => mhz,
                    Some(_) => {
                        tracing::warn!("Clock {} averages below 1 MHz, skipping", key);
                        warnings.push(format!("{}: nominal frequency rounds to 0 MHz", key));
                        continue;
                    }
                    None => {
                        warnings.push(format!("{}: no sampled values", key));
                        continue;
                    }
                };

                let hz = mhz * 1_000_000.0;
                let mut deviation = DerivedSeries::new(format!("{}({}Mhz)", key, mhz as i64), "us/s");
                for (time, value) in points {
                    deviation.push(time, (value - hz) / mhz);
                }
                series.push(deviation);
            }

            (series, warnings)
        });

        group.series = series;
        group.metadata = SeriesMetadata {
            parameters: vec![("clocks".to_string(), group.series.len().to_string())],
            warnings,
            computation_time_ms: computation_time,
        };
        Ok(group)
    }

    fn clone_box(&self) -> Box<dyn SeriesBuilder> {
        Box::new(*self)
    }
}

/// Raw `freq` and `adj` readings of the primary controller
#[derive(Clone, Debug)]
pub struct McuFrequencyBuilder {
    /// Controller name, used for the chart title
    pub mcu: String,
}

impl Default for McuFrequencyBuilder {
    fn default() -> Self {
        Self::new(crate::parsers::DEFAULT_MCU)
    }
}

impl McuFrequencyBuilder {
    pub fn new(mcu: &str) -> Self {
        Self {
            mcu: mcu.to_string(),
        }
    }
}

impl SeriesBuilder for McuFrequencyBuilder {
    fn id(&self) -> &str {
        "mcu_frequency"
    }

    fn name(&self) -> &str {
        "MCU frequency"
    }

    fn category(&self) -> Category {
        Category::McuFrequency
    }

    fn build(&self, log: &ParsedLog, _ctx: &BuildContext) -> Result<SeriesGroup, AnalysisError> {
        let mut group = SeriesGroup::new(
            Category::McuFrequency,
            format!("MCU '{}' frequency", self.mcu),
            "Frequency",
        );

        let present: Vec<&str> = log
            .all_keys()
            .into_iter()
            .filter(|k| CLOCK_KEYS.iter().any(|c| c.name() == *k))
            .collect();

        let (series, computation_time) = timed_build(|| {
            collect_clock_points(log, &present)
                .into_iter()
                .map(|(key, points)| {
                    let mut s = DerivedSeries::new(key, "Hz");
                    for (time, value) in points {
                        s.push(time, value);
                    }
                    s
                })
                .collect::<Vec<_>>()
        });

        group.series = series;
        group.metadata.computation_time_ms = computation_time;
        Ok(group)
    }

    fn clone_box(&self) -> Box<dyn SeriesBuilder> {
        Box::new(self.clone())
    }
}
