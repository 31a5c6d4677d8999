//! Controller bandwidth and load utilization.
//!
//! Produces four percentage series for the primary controller: serial
//! bandwidth, scheduler load, host buffer health and awake time.

use super::*;
use crate::parsers::types::Sample;

/// Bandwidth and load builder for the primary controller
#[derive(Clone, Debug)]
pub struct McuBandwidthBuilder {
    /// Serial bandwidth of the controller link, bytes per second
    pub max_bandwidth: f64,
    /// Host buffer length considered full, seconds
    pub max_buffer: f64,
    /// Scheduler task time considered 100% load, seconds
    pub task_max: f64,
    /// Interval between stats lines, seconds
    pub stats_interval: f64,
    /// Scheduler load is forced to 0 for this long after the first sample
    pub warmup_secs: f64,
}

impl Default for McuBandwidthBuilder {
    fn default() -> Self {
        Self::from_settings(&AnalysisSettings::default())
    }
}

impl McuBandwidthBuilder {
    pub fn from_settings(settings: &AnalysisSettings) -> Self {
        Self {
            max_bandwidth: settings.max_bandwidth,
            max_buffer: settings.max_buffer,
            task_max: settings.task_max,
            stats_interval: settings.stats_interval,
            warmup_secs: settings.warmup_secs,
        }
    }

    /// Host buffer health in percent; 0 when the buffer is full or the
    /// sample belongs to an excluded runoff
    pub fn host_buffer_health(&self, buffer_time: f64, excluded: bool) -> f64 {
        if buffer_time >= self.max_buffer || excluded {
            0.0
        } else {
            100.0 * (self.max_buffer - buffer_time) / self.max_buffer
        }
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        require_positive("max_bandwidth", self.max_bandwidth)?;
        require_positive("max_buffer", self.max_buffer)?;
        require_positive("task_max", self.task_max)?;
        require_positive("stats_interval", self.stats_interval)
    }
}

/// Cumulative bytes sent to the controller, including retransmits
fn bytes_sent(sample: &Sample) -> Option<f64> {
    Some(sample.float(StatKey::BytesWrite)? + sample.float(StatKey::BytesRetransmit)?)
}

impl SeriesBuilder for McuBandwidthBuilder {
    fn id(&self) -> &str {
        "mcu_bandwidth"
    }

    fn name(&self) -> &str {
        "MCU bandwidth and load"
    }

    fn category(&self) -> Category {
        Category::Mcu
    }

    fn build(&self, log: &ParsedLog, ctx: &BuildContext) -> Result<SeriesGroup, AnalysisError> {
        self.validate()?;

        let mut group = SeriesGroup::new(
            Category::Mcu,
            "MCU bandwidth and load utilization",
            "Usage (%)",
        );
        let Some(first) = log.first() else {
            return Ok(group);
        };

        let ((series, resets, skipped), computation_time) = timed_build(|| {
            let mut bandwidth = DerivedSeries::new("Bandwidth", "%");
            let mut load = DerivedSeries::new("MCU load", "%");
            let mut host_buffer = DerivedSeries::new("Host buffer", "%");
            let mut awake = DerivedSeries::new("Awake time", "%");

            let base_time = first.sample_time;
            let mut last_time = base_time;
            let mut last_bytes = bytes_sent(first);
            let mut resets = 0usize;
            let mut skipped = 0usize;

            for sample in log {
                let st = sample.sample_time;
                let time_delta = st - last_time;
                if time_delta <= 0.0 {
                    continue;
                }

                let Some(bytes) = bytes_sent(sample) else {
                    skipped += 1;
                    continue;
                };
                let Some(baseline) = last_bytes else {
                    // No usable counter before this sample
                    last_bytes = Some(bytes);
                    last_time = st;
                    continue;
                };
                if bytes < baseline {
                    // Counter reset: start over from here without a point
                    last_bytes = Some(bytes);
                    resets += 1;
                    continue;
                }

                let (Some(task_avg), Some(task_stddev), Some(buffer_time), Some(time)) = (
                    sample.float(StatKey::McuTaskAvg),
                    sample.float(StatKey::McuTaskStddev),
                    sample.float(StatKey::BufferTime),
                    sample_timestamp(st),
                ) else {
                    skipped += 1;
                    continue;
                };

                let task_load = if st - base_time < self.warmup_secs {
                    0.0
                } else {
                    task_avg + 3.0 * task_stddev
                };
                let awake_time = sample.float(StatKey::McuAwake).unwrap_or(0.0);

                bandwidth.push(
                    time,
                    100.0 * (bytes - baseline) / (self.max_bandwidth * time_delta),
                );
                load.push(time, 100.0 * task_load / self.task_max);
                host_buffer.push(
                    time,
                    self.host_buffer_health(buffer_time, ctx.exclusions.contains(st)),
                );
                awake.push(time, 100.0 * awake_time / self.stats_interval);

                last_time = st;
                last_bytes = Some(bytes);
            }

            (vec![bandwidth, load, host_buffer, awake], resets, skipped)
        });

        if skipped > 0 {
            tracing::debug!("MCU bandwidth: skipped {} incomplete samples", skipped);
        }

        group.series = series;
        group.metadata = SeriesMetadata {
            parameters: vec![
                (
                    "max_bandwidth".to_string(),
                    format!("{:.0}", self.max_bandwidth),
                ),
                ("max_buffer".to_string(), format!("{:.2}", self.max_buffer)),
                ("task_max".to_string(), format!("{}", self.task_max)),
                ("counter_resets".to_string(), resets.to_string()),
                (
                    "excluded_samples".to_string(),
                    ctx.exclusions.len().to_string(),
                ),
            ],
            warnings: if skipped > 0 {
                vec![format!("{} samples lacked controller stats", skipped)]
            } else {
                vec![]
            },
            computation_time_ms: computation_time,
        };
        Ok(group)
    }

    fn clone_box(&self) -> Box<dyn SeriesBuilder> {
        Box::new(self.clone())
    }
}
