//! Heater temperature, target and pwm series.

use super::*;
use crate::settings::split_heaters;

/// Temperature builder for a list of heaters
#[derive(Clone, Debug)]
pub struct TemperatureBuilder {
    /// Heater names, e.g. `heater_bed`, `extruder`
    pub heaters: Vec<String>,
}

impl Default for TemperatureBuilder {
    fn default() -> Self {
        Self::new("heater_bed,extruder")
    }
}

impl TemperatureBuilder {
    /// Create a builder from a comma separated heater list
    pub fn new(heaters: &str) -> Self {
        Self {
            heaters: split_heaters(heaters),
        }
    }

    /// Series for one heater: temperature always, target and pwm only when
    /// they carry a non-zero value
    fn heater_series(&self, log: &ParsedLog, heater: &str) -> Vec<DerivedSeries> {
        let prefix = format!("{}:", heater);
        let mut temps = DerivedSeries::new(format!("{} temp", heater), "°C");
        let mut targets = DerivedSeries::new(format!("{} target", heater), "°C");
        let mut pwm = DerivedSeries::new(format!("{} pwm", heater), "").on_secondary_axis();

        for sample in log {
            let (Some(temp), Some(time)) = (
                sample.scoped_float(&prefix, StatKey::Temp),
                sample_timestamp(sample.sample_time),
            ) else {
                continue;
            };
            temps.push(time, temp);
            targets.push(
                time,
                sample.scoped_float(&prefix, StatKey::Target).unwrap_or(0.0),
            );
            pwm.push(time, sample.scoped_float(&prefix, StatKey::Pwm).unwrap_or(0.0));
        }

        if temps.is_empty() {
            tracing::debug!("No temperature readings for heater {}", heater);
        }

        let mut series = vec![temps];
        if targets.has_nonzero() {
            series.push(targets);
        }
        if pwm.has_nonzero() {
            series.push(pwm);
        }
        series
    }
}

impl SeriesBuilder for TemperatureBuilder {
    fn id(&self) -> &str {
        "temperature"
    }

    fn name(&self) -> &str {
        "Heater temperature"
    }

    fn category(&self) -> Category {
        Category::Heater
    }

    fn build(&self, log: &ParsedLog, _ctx: &BuildContext) -> Result<SeriesGroup, AnalysisError> {
        let mut group = SeriesGroup::new(
            Category::Heater,
            format!("Temperature of {}", self.heaters.join(",")),
            "Temperature",
        )
        .with_secondary_axis("pwm");

        if log.is_empty() {
            return Ok(group);
        }

        let (series, computation_time) = timed_build(|| {
            self.heaters
                .iter()
                .flat_map(|h| self.heater_series(log, h))
                .collect::<Vec<_>>()
        });

        group.series = series;
        group.metadata = SeriesMetadata {
            parameters: vec![("heaters".to_string(), self.heaters.join(","))],
            warnings: vec![],
            computation_time_ms: computation_time,
        };
        Ok(group)
    }

    fn clone_box(&self) -> Box<dyn SeriesBuilder> {
        Box::new(self.clone())
    }
}
