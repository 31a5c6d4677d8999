//! Host system load: process cpu time, system load average and free memory.

use super::*;

/// Process time is clamped to this many cores
const MAX_CPU_CORES: f64 = 1.5;

/// Host system load builder
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemLoadBuilder;

impl SeriesBuilder for SystemLoadBuilder {
    fn id(&self) -> &str {
        "system_load"
    }

    fn name(&self) -> &str {
        "System load utilization"
    }

    fn category(&self) -> Category {
        Category::System
    }

    fn build(&self, log: &ParsedLog, _ctx: &BuildContext) -> Result<SeriesGroup, AnalysisError> {
        let mut group = SeriesGroup::new(
            Category::System,
            "System load utilization",
            "Load (% of a core)",
        )
        .with_secondary_axis("Available memory (KB)");

        let Some(first) = log.first() else {
            return Ok(group);
        };

        let (series, computation_time) = timed_build(|| {
            let mut sysloads = DerivedSeries::new("system load", "%");
            let mut cputimes = DerivedSeries::new("process time", "%");
            let mut memavails = DerivedSeries::new("system memory", "KB").on_secondary_axis();

            let mut last_time = first.sample_time;
            let mut last_cputime = first.float(StatKey::Cputime);

            for sample in log {
                let st = sample.sample_time;
                let time_delta = st - last_time;
                if time_delta <= 0.0 {
                    continue;
                }

                let (Some(cputime), Some(sysload), Some(memavail), Some(time)) = (
                    sample.float(StatKey::Cputime),
                    sample.float(StatKey::Sysload),
                    sample.float(StatKey::Memavail),
                    sample_timestamp(st),
                ) else {
                    continue;
                };
                last_time = st;

                let Some(base_cputime) = last_cputime.replace(cputime) else {
                    continue;
                };

                let cpu = ((cputime - base_cputime) / time_delta).clamp(0.0, MAX_CPU_CORES);
                cputimes.push(time, 100.0 * cpu);
                sysloads.push(time, 100.0 * sysload);
                memavails.push(time, memavail);
            }

            vec![sysloads, cputimes, memavails]
        });

        group.series = series;
        group.metadata.computation_time_ms = computation_time;
        Ok(group)
    }

    fn clone_box(&self) -> Box<dyn SeriesBuilder> {
        Box::new(*self)
    }
}
