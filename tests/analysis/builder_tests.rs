//! Series builders against hand-computed values

use crate::common::assertions::*;
use crate::common::{log_text, mcu_line, StatsLine};
use klipstats::analysis::bandwidth::McuBandwidthBuilder;
use klipstats::analysis::frequency::{FrequencyDeviationBuilder, McuFrequencyBuilder};
use klipstats::analysis::system::SystemLoadBuilder;
use klipstats::analysis::temperature::TemperatureBuilder;
use klipstats::analysis::{Axis, BuildContext, SeriesBuilder, SeriesGroup};
use klipstats::parsers::{KlippyLog, Parseable, ParsedLog};

/// Steady print: 2500 bytes every 5 seconds, buffer at 1.5 s
fn steady_log(samples: u64) -> ParsedLog {
    let lines: Vec<String> = (0..samples)
        .map(|i| mcu_line(i as f64 * 5.0, 10_000 + 2500 * i, 1.5, 0))
        .collect();
    KlippyLog::default().parse(&log_text(&lines))
}

fn build(builder: &dyn SeriesBuilder, log: &ParsedLog) -> SeriesGroup {
    builder
        .build(log, &BuildContext::for_log(log))
        .expect("builder should succeed")
}

// ============================================
// MCU Bandwidth
// ============================================

#[test]
fn test_bandwidth_steady_print() {
    let log = steady_log(6);
    let group = build(&McuBandwidthBuilder::default(), &log);

    // First sample only sets the baselines
    let bandwidth = group.find("Bandwidth").unwrap();
    assert_eq!(bandwidth.len(), 5);
    assert_all_close(&bandwidth.values(), &[2.0; 5]);

    assert_all_close(&group.find("Awake time").unwrap().values(), &[0.1; 5]);
    assert_all_close(&group.find("Host buffer").unwrap().values(), &[25.0; 5]);
}

#[test]
fn test_load_after_warmup() {
    let log = steady_log(6);
    let group = build(&McuBandwidthBuilder::default(), &log);

    // Samples at 5 and 10 s fall inside the 15 s warmup
    assert_all_close(
        &group.find("MCU load").unwrap().values(),
        &[0.0, 0.0, 1.6, 1.6, 1.6],
    );
}

#[test]
fn test_bandwidth_with_retransmits() {
    let text = [
        StatsLine::new(0.0)
            .field("bytes_write", 0)
            .field("bytes_retransmit", 0)
            .field("mcu_task_avg", 0)
            .field("mcu_task_stddev", 0)
            .field("print_time", 1)
            .field("buffer_time", 0)
            .render(),
        StatsLine::new(1.0)
            .field("bytes_write", 100)
            .field("bytes_retransmit", 150)
            .field("mcu_task_avg", 0)
            .field("mcu_task_stddev", 0)
            .field("print_time", 1)
            .field("buffer_time", 0)
            .render(),
    ]
    .join("\n");
    let log = KlippyLog::default().parse(&text);
    let group = build(&McuBandwidthBuilder::default(), &log);
    assert_all_close(&group.find("Bandwidth").unwrap().values(), &[1.0]);
}

#[test]
fn test_bandwidth_never_negative_across_reset() {
    let mut lines: Vec<String> = (0..4)
        .map(|i| mcu_line(i as f64 * 5.0, 50_000 + 1000 * i, 1.5, 0))
        .collect();
    lines.extend((4..8).map(|i| mcu_line(i as f64 * 5.0, 1000 * (i - 4), 1.5, 0)));
    let log = KlippyLog::default().parse(&log_text(&lines));

    let group = build(&McuBandwidthBuilder::default(), &log);
    let values = group.find("Bandwidth").unwrap().values();
    assert!(values.iter().all(|v| *v >= 0.0), "{:?}", values);
    // One sample swallowed by the reset
    assert_eq!(values.len(), 6);
}

// ============================================
// Clock Frequencies
// ============================================

#[test]
fn test_frequency_deviation_labels() {
    let log = steady_log(3);
    let group = build(&FrequencyDeviationBuilder, &log);

    let names: Vec<&str> = group.series.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["adj(50Mhz)", "freq(50Mhz)"]);
    for series in &group.series {
        assert_all_close(&series.values(), &[0.0; 3]);
        assert_eq!(series.unit, "us/s");
    }
}

#[test]
fn test_sentinel_values_never_plotted() {
    let lines = vec![
        StatsLine::new(0.0).field("freq", 0).field("print_time", 1).render(),
        StatsLine::new(1.0).field("freq", 1).field("print_time", 1).render(),
        StatsLine::new(2.0)
            .field("freq", 20_000_400)
            .field("print_time", 1)
            .render(),
    ];
    let log = KlippyLog::default().parse(&log_text(&lines));

    let deviation = build(&FrequencyDeviationBuilder, &log);
    let freq = deviation.find("freq(20Mhz)").unwrap();
    assert_all_close(&freq.values(), &[20.0]);

    let raw = build(&McuFrequencyBuilder::default(), &log);
    assert_eq!(raw.find("freq").unwrap().values(), vec![20_000_400.0]);
}

// ============================================
// System Load
// ============================================

#[test]
fn test_system_load_steady() {
    let log = steady_log(4);
    let group = build(&SystemLoadBuilder, &log);

    assert_all_close(&group.find("process time").unwrap().values(), &[10.0; 3]);
    assert_all_close(&group.find("system load").unwrap().values(), &[10.0; 3]);
    let memory = group.find("system memory").unwrap();
    assert_eq!(memory.axis, Axis::Secondary);
    assert_eq!(memory.values(), vec![100000.0; 3]);
}

// ============================================
// Temperature
// ============================================

#[test]
fn test_idle_heater_shows_only_temperature() {
    let lines: Vec<String> = (0..3)
        .map(|i| {
            StatsLine::new(i as f64)
                .section("heater_bed")
                .field("target", 0)
                .field("temp", 22.0 + i as f64)
                .field("pwm", 0)
                .field("print_time", 1)
                .render()
        })
        .collect();
    let log = KlippyLog::default().parse(&log_text(&lines));
    let group = build(&TemperatureBuilder::new("heater_bed"), &log);

    let names: Vec<&str> = group.series.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["heater_bed temp"]);
    assert_eq!(group.series[0].values(), vec![22.0, 23.0, 24.0]);
}

#[test]
fn test_heater_without_readings() {
    let log = steady_log(3);
    let group = build(&TemperatureBuilder::default(), &log);
    assert!(group.is_empty());
}
