//! Export of derived series built from real parsed logs

use crate::common::{log_text, mcu_line};
use klipstats::analysis::{BuilderRegistry, SeriesGroup};
use klipstats::export::{export_groups, ExportConfig, ExportFormat};
use klipstats::parsers::{KlippyLog, Parseable};
use klipstats::settings::AnalysisSettings;

fn groups() -> (usize, Vec<SeriesGroup>) {
    let lines: Vec<String> = (0..4)
        .map(|i| mcu_line(1_700_000_000.0 + i as f64 * 5.0, 2500 * i, 1.5, 0))
        .collect();
    let log = KlippyLog::default().parse(&log_text(&lines));
    let groups = BuilderRegistry::new(&AnalysisSettings::default())
        .build_all(&log)
        .unwrap();
    (log.len(), groups)
}

fn export(config: &ExportConfig) -> String {
    let (samples, groups) = groups();
    let mut out = Vec::new();
    export_groups(config, samples, &groups, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_json_document_shape() {
    let text = export(&ExportConfig {
        source: Some("klippy.log".to_string()),
        ..Default::default()
    });
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(value["source"], "klippy.log");
    assert_eq!(value["samples"], 4);
    let groups = value["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 5);
    assert_eq!(groups[0]["category"], "mcu");
    assert_eq!(groups[0]["title"], "MCU bandwidth and load utilization");
    assert_eq!(groups[0]["series"][0]["name"], "Bandwidth");
    assert_eq!(
        groups[0]["series"][0]["points"][0]["time"],
        "2023-11-14T22:13:25Z"
    );
    assert_eq!(groups[3]["series"][2]["axis"], "secondary");
}

#[test]
fn test_pretty_json_is_indented() {
    let compact = export(&ExportConfig::default());
    let pretty = export(&ExportConfig {
        pretty: true,
        ..Default::default()
    });
    assert_eq!(compact.lines().count(), 1);
    assert!(pretty.lines().count() > 1);

    let a: serde_json::Value = serde_json::from_str(&compact).unwrap();
    let b: serde_json::Value = serde_json::from_str(&pretty).unwrap();
    assert_eq!(a["groups"], b["groups"]);
}

#[test]
fn test_summary_lists_every_group() {
    let text = export(&ExportConfig {
        format: ExportFormat::Summary,
        ..Default::default()
    });

    assert!(text.starts_with("4 stats samples"));
    for tag in ["[mcu]", "[mcu_freq]", "[mcu_frequency]", "[system]", "[heater]"] {
        assert!(text.contains(tag), "missing {} in\n{}", tag, text);
    }
    assert!(text.contains("Bandwidth (%): 3 points, min 2.00, max 2.00, last 2.00"));
}
