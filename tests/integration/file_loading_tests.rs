//! File loading integration tests

use crate::common::{log_text, mcu_line, temp_log};
use klipstats::parsers::{KlippyLog, LoadError, Parseable};
use std::path::Path;

#[test]
fn test_load_matches_in_memory_parse() {
    let lines: Vec<String> = (0..25).map(|i| mcu_line(i as f64 * 5.0, 100 * i, 1.2, 0)).collect();
    let text = log_text(&lines);
    let file = temp_log(text.as_bytes());

    let parser = KlippyLog::default();
    let loaded = parser.load_file(file.path()).unwrap();
    assert_eq!(loaded.len(), 25);
    assert_eq!(loaded, parser.parse(&text));
}

#[test]
fn test_load_empty_file() {
    let file = temp_log(b"");
    let log = KlippyLog::default().load_file(file.path()).unwrap();
    assert!(log.is_empty());
}

#[test]
fn test_load_missing_file() {
    let err = KlippyLog::default()
        .load_file(Path::new("/nonexistent/klippy.log"))
        .unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
    assert!(err.to_string().contains("klippy.log"));
}

#[test]
fn test_load_invalid_utf8() {
    let mut bytes = mcu_line(1.0, 0, 1.0, 0).into_bytes();
    bytes.push(b'\n');
    let offset = bytes.len();
    bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
    let file = temp_log(&bytes);

    match KlippyLog::default().load_file(file.path()) {
        Err(LoadError::InvalidUtf8 { offset: at, .. }) => assert_eq!(at, offset),
        other => panic!("expected InvalidUtf8, got {:?}", other),
    }
}

#[test]
fn test_load_crlf_line_endings() {
    let text = format!("{}\r\n{}\r\n", mcu_line(1.0, 0, 1.0, 0), mcu_line(2.0, 10, 1.0, 0));
    let file = temp_log(text.as_bytes());
    let log = KlippyLog::default().load_file(file.path()).unwrap();
    assert_eq!(log.times(), vec![1.0, 2.0]);
    assert_eq!(log.samples[1].raw("memavail"), Some("100000"));
}
