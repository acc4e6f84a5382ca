#![allow(non_snake_case)]

use super::*;
use parking_lot::Mutex;

fn capturing_sink() -> (LogSink, Arc<Mutex<Vec<LogRecord>>>) {
    let records = Arc::new(Mutex::new(Vec::new()));
    let store = records.clone();
    let sink: LogSink = Arc::new(move |record: &LogRecord| store.lock().push(record.clone()));
    (sink, records)
}

#[test]
fn LogSinkManager___new___defaults_to_info_without_sink() {
    let manager = LogSinkManager::new();

    assert_eq!(manager.level(), LogLevel::Info);
    assert!(!manager.has_sink());
}

#[test]
fn LogSinkManager___is_enabled___respects_level_ordering() {
    let manager = LogSinkManager::new();
    manager.set_level(LogLevel::Warn);

    assert!(!manager.is_enabled(LogLevel::Info));
    assert!(manager.is_enabled(LogLevel::Warn));
    assert!(manager.is_enabled(LogLevel::Error));
}

#[test]
fn LogSinkManager___is_enabled___off_forwards_nothing() {
    let manager = LogSinkManager::new();
    manager.set_level(LogLevel::Off);

    assert!(!manager.is_enabled(LogLevel::Error));
    assert!(!manager.is_enabled(LogLevel::Off));
}

#[test]
fn LogSinkManager___log___forwards_enabled_records() {
    let manager = LogSinkManager::new();
    let (sink, records) = capturing_sink();
    manager.set_sink(Some(sink));

    manager.log(LogLevel::Error, "hostbridge::host", "handler panicked");
    manager.log(LogLevel::Debug, "hostbridge::host", "filtered");

    assert_eq!(
        *records.lock(),
        vec![LogRecord {
            level: LogLevel::Error,
            target: "hostbridge::host".to_string(),
            message: "handler panicked".to_string(),
        }]
    );
}

#[test]
fn LogSinkManager___set_sink_none___stops_forwarding() {
    let manager = LogSinkManager::new();
    let (sink, records) = capturing_sink();
    manager.set_sink(Some(sink));

    manager.set_sink(None);
    manager.log(LogLevel::Error, "t", "dropped");

    assert!(records.lock().is_empty());
    assert!(!manager.has_sink());
}

#[test]
fn LogSinkManager___global___returns_same_instance() {
    let first = LogSinkManager::global() as *const LogSinkManager;
    let second = LogSinkManager::global() as *const LogSinkManager;

    assert_eq!(first, second);
}
