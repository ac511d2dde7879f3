//! Integration tests for the Logbook recorder.
//!
//! These tests drive a `Recorder` through its public API end to end:
//! filtering, bounded history, metrics, redaction, observers and export.

use logbook_core::models::{ErrorDetail, LogEvent, Payload, PerformanceSample, Severity};
use logbook_core::sink::NullSink;
use logbook_core::{Logger, Recorder, RecorderConfig};
use serde_json::{json, Value};
use std::sync::Arc;

/// Creates a recorder writing to a null sink.
fn test_recorder(min_level: Severity, max_entries: usize) -> Recorder {
    let config = RecorderConfig::new("test-service")
        .with_min_level(min_level)
        .with_max_entries(max_entries);
    Recorder::with_sink(config, Arc::new(NullSink)).unwrap()
}

/// Converts a JSON object literal into a payload.
fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => panic!("payload must be a JSON object"),
    }
}

fn messages(events: &[LogEvent]) -> Vec<String> {
    events.iter().map(|e| e.message.clone()).collect()
}

mod properties {
    use super::*;

    #[test]
    fn test_scenario_filter_and_trim() {
        let recorder = test_recorder(Severity::Info, 3);

        recorder.debug("a", None);
        recorder.info("b", None);
        recorder.warn("c", None);
        recorder.error("d", None, None);
        recorder.info("e", None);

        let history = recorder.history(None, None);
        assert_eq!(messages(&history), vec!["c", "d", "e"]);

        let metrics = recorder.metrics();
        assert_eq!(metrics.total_logs, 4);
        assert_eq!(metrics.errors, 1);
        assert_eq!(metrics.warnings, 1);
    }

    #[test]
    fn test_bounded_growth_keeps_most_recent() {
        let max_entries = 7;
        let recorder = test_recorder(Severity::Trace, max_entries);
        recorder.clear();

        let emitted: Vec<String> = (0..50).map(|i| format!("event {i}")).collect();
        for message in &emitted {
            recorder.info(message.clone(), None);
        }

        let history = recorder.history(None, None);
        assert_eq!(history.len(), max_entries);
        assert_eq!(messages(&history), emitted[emitted.len() - max_entries..].to_vec());
    }

    #[test]
    fn test_filter_correctness_for_all_levels() {
        for min_level in Severity::ALL {
            let recorder = test_recorder(min_level, 100);
            recorder.clear();
            let baseline = recorder.len();

            for level in Severity::ALL {
                recorder.log(level, level.as_str(), None, None);
            }

            let retained: Vec<Severity> = recorder
                .history(None, None)
                .into_iter()
                .skip(baseline)
                .map(|e| e.level)
                .collect();
            let expected: Vec<Severity> = Severity::ALL
                .into_iter()
                .filter(|level| level.rank() >= min_level.rank())
                .collect();

            assert_eq!(retained, expected, "min level {min_level}");
        }
    }

    #[test]
    fn test_rate_defaults_on_fresh_recorder() {
        let recorder = test_recorder(Severity::Info, 10);
        let metrics = recorder.metrics();

        assert_eq!(metrics.total_logs, 0);
        assert!(metrics.error_rate.abs() < f64::EPSILON);
        assert!(metrics.warning_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn test_metrics_outlive_eviction() {
        let recorder = test_recorder(Severity::Info, 2);
        for _ in 0..5 {
            recorder.error("boom", None, None);
        }

        assert_eq!(recorder.len(), 2);
        let metrics = recorder.metrics();
        assert_eq!(metrics.total_logs, 5);
        assert_eq!(metrics.errors, 5);
        assert!((metrics.error_rate - 1.0).abs() < 1e-9);
        assert!(metrics.average_latency >= 0.0);
        assert!(metrics.average_latency.is_finite());
    }

    #[test]
    fn test_redaction_completeness() {
        let recorder = test_recorder(Severity::Info, 10);
        recorder.info(
            "with secrets",
            Some(payload(json!({
                "password": "x",
                "nested": {"secret": "y"},
                "safe": "z"
            }))),
        );

        let event = recorder.history(None, Some(1)).pop().unwrap();
        let stored = event.payload.unwrap();
        assert_eq!(stored["password"], "[REDACTED]");
        assert_eq!(stored["nested"]["secret"], "[REDACTED]");
        assert_eq!(stored["safe"], "z");
    }

    #[test]
    fn test_history_query_min_severity_and_limit() {
        let recorder = test_recorder(Severity::Trace, 20);
        recorder.clear();
        recorder.info("i1", None);
        recorder.error("e1", None, None);
        recorder.warn("w1", None);
        recorder.fatal("f1", None, None);
        recorder.error("e2", None, None);

        let errors = recorder.history(Some(Severity::Error), None);
        assert_eq!(messages(&errors), vec!["e1", "f1", "e2"]);

        let last_two = recorder.history(Some(Severity::Warn), Some(2));
        assert_eq!(messages(&last_two), vec!["f1", "e2"]);
    }

    #[test]
    fn test_clear_logs_itself_first() {
        let recorder = test_recorder(Severity::Info, 10);
        recorder.info("before", None);
        recorder.warn("before too", None);

        recorder.clear();

        let history = recorder.history(None, None);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].message, "Log history cleared");
        assert_eq!(history[0].payload.as_ref().unwrap()["cleared"], 2);

        recorder.info("after", None);
        assert_eq!(messages(&recorder.history(None, None)), vec!["Log history cleared", "after"]);

        // Metrics cover the recorder's lifetime
        assert_eq!(recorder.metrics().total_logs, 4);
    }

    #[test]
    fn test_clear_below_min_level_leaves_history_empty() {
        let recorder = test_recorder(Severity::Warn, 10);
        recorder.warn("w", None);
        recorder.clear();
        assert!(recorder.is_empty());
    }
}

mod analysis {
    use super::*;

    #[test]
    fn test_analyze_over_retained_history() {
        let recorder = test_recorder(Severity::Info, 50);
        let db = recorder.scoped("db");
        let api = recorder.scoped("api");

        db.error(
            "Query failed",
            Some(ErrorDetail::new("Timeout", "5s")),
            None,
        );
        db.error(
            "Query failed",
            Some(ErrorDetail::new("Timeout", "5s")),
            None,
        );
        api.fatal("Crashed", None, None);
        api.warn("Slow", None);
        recorder.log_performance("render", PerformanceSample::new(5.0, 2048, 40.0), None);

        let report = recorder.analyze();

        assert_eq!(report.level_distribution[&Severity::Error], 2);
        assert_eq!(report.level_distribution[&Severity::Fatal], 1);
        assert_eq!(report.level_distribution[&Severity::Warn], 1);
        assert_eq!(report.level_distribution[&Severity::Info], 1);

        assert_eq!(report.error_patterns.total_errors, 3);
        assert_eq!(report.error_patterns.by_kind["Timeout"], 2);
        assert_eq!(report.error_patterns.by_kind["Unknown"], 1);
        assert_eq!(report.error_patterns.common_messages["Query failed"], 2);

        assert_eq!(report.component_usage["db"], 2);
        assert_eq!(report.component_usage["api"], 2);
        assert_eq!(report.component_usage["test-service"], 1);

        assert_eq!(report.performance_trends.samples.len(), 1);
        assert_eq!(report.performance_trends.samples[0].memory_bytes, 2048);
        let metrics = recorder.metrics();
        assert!((report.performance_trends.average_latency - metrics.average_latency).abs() < 1e-12);
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let recorder = test_recorder(Severity::Info, 10);
        recorder.error("x", None, None);
        recorder.info("y", None);

        assert_eq!(recorder.analyze(), recorder.analyze());
    }

    #[test]
    fn test_analyze_empty_history() {
        let recorder = test_recorder(Severity::Info, 10);
        let report = recorder.analyze();

        assert_eq!(report.error_patterns.total_errors, 0);
        assert!(report.error_patterns.frequency_per_minute.abs() < f64::EPSILON);
        assert!(report.component_usage.is_empty());
    }
}

mod export {
    use super::*;
    use logbook_core::export::import_structured;
    use logbook_core::ExportFormat;
    use tokio_test::assert_ok;

    #[test]
    fn test_structured_round_trip() {
        let recorder = test_recorder(Severity::Debug, 20);
        recorder.info("one", Some(payload(json!({"k": "v", "n": 1}))));
        recorder.warn("two", None);
        recorder.error("three", Some(ErrorDetail::new("Io", "disk")), None);

        let original = recorder.history(None, None);
        let exported = assert_ok!(recorder.export(ExportFormat::Structured));
        let parsed = assert_ok!(import_structured(&exported));

        assert_eq!(parsed.len(), original.len());
        for (a, b) in original.iter().zip(&parsed) {
            assert_eq!(a.timestamp, b.timestamp);
            assert_eq!(a.level, b.level);
            assert_eq!(a.component, b.component);
            assert_eq!(a.message, b.message);
        }
    }

    #[test]
    fn test_structured_round_trip_keeps_performance_samples() {
        let recorder = test_recorder(Severity::Info, 20);
        recorder.log_performance("infinite", PerformanceSample::new(f64::INFINITY, 1, 1.0), None);
        recorder.log_performance(
            "hand-built",
            PerformanceSample {
                duration_ms: f64::NAN,
                memory_bytes: 2,
                cpu_percent: f64::NEG_INFINITY,
            },
            None,
        );
        recorder.log_performance("precise", PerformanceSample::new(0.1 + 0.2, 3, 1.0 / 3.0), None);

        let original = recorder.history(None, None);
        let exported = assert_ok!(recorder.export(ExportFormat::Structured));
        let parsed = assert_ok!(import_structured(&exported));

        assert_eq!(parsed, original);
        assert_eq!(parsed[0].performance, Some(PerformanceSample::new(0.0, 1, 1.0)));
        assert_eq!(parsed[1].performance, Some(PerformanceSample::new(0.0, 2, 0.0)));
        assert_eq!(
            parsed[2].performance.map(|sample| sample.duration_ms),
            Some(0.1 + 0.2)
        );
    }

    #[test]
    fn test_plain_export_format() {
        let recorder = test_recorder(Severity::Info, 20);
        recorder.info("Server started", None);
        recorder.scoped("db").error("Connection lost", None, None);

        let text = assert_ok!(recorder.export(ExportFormat::Plain));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] [INFO] test-service: Server started"));
        assert!(lines[1].ends_with("] [ERROR] db: Connection lost"));
    }

    #[test]
    fn test_export_does_not_leak_secrets() {
        let recorder = test_recorder(Severity::Info, 20);
        recorder.info("login", Some(payload(json!({"auth_token": "abc123"}))));

        let exported = assert_ok!(recorder.export(ExportFormat::Structured));
        assert!(!exported.contains("abc123"));
        assert!(exported.contains("[REDACTED]"));
    }
}

mod observers {
    use super::*;
    use logbook_core::{ChannelObserver, LogObserver, ObserverError};
    use std::sync::Mutex;

    #[test]
    fn test_observers_see_redacted_events_in_order() {
        let recorder = test_recorder(Severity::Info, 10);
        let seen: Arc<Mutex<Vec<(u8, LogEvent)>>> = Arc::new(Mutex::new(Vec::new()));

        for tag in [1u8, 2u8] {
            let seen = Arc::clone(&seen);
            recorder.subscribe(Arc::new(move |event: &LogEvent| -> Result<(), ObserverError> {
                seen.lock().unwrap().push((tag, event.clone()));
                Ok(())
            }));
        }

        recorder.info("hello", Some(payload(json!({"secret": "s"}))));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, 1);
        assert_eq!(seen[1].0, 2);
        assert_eq!(seen[0].1.payload.as_ref().unwrap()["secret"], "[REDACTED]");
    }

    #[test]
    fn test_failing_observer_does_not_block_others_or_state() {
        let recorder = test_recorder(Severity::Info, 10);
        let delivered = Arc::new(Mutex::new(0usize));

        recorder.subscribe(Arc::new(|_: &LogEvent| -> Result<(), ObserverError> {
            Err(ObserverError::Failed("broken".to_string()))
        }));
        recorder.subscribe(Arc::new(|_: &LogEvent| -> Result<(), ObserverError> {
            panic!("observer bug")
        }));
        {
            let delivered = Arc::clone(&delivered);
            recorder.subscribe(Arc::new(move |_: &LogEvent| -> Result<(), ObserverError> {
                *delivered.lock().unwrap() += 1;
                Ok(())
            }));
        }

        recorder.warn("still recorded", None);

        assert_eq!(*delivered.lock().unwrap(), 1);
        assert_eq!(recorder.len(), 1);
        assert_eq!(recorder.metrics().warnings, 1);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let recorder = test_recorder(Severity::Info, 10);
        let count = Arc::new(Mutex::new(0usize));
        let observer: Arc<dyn LogObserver> = {
            let count = Arc::clone(&count);
            Arc::new(move |_: &LogEvent| -> Result<(), ObserverError> {
                *count.lock().unwrap() += 1;
                Ok(())
            })
        };

        let id = recorder.subscribe(observer);
        recorder.info("one", None);
        assert!(recorder.unsubscribe(id));
        recorder.info("two", None);

        assert_eq!(*count.lock().unwrap(), 1);
        assert!(!recorder.unsubscribe(id));
    }

    #[test]
    fn test_filtered_events_are_not_notified() {
        let recorder = test_recorder(Severity::Error, 10);
        let (observer, mut rx) = ChannelObserver::new();
        recorder.subscribe(Arc::new(observer));

        recorder.info("ignored", None);
        recorder.error("kept", None, None);

        assert_eq!(rx.try_recv().unwrap().message, "kept");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_channel_observer_streams_events() {
        let recorder = test_recorder(Severity::Info, 10);
        let (observer, mut rx) = ChannelObserver::new();
        recorder.subscribe(Arc::new(observer));

        let consumer = tokio::spawn(async move {
            let mut received = Vec::new();
            while let Some(event) = rx.recv().await {
                received.push(event.message);
                if received.len() == 3 {
                    break;
                }
            }
            received
        });

        recorder.info("a", None);
        recorder.warn("b", None);
        recorder.error("c", None, None);

        let received = consumer.await.unwrap();
        assert_eq!(received, vec!["a", "b", "c"]);
    }
}

mod concurrency {
    use super::*;
    use std::thread;

    #[test]
    fn test_recorder_is_thread_safe() {
        let config = RecorderConfig::new("threads").with_max_entries(64);
        let recorder = Arc::new(Recorder::with_sink(config, Arc::new(NullSink)).unwrap());
        let mut handles = vec![];

        for t in 0..8 {
            let recorder = Arc::clone(&recorder);
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    if i % 10 == 0 {
                        recorder.error(format!("thread {t} error {i}"), None, None);
                    } else {
                        recorder.info(format!("thread {t} log {i}"), None);
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let metrics = recorder.metrics();
        assert_eq!(metrics.total_logs, 800);
        assert_eq!(metrics.errors, 80);
        assert_eq!(recorder.len(), 64);

        let history = recorder.history(None, None);
        for pair in history.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn test_clear_event_is_first_under_concurrent_logging() {
        let recorder = Arc::new(test_recorder(Severity::Info, 100_000));
        let mut handles = vec![];

        for t in 0..4 {
            let recorder = Arc::clone(&recorder);
            handles.push(thread::spawn(move || {
                for i in 0..500 {
                    recorder.info(format!("writer {t} log {i}"), None);
                }
            }));
        }

        for _ in 0..200 {
            recorder.clear();
            let history = recorder.history(None, None);
            assert_eq!(history[0].message, "Log history cleared");
        }

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
