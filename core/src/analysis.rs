//! On-demand analysis over a history snapshot.
//!
//! All functions here are pure: they read a slice of events and never keep
//! state between calls, so repeated calls over the same snapshot agree.

use crate::models::{LogEvent, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error kind used for error events that carry no error detail.
pub const UNKNOWN_ERROR_KIND: &str = "Unknown";

/// Error and fatal event statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPatterns {
    /// Number of retained error and fatal events.
    pub total_errors: usize,
    /// Error kind to occurrence count.
    pub by_kind: BTreeMap<String, usize>,
    /// Errors per minute across the retained time span.
    pub frequency_per_minute: f64,
    /// Error message to occurrence count.
    pub common_messages: BTreeMap<String, usize>,
}

/// One resource measurement taken from an event's performance sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSample {
    /// Timestamp of the carrying event.
    pub timestamp: DateTime<Utc>,
    /// Memory usage in bytes.
    pub memory_bytes: u64,
    /// CPU usage in percent.
    pub cpu_percent: f64,
}

/// Latency and resource usage trends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceTrends {
    /// Running mean processing latency from the aggregate metrics.
    pub average_latency: f64,
    /// Samples from retained events, oldest first.
    pub samples: Vec<ResourceSample>,
}

/// Combined analysis of the retained history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Retained event count per severity.
    pub level_distribution: BTreeMap<Severity, usize>,
    /// Error clustering.
    pub error_patterns: ErrorPatterns,
    /// Latency and resource trends.
    pub performance_trends: PerformanceTrends,
    /// Component name to occurrence count.
    pub component_usage: BTreeMap<String, usize>,
}

impl AnalysisReport {
    /// Runs every analysis over `events`.
    ///
    /// `average_latency` comes from the aggregate metrics, which outlive the
    /// retained window.
    #[must_use]
    pub fn build(events: &[LogEvent], average_latency: f64) -> Self {
        Self {
            level_distribution: level_distribution(events),
            error_patterns: error_patterns(events),
            performance_trends: performance_trends(events, average_latency),
            component_usage: component_usage(events),
        }
    }
}

/// Counts retained events per severity. Every severity is present, possibly at zero.
#[must_use]
pub fn level_distribution(events: &[LogEvent]) -> BTreeMap<Severity, usize> {
    let mut counts: BTreeMap<Severity, usize> =
        Severity::ALL.iter().map(|level| (*level, 0)).collect();
    for event in events {
        *counts.entry(event.level).or_default() += 1;
    }
    counts
}

/// Groups error and fatal events by kind and message.
///
/// Frequency is `errors / (span_ms / 60000)`, and zero when fewer than two
/// events are retained or they share one timestamp.
#[must_use]
pub fn error_patterns(events: &[LogEvent]) -> ErrorPatterns {
    let mut by_kind: BTreeMap<String, usize> = BTreeMap::new();
    let mut common_messages: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_errors = 0;

    for event in events.iter().filter(|e| e.is_error()) {
        total_errors += 1;
        let kind = event
            .error
            .as_ref()
            .map_or(UNKNOWN_ERROR_KIND, |detail| detail.kind.as_str());
        *by_kind.entry(kind.to_string()).or_default() += 1;
        *common_messages.entry(event.message.clone()).or_default() += 1;
    }

    let frequency_per_minute = match (events.first(), events.last()) {
        (Some(first), Some(last)) if events.len() >= 2 => {
            let span_ms = (last.timestamp - first.timestamp).num_milliseconds();
            if span_ms > 0 {
                // Cast is acceptable here: precision loss is negligible for rates
                #[allow(clippy::cast_precision_loss)]
                let minutes = span_ms as f64 / 60_000.0;
                #[allow(clippy::cast_precision_loss)]
                let errors = total_errors as f64;
                errors / minutes
            } else {
                0.0
            }
        }
        _ => 0.0,
    };

    ErrorPatterns {
        total_errors,
        by_kind,
        frequency_per_minute,
        common_messages,
    }
}

/// Collects resource samples from retained events in order.
#[must_use]
pub fn performance_trends(events: &[LogEvent], average_latency: f64) -> PerformanceTrends {
    let samples = events
        .iter()
        .filter_map(|event| {
            event.performance.map(|sample| ResourceSample {
                timestamp: event.timestamp,
                memory_bytes: sample.memory_bytes,
                cpu_percent: sample.cpu_percent,
            })
        })
        .collect();

    PerformanceTrends {
        average_latency,
        samples,
    }
}

/// Counts retained events per component.
#[must_use]
pub fn component_usage(events: &[LogEvent]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for event in events {
        *counts.entry(event.component.clone()).or_default() += 1;
    }
    counts
}
