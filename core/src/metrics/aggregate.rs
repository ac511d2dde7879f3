//! Running aggregate statistics over accepted events.
//!
//! Counters and the mean latency are updated incrementally per event and
//! cover the whole lifetime of a recorder, independent of history eviction.

use crate::models::Severity;
use serde::{Deserialize, Serialize};

/// Point-in-time copy of the aggregate metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Total number of accepted events.
    pub total_logs: u64,
    /// Number of accepted error and fatal events.
    pub errors: u64,
    /// Number of accepted warn events.
    pub warnings: u64,
    /// Running mean of per-event processing latency in milliseconds.
    pub average_latency: f64,
    /// `errors / max(total_logs, 1)`.
    pub error_rate: f64,
    /// `warnings / max(total_logs, 1)`.
    pub warning_rate: f64,
}

/// Incrementally maintained counters and mean latency.
///
/// # Example
///
/// ```
/// use logbook_core::metrics::AggregateMetrics;
/// use logbook_core::models::Severity;
///
/// let mut metrics = AggregateMetrics::new();
/// metrics.record(Severity::Info, 2.0);
/// metrics.record(Severity::Error, 4.0);
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.total_logs, 2);
/// assert!((snapshot.average_latency - 3.0).abs() < 1e-9);
/// assert!((snapshot.error_rate - 0.5).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateMetrics {
    total_logs: u64,
    errors: u64,
    warnings: u64,
    average_latency: f64,
}

impl AggregateMetrics {
    /// Creates a tracker with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one accepted event and its processing latency.
    ///
    /// The mean is updated as `mean + (latency - mean) / n`.
    pub fn record(&mut self, level: Severity, latency_ms: f64) {
        self.total_logs += 1;

        match level {
            Severity::Error | Severity::Fatal => self.errors += 1,
            Severity::Warn => self.warnings += 1,
            _ => {}
        }

        let latency = if latency_ms.is_finite() {
            latency_ms.max(0.0)
        } else {
            0.0
        };
        #[allow(clippy::cast_precision_loss)]
        let count = self.total_logs as f64;
        self.average_latency += (latency - self.average_latency) / count;
    }

    /// Returns a copy of the current counters with derived rates.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        // Cast is acceptable here: counts stay far below 2^52
        #[allow(clippy::cast_precision_loss)]
        let denominator = self.total_logs.max(1) as f64;
        #[allow(clippy::cast_precision_loss)]
        let (errors, warnings) = (self.errors as f64, self.warnings as f64);

        MetricsSnapshot {
            total_logs: self.total_logs,
            errors: self.errors,
            warnings: self.warnings,
            average_latency: self.average_latency,
            error_rate: errors / denominator,
            warning_rate: warnings / denominator,
        }
    }

    /// Returns the running mean latency in milliseconds.
    #[must_use]
    pub fn average_latency(&self) -> f64 {
        self.average_latency
    }

    /// Returns the total number of recorded events.
    #[must_use]
    pub fn total_logs(&self) -> u64 {
        self.total_logs
    }
}
