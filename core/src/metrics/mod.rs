//! Aggregate metrics over accepted events.

mod aggregate;

pub use aggregate::{AggregateMetrics, MetricsSnapshot};
