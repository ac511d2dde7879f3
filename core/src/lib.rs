//! Logbook Core Library
//!
//! This crate contains the bounded event recorder used by the Logbook tools:
//! leveled filtering, a capacity-limited history, running metrics, pattern
//! analysis, payload redaction and export.
//!
//! # Modules
//!
//! - [`models`] - Event record, severity scale and attachments
//! - [`config`] - Recorder configuration
//! - [`storage`] - Bounded in-memory history
//! - [`metrics`] - Aggregate counters and running mean latency
//! - [`analysis`] - Level, error, performance and component analysis
//! - [`redact`] - Sensitive field redaction
//! - [`observer`] - Event observers
//! - [`sink`] - Console sinks
//! - [`export`] - Structured and plain-text export
//!
//! # Example
//!
//! ```
//! use logbook_core::{ExportFormat, Logger, Recorder, RecorderConfig};
//! use logbook_core::models::{ErrorDetail, Severity};
//!
//! let recorder = Recorder::new(RecorderConfig::new("auth-service")).unwrap();
//! recorder.info("User logged in", None);
//! recorder.error("Token refresh failed", Some(ErrorDetail::new("Timeout", "upstream")), None);
//!
//! assert_eq!(recorder.metrics().errors, 1);
//! assert_eq!(recorder.history(Some(Severity::Error), None).len(), 1);
//!
//! let text = recorder.export(ExportFormat::Plain).unwrap();
//! assert!(text.contains("[ERROR] auth-service: Token refresh failed"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod analysis;
pub mod config;
pub mod export;
pub mod logger;
pub mod metrics;
pub mod models;
pub mod observer;
pub mod recorder;
pub mod redact;
pub mod sink;
pub mod storage;

pub use analysis::AnalysisReport;
pub use config::{ConfigError, RecorderConfig};
pub use export::{ExportError, ExportFormat};
pub use logger::{Logger, ScopedLogger};
pub use metrics::MetricsSnapshot;
pub use observer::{ChannelObserver, LogObserver, ObserverError, ObserverId};
pub use recorder::Recorder;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde_json;
