//! Data models for the Logbook recorder.
//!
//! This module contains the event record and its attachments.

pub mod event;

pub use event::{ErrorDetail, LogEvent, ParseSeverityError, PerformanceSample, Payload, Severity};
