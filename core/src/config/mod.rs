//! Configuration module for Logbook.
//!
//! This module contains the recorder configuration and its loading rules.

pub mod recorder;

pub use recorder::{ConfigError, RecorderConfig, DEFAULT_COMPONENT, DEFAULT_MAX_ENTRIES};
