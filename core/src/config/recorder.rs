//! Recorder configuration.
//!
//! Holds the construction-time settings of a [`Recorder`](crate::recorder::Recorder)
//! and loads them from environment variables with sensible defaults.

use crate::models::{ParseSeverityError, Severity};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Default number of retained events.
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Default component label.
pub const DEFAULT_COMPONENT: &str = "app";

/// Errors raised while building or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The minimum level does not name a severity.
    #[error("Invalid minimum level: {0}")]
    InvalidLevel(#[from] ParseSeverityError),

    /// `max_entries` is zero.
    #[error("max_entries must be at least 1")]
    InvalidMaxEntries,

    /// The component label is empty.
    #[error("Component name cannot be empty")]
    EmptyComponent,

    /// An environment value could not be parsed.
    #[error("Invalid value for {var}: {value}")]
    InvalidValue {
        /// Variable name.
        var: String,
        /// Raw value that failed to parse.
        value: String,
    },

    /// Validation failed with details.
    #[error("Validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

/// Configuration for a recorder.
///
/// Configuration values can be set via environment variables:
/// - `LOGBOOK_LEVEL`: minimum severity retained (default: "info")
/// - `LOGBOOK_COMPONENT`: component label of the recorder (default: "app")
/// - `LOGBOOK_MAX_ENTRIES`: retained history capacity (default: 1000)
/// - `LOGBOOK_PERFORMANCE`: attach performance samples (default: true)
/// - `LOGBOOK_INCLUDE_PAYLOAD`: keep structured payloads (default: true)
///
/// # Example
///
/// ```
/// use logbook_core::config::RecorderConfig;
/// use logbook_core::models::Severity;
///
/// let config = RecorderConfig::new("billing")
///     .with_min_level(Severity::Warn)
///     .with_max_entries(50);
///
/// assert!(config.validate_config().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RecorderConfig {
    /// Minimum severity an event needs to be accepted.
    pub min_level: Severity,

    /// Default component label stamped on events.
    #[validate(length(min = 1, message = "Component name cannot be empty"))]
    pub component: String,

    /// Whether performance samples are attached to events.
    pub performance_tracking: bool,

    /// Whether structured payloads are kept on events.
    pub include_payload: bool,

    /// Maximum number of retained events.
    #[validate(range(min = 1, message = "max_entries must be at least 1"))]
    pub max_entries: usize,
}

impl RecorderConfig {
    /// Creates a configuration with default settings for the given component.
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            ..Self::default()
        }
    }

    /// Sets the minimum level.
    #[must_use]
    pub fn with_min_level(mut self, level: Severity) -> Self {
        self.min_level = level;
        self
    }

    /// Sets the retained history capacity.
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Enables or disables performance samples.
    #[must_use]
    pub fn with_performance_tracking(mut self, enabled: bool) -> Self {
        self.performance_tracking = enabled;
        self
    }

    /// Enables or disables payload inclusion.
    #[must_use]
    pub fn with_include_payload(mut self, enabled: bool) -> Self {
        self.include_payload = enabled;
        self
    }

    /// Creates a new configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is set but cannot be parsed, or if the
    /// resulting configuration is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Used by [`from_env`](Self::from_env); handy for feeding values from
    /// other sources.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be parsed or the result is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let min_level = match lookup("LOGBOOK_LEVEL") {
            Some(raw) => raw.parse::<Severity>()?,
            None => defaults.min_level,
        };
        let component = lookup("LOGBOOK_COMPONENT").unwrap_or(defaults.component);
        let max_entries = parse_var(&lookup, "LOGBOOK_MAX_ENTRIES")?.unwrap_or(defaults.max_entries);
        let performance_tracking =
            parse_var(&lookup, "LOGBOOK_PERFORMANCE")?.unwrap_or(defaults.performance_tracking);
        let include_payload =
            parse_var(&lookup, "LOGBOOK_INCLUDE_PAYLOAD")?.unwrap_or(defaults.include_payload);

        let config = Self {
            min_level,
            component,
            performance_tracking,
            include_payload,
            max_entries,
        };
        config.validate_config()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `max_entries` is zero
    /// - The component label is empty
    pub fn validate_config(&self) -> Result<(), ConfigError> {
        if self.max_entries == 0 {
            return Err(ConfigError::InvalidMaxEntries);
        }
        if self.component.is_empty() {
            return Err(ConfigError::EmptyComponent);
        }
        self.validate()?;
        Ok(())
    }

    /// Returns true if an event of `level` passes the minimum level.
    #[must_use]
    pub fn accepts(&self, level: Severity) -> bool {
        level.rank() >= self.min_level.rank()
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            min_level: Severity::Info,
            component: DEFAULT_COMPONENT.to_string(),
            performance_tracking: true,
            include_payload: true,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

fn parse_var<F, T>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(var)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                value: raw.clone(),
            })
        })
        .transpose()
}
