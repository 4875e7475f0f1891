#![forbid(unsafe_code)]

//! Policy-as-data configuration for the reconciliation engine.
//!
//! Every retry, timeout, and highlight window the engine uses lives in a
//! single [`ReconcileConfig`], so the number and spacing of retries is a
//! declared policy rather than emergent behavior.
//!
//! # Loading
//!
//! ```toml
//! # ffocus.toml
//! max_snapshots = 5
//! deadline_ms = 10000
//! page_ack_timeout_ms = 300
//! ```
//!
//! ```rust,ignore
//! let config = ReconcileConfig::from_toml_file("ffocus.toml")?;
//! let config = ReconcileConfig::from_json_str(json)?;
//! ```
//!
//! Durations are stored in milliseconds so the file format stays flat.
//! Missing fields fall back to [`ReconcileConfig::default`].

#[cfg(feature = "policy-config")]
use std::path::Path;

#[cfg(feature = "policy-config")]
use serde::{Deserialize, Serialize};
use web_time::Duration;

/// Tunable policy for the request queue, navigation driver, and highlight
/// timer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct ReconcileConfig {
    /// Snapshots a pending request may observe without resolving before it
    /// expires. Rejected by [`validate`](Self::validate) when zero; an
    /// unvalidated zero is treated as 1 by the request queue.
    pub max_snapshots: u32,
    /// Wall-clock ceiling for a pending request, in milliseconds.
    pub deadline_ms: u64,
    /// How long to wait for the surface's page-changed acknowledgment
    /// before selecting anyway, in milliseconds.
    pub page_ack_timeout_ms: u64,
    /// Deferred re-checks allowed while the surface is still settling.
    pub settle_rechecks: u32,
    /// Spacing between deferred re-checks, in milliseconds.
    pub settle_interval_ms: u64,
    /// How long a resolved record stays highlighted, in milliseconds.
    pub highlight_ms: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_snapshots: 5,
            deadline_ms: 10_000,
            page_ack_timeout_ms: 300,
            settle_rechecks: 5,
            settle_interval_ms: 100,
            highlight_ms: 3_000,
        }
    }
}

impl ReconcileConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the snapshot budget.
    #[must_use]
    pub fn max_snapshots(mut self, n: u32) -> Self {
        self.max_snapshots = n;
        self
    }

    /// Set the wall-clock ceiling.
    #[must_use]
    pub fn deadline(mut self, d: Duration) -> Self {
        self.deadline_ms = duration_ms(d);
        self
    }

    /// Set the page acknowledgment timeout.
    #[must_use]
    pub fn page_ack_timeout(mut self, d: Duration) -> Self {
        self.page_ack_timeout_ms = duration_ms(d);
        self
    }

    /// Set the deferred re-check budget and spacing.
    #[must_use]
    pub fn settle(mut self, rechecks: u32, interval: Duration) -> Self {
        self.settle_rechecks = rechecks;
        self.settle_interval_ms = duration_ms(interval);
        self
    }

    /// Set the highlight window.
    #[must_use]
    pub fn highlight(mut self, d: Duration) -> Self {
        self.highlight_ms = duration_ms(d);
        self
    }

    /// Wall-clock ceiling as a [`Duration`].
    #[inline]
    pub fn deadline_duration(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    /// Page acknowledgment timeout as a [`Duration`].
    #[inline]
    pub fn page_ack_duration(&self) -> Duration {
        Duration::from_millis(self.page_ack_timeout_ms)
    }

    /// Re-check spacing as a [`Duration`].
    #[inline]
    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_interval_ms)
    }

    /// Highlight window as a [`Duration`].
    #[inline]
    pub fn highlight_duration(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.max_snapshots == 0 {
            errors.push("max_snapshots must be > 0".into());
        }
        if self.deadline_ms == 0 {
            errors.push("deadline_ms must be > 0".into());
        }
        if self.page_ack_timeout_ms == 0 {
            errors.push("page_ack_timeout_ms must be > 0".into());
        }
        if self.settle_rechecks > 0 && self.settle_interval_ms == 0 {
            errors.push("settle_interval_ms must be > 0 when settle_rechecks > 0".into());
        }
        if self.page_ack_timeout_ms >= self.deadline_ms {
            errors.push(format!(
                "page_ack_timeout_ms ({}) must be below deadline_ms ({})",
                self.page_ack_timeout_ms, self.deadline_ms
            ));
        }
        errors
    }

    /// Validate, converting a non-empty error list into [`ConfigError`].
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load from a TOML string.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str::<Self>(s)
            .map_err(ConfigError::Toml)?
            .validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "policy-config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(s)
            .map_err(ConfigError::Json)?
            .validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "policy-config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Errors that can occur when loading a configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "policy-config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "policy-config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "policy-config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "policy-config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "policy-config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "policy-config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
