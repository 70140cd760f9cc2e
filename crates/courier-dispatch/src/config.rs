// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatcher configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use courier_core::CourierError;

/// Configuration for the dispatch core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatcherConfig {
    /// Number of concurrent worker tasks draining the queue.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Capacity of the bounded queue; enqueue fails once it is reached.
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// Per-message processing deadline in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            max_size: default_max_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_max_workers() -> usize {
    3
}

fn default_max_size() -> usize {
    100
}

fn default_timeout_secs() -> f64 {
    30.0
}

impl DispatcherConfig {
    /// The per-message deadline as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }

    /// Check the knobs are internally consistent.
    pub fn validate(&self) -> Result<(), CourierError> {
        if self.max_workers < 1 {
            return Err(CourierError::Config("max_workers must be >= 1".into()));
        }
        if self.max_size < 1 {
            return Err(CourierError::Config("max_size must be >= 1".into()));
        }
        if self.timeout_secs <= 0.0 {
            return Err(CourierError::Config("timeout_secs must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = DispatcherConfig::default();
        assert_eq!(config.max_workers, 3);
        assert_eq!(config.max_size, 100);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_knobs() {
        let mut config = DispatcherConfig::default();
        config.max_workers = 0;
        assert!(config.validate().is_err());

        let mut config = DispatcherConfig::default();
        config.max_size = 0;
        assert!(config.validate().is_err());

        let mut config = DispatcherConfig::default();
        config.timeout_secs = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: DispatcherConfig =
            serde_json::from_str(r#"{"max_workers": 5}"#).expect("partial config parses");
        assert_eq!(config.max_workers, 5);
        assert_eq!(config.max_size, 100);
    }
}
