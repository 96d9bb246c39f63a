//! # Runtime Configuration Module
//!
//! Environment-driven settings for the dispatcher.
//!
//! ## Environment Variables
//!
//! ### `CQS_MAX_LATENCY_MS`
//!
//! Upper bound on the wall-clock time of a single dispatch. Accepts decimal
//! (`250`) or hexadecimal (`0xfa`) milliseconds. `0` or unset disables the
//! bound. Unparseable values fall back to disabled.
//!
//! ### `CQS_RECORD_METRICS`
//!
//! `true`/`1`/`yes` enables per-operation [`DispatchMetrics`](crate::metrics::DispatchMetrics).
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use cqs_dispatch::runtime_config::DispatcherConfig;
//!
//! let config = DispatcherConfig::from_env().with_max_latency(Duration::from_millis(250));
//! assert_eq!(config.max_latency, Some(Duration::from_millis(250)));
//! ```

use std::env;
use std::time::Duration;

/// Dispatcher configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatcherConfig {
    /// Deadline applied to each dispatch; `None` leaves the caller's context as is
    pub max_latency: Option<Duration>,
    /// Record per-operation counters and latency
    pub record_metrics: bool,
}

impl DispatcherConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let max_latency = env::var("CQS_MAX_LATENCY_MS")
            .ok()
            .and_then(|v| parse_millis(&v))
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);
        let record_metrics = env::var("CQS_RECORD_METRICS")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);
        DispatcherConfig {
            max_latency,
            record_metrics,
        }
    }

    /// Override the per-dispatch deadline. A zero duration disables it.
    #[must_use]
    pub fn with_max_latency(mut self, max_latency: Duration) -> Self {
        self.max_latency = (!max_latency.is_zero()).then_some(max_latency);
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.record_metrics = enabled;
        self
    }
}

pub(crate) fn parse_millis(val: &str) -> Option<u64> {
    let val = val.trim();
    if let Some(hex) = val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}

pub(crate) fn parse_bool(val: &str) -> bool {
    matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Serialises tests that mutate process environment variables.
#[cfg(test)]
pub(crate) static ENV_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_reads_variables() {
        let _env = ENV_LOCK.lock();

        env::set_var("CQS_MAX_LATENCY_MS", "0xfa");
        env::set_var("CQS_RECORD_METRICS", "yes");
        assert_eq!(
            DispatcherConfig::from_env(),
            DispatcherConfig {
                max_latency: Some(Duration::from_millis(250)),
                record_metrics: true,
            }
        );

        env::set_var("CQS_MAX_LATENCY_MS", "0");
        env::set_var("CQS_RECORD_METRICS", "off");
        assert_eq!(DispatcherConfig::from_env(), DispatcherConfig::default());

        env::set_var("CQS_MAX_LATENCY_MS", "soon");
        env::remove_var("CQS_RECORD_METRICS");
        assert_eq!(DispatcherConfig::from_env().max_latency, None);

        env::remove_var("CQS_MAX_LATENCY_MS");
    }

    #[test]
    fn test_parse_millis() {
        assert_eq!(parse_millis("250"), Some(250));
        assert_eq!(parse_millis("0xfa"), Some(250));
        assert_eq!(parse_millis(" 0X10 "), Some(16));
        assert_eq!(parse_millis("soon"), None);
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("YES"));
        assert!(parse_bool("1"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn test_zero_latency_disables() {
        let config = DispatcherConfig::default().with_max_latency(Duration::ZERO);
        assert_eq!(config.max_latency, None);
        let config = config.with_max_latency(Duration::from_millis(5));
        assert_eq!(config.max_latency, Some(Duration::from_millis(5)));
    }
}
