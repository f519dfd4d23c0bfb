//! Domain types for the page cache.
//!
//! - [`CacheConfig`]: construction-time settings
//! - [`CacheStats`]: request and update counters

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_AGE_SECONDS;

/// Cache configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long committed content stays valid, in seconds
    pub max_age_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_seconds: DEFAULT_MAX_AGE_SECONDS,
        }
    }
}

impl CacheConfig {
    /// Creates a config with the given time-to-live.
    ///
    /// Fractions of a second round up, so a non-zero age never becomes zero.
    pub fn with_max_age(max_age: Duration) -> Self {
        let partial = u64::from(max_age.subsec_nanos() > 0);
        Self {
            max_age_seconds: max_age.as_secs().saturating_add(partial),
        }
    }

    /// Returns the time-to-live as a [`Duration`].
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_seconds)
    }
}

/// Snapshot of cache usage counters.
///
/// Both fields are read together; a snapshot never mixes values from
/// before and after a reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of reads served
    pub requests: u64,
    /// Number of committed updates
    pub updates: u64,
}

impl CacheStats {
    /// Fraction of reads served per committed update, `None` before the first update.
    pub fn requests_per_update(&self) -> Option<f64> {
        if self.updates == 0 {
            None
        } else {
            Some(self.requests as f64 / self.updates as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.max_age(), Duration::from_secs(90));
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: CacheConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CacheConfig::default());

        let config: CacheConfig = serde_json::from_str(r#"{"max_age_seconds": 5}"#).unwrap();
        assert_eq!(config.max_age(), Duration::from_secs(5));
    }

    #[test]
    fn test_config_with_max_age_rounds_subseconds_up() {
        let config = CacheConfig::with_max_age(Duration::from_millis(2500));
        assert_eq!(config.max_age_seconds, 3);

        let config = CacheConfig::with_max_age(Duration::from_millis(500));
        assert_eq!(config.max_age(), Duration::from_secs(1));

        assert_eq!(CacheConfig::with_max_age(Duration::ZERO).max_age_seconds, 0);
        assert_eq!(CacheConfig::with_max_age(Duration::from_secs(90)).max_age_seconds, 90);
        assert_eq!(CacheConfig::with_max_age(Duration::MAX).max_age_seconds, u64::MAX);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = CacheStats { requests: 7, updates: 2 };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json, serde_json::json!({"requests": 7, "updates": 2}));
    }

    #[test]
    fn test_stats_ratio() {
        assert_eq!(CacheStats::default().requests_per_update(), None);
        let stats = CacheStats { requests: 9, updates: 3 };
        assert_eq!(stats.requests_per_update(), Some(3.0));
    }
}
