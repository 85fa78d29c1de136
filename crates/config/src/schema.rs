//! Tunables for the registry engine, read from `ctxswitch.toml`.
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CtxswitchConfig {
    pub lock: LockConfig,
    pub cache: CacheConfig,
    pub registry: RegistryConfig,
}

/// Lock acquisition policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Give up acquiring after this many milliseconds.
    pub timeout_ms: u64,
    /// A marker older than this is treated as abandoned.
    pub stale_after_secs: u64,
    /// First retry delay; doubles on every attempt.
    pub initial_backoff_ms: u64,
    /// Upper bound for a single retry delay.
    pub max_backoff_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            stale_after_secs: 30,
            initial_backoff_ms: 20,
            max_backoff_ms: 2_000,
        }
    }
}

impl LockConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms.max(1))
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms.max(self.initial_backoff_ms).max(1))
    }
}

/// Cache-status sweep policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Non-active projects idle longer than this go cold on sweep.
    pub inactivity_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { inactivity_days: 7 }
    }
}

impl CacheConfig {
    pub fn inactivity(&self) -> Duration {
        Duration::from_secs(u64::from(self.inactivity_days) * 24 * 60 * 60)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Run the schema validator on every load, not only before writes.
    pub validate_on_load: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            validate_on_load: true,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: CtxswitchConfig = toml::from_str("[lock]\ntimeout_ms = 250\n").unwrap();
        assert_eq!(cfg.lock.timeout(), Duration::from_millis(250));
        assert_eq!(cfg.lock.stale_after(), Duration::from_secs(30));
        assert_eq!(cfg.cache.inactivity_days, 7);
        assert!(cfg.registry.validate_on_load);
    }

    #[test]
    fn max_backoff_never_below_initial() {
        let lock = LockConfig {
            initial_backoff_ms: 500,
            max_backoff_ms: 10,
            ..LockConfig::default()
        };
        assert_eq!(lock.max_backoff(), Duration::from_millis(500));
    }

    #[test]
    fn inactivity_in_days() {
        let cache = CacheConfig { inactivity_days: 2 };
        assert_eq!(cache.inactivity(), Duration::from_secs(2 * 86_400));
    }
}
