//! Pipeline configuration.
//!
//! One [`StyleConfig`] record is shared by the cache, the batch scheduler and
//! the orchestrator through a [`ConfigHandle`]. Components read it fresh on
//! every operation, so a change applies to everything issued afterwards but not
//! to work already in flight. Values are never validated: a non-positive cache
//! size or a negative delay degrade gracefully instead of failing.

use anyhow::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;

/// Settings read by every pipeline component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleConfig {
    /// Whether computed styles are memoized.
    pub enable_cache: bool,
    /// Maximum number of cache entries. Zero or negative disables effective caching.
    pub cache_size: i64,
    /// Whether rule writes are coalesced and flushed later.
    pub enable_batch_updates: bool,
    /// Delay in milliseconds between arming and flushing a batch.
    pub batch_delay_ms: i64,
    /// Arm flushes on a plain timer instead of waiting for an animation frame.
    pub enable_async: bool,
    /// Emit a diagnostic record per flush.
    pub enable_performance_monitoring: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            enable_cache: true,
            cache_size: 1000,
            enable_batch_updates: true,
            batch_delay_ms: 16,
            enable_async: false,
            enable_performance_monitoring: false,
        }
    }
}

impl StyleConfig {
    /// Load configuration from environment variables, falling back to defaults.
    ///
    /// Reads the following environment variables:
    /// - `STYLE_CACHE`: `0` disables the cache
    /// - `STYLE_CACHE_SIZE`: maximum cache entries (default: 1000)
    /// - `STYLE_BATCH`: `0` writes rules immediately
    /// - `STYLE_BATCH_DELAY_MS`: batch delay (default: 16)
    /// - `STYLE_ASYNC`: `1` arms flushes on a timer only
    /// - `STYLE_PERF`: `1` enables flush diagnostics
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enable_cache: env_flag("STYLE_CACHE").unwrap_or(defaults.enable_cache),
            cache_size: env_number("STYLE_CACHE_SIZE").unwrap_or(defaults.cache_size),
            enable_batch_updates: env_flag("STYLE_BATCH").unwrap_or(defaults.enable_batch_updates),
            batch_delay_ms: env_number("STYLE_BATCH_DELAY_MS").unwrap_or(defaults.batch_delay_ms),
            enable_async: env_flag("STYLE_ASYNC").unwrap_or(defaults.enable_async),
            enable_performance_monitoring: env_flag("STYLE_PERF")
                .unwrap_or(defaults.enable_performance_monitoring),
        }
    }

    /// Parse a JSON object with camelCase keys; missing keys keep their defaults.
    ///
    /// # Errors
    /// Returns an error if the text is not a valid configuration object.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Batch delay as a duration; negative delays clamp to zero.
    #[inline]
    pub fn batch_delay(&self) -> core::time::Duration {
        core::time::Duration::from_millis(self.batch_delay_ms.max(0) as u64)
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().map(|value| {
        let value = value.trim();
        value == "1" || value.eq_ignore_ascii_case("true")
    })
}

fn env_number(name: &str) -> Option<i64> {
    env::var(name).ok().and_then(|value| value.trim().parse().ok())
}

/// Shared, mutable configuration record.
///
/// Cloning the handle shares the record; use [`ConfigHandle::detached`] for an
/// independent copy.
#[derive(Clone, Debug, Default)]
pub struct ConfigHandle {
    inner: Arc<RwLock<StyleConfig>>,
}

impl ConfigHandle {
    /// Handle over the given configuration.
    pub fn new(config: StyleConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Snapshot of the current values.
    #[inline]
    pub fn get(&self) -> StyleConfig {
        self.inner.read().clone()
    }

    /// Replace every value.
    pub fn set(&self, config: StyleConfig) {
        *self.inner.write() = config;
    }

    /// Mutate values in place.
    pub fn update(&self, apply: impl FnOnce(&mut StyleConfig)) {
        apply(&mut *self.inner.write());
    }

    /// Restore defaults.
    pub fn reset(&self) {
        self.set(StyleConfig::default());
    }

    /// Independent handle starting from the current values.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self::new(self.get())
    }
}
