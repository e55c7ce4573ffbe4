//! In-memory forecast cache with write-time TTL and a maximum entry count.
//!
//! Backed by `moka::sync::Cache`: inserts are atomic with respect to
//! concurrent reads, expired entries are never returned, and capacity
//! eviction happens in moka's maintenance tasks.

use std::fmt;
use std::time::Duration;

use addrcast_core::{CacheConfig, ConfigError};
use moka::sync::Cache;

use crate::types::Address;

/// Derives the cache key for an address.
pub trait CacheKeyStrategy: Send + Sync + fmt::Debug {
    fn key(&self, address: &Address) -> String;
}

/// Keys by zipcode alone, so every address in a zipcode shares one entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipcodeKey;

impl CacheKeyStrategy for ZipcodeKey {
    fn key(&self, address: &Address) -> String {
        address.zipcode.clone()
    }
}

/// Keys by the whole address, case- and whitespace-insensitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullAddressKey;

impl CacheKeyStrategy for FullAddressKey {
    fn key(&self, address: &Address) -> String {
        [
            &address.street,
            &address.city,
            &address.state,
            &address.zipcode,
        ]
        .iter()
        .map(|part| part.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join("|")
    }
}

/// Bounded, time-expiring store of forecast payloads.
pub struct ResultCache {
    entries: Cache<String, String>,
    ttl: Duration,
    max_entries: u64,
}

impl fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCache")
            .field("ttl", &self.ttl)
            .field("max_entries", &self.max_entries)
            .field("entry_count", &self.entries.entry_count())
            .finish()
    }
}

impl ResultCache {
    /// Create a cache; both limits must be non-zero.
    pub fn new(ttl: Duration, max_entries: u64) -> Result<Self, ConfigError> {
        if ttl.is_zero() {
            return Err(ConfigError::Invalid(
                "cache TTL must be greater than 0".to_string(),
            ));
        }
        if max_entries == 0 {
            return Err(ConfigError::Invalid(
                "cache max entries must be greater than 0".to_string(),
            ));
        }

        tracing::info!(
            "Initializing the cache (expires={:?} maxEntries={})",
            ttl,
            max_entries
        );

        let entries = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Ok(Self {
            entries,
            ttl,
            max_entries,
        })
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self, ConfigError> {
        let ttl = Duration::from_secs(config.ttl_minutes.saturating_mul(60));
        Self::new(ttl, config.max_entries)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_entries(&self) -> u64 {
        self.max_entries
    }

    /// Look up a live payload. Entries older than the TTL are absent.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key)
    }

    /// Insert or fully replace the entry for `key`, resetting its age.
    pub fn put(&self, key: impl Into<String>, payload: impl Into<String>) {
        self.entries.insert(key.into(), payload.into());
    }

    /// Number of live entries, after pending evictions have been applied.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
