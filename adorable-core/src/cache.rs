//! Shared key-value cache.
//!
//! The rate limiter, the circuit breakers, the API key store and the
//! request metrics all keep their state in a [`Cache`], so several
//! processes can share it when it is backed by an external store.

use parking_lot::Mutex;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The cached value is not an integer")]
    NotAnInteger,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;
    /// Atomically adds `delta`, starting at 0 for a missing key.
    ///
    /// An existing TTL is kept, a new key never expires.
    fn incr_by(&self, key: &str, delta: i64) -> Result<i64>;
    fn expire(&self, key: &str, ttl: Duration) -> Result<()>;
    /// `None` if the key does not exist or never expires.
    fn ttl(&self, key: &str) -> Result<Option<Duration>>;
    fn delete(&self, key: &str) -> Result<()>;

    fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        self.get(key)?
            .map(|v| v.parse::<i64>().map_err(|_| Error::NotAnInteger))
            .transpose()
    }

    /// Succeeds only for the first caller if the key did not exist.
    fn set_if_absent(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<bool>;

    /// Health probe.
    fn ping(&self) -> Result<()> {
        self.get("__ping__").map(|_| ())
    }
}

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// Process local cache. Expired entries are dropped lazily on access.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_live_entry<T>(&self, key: &str, f: impl FnOnce(Option<&mut Entry>) -> T) -> T {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if entries.get(key).map(|e| e.is_expired(now)).unwrap_or(false) {
            entries.remove(key);
        }
        f(entries.get_mut(key))
    }
}

impl Cache for InMemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.with_live_entry(key, |e| e.map(|e| e.value.clone())))
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let entry = Entry {
            value: value.to_owned(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.lock().insert(key.to_owned(), entry);
        Ok(())
    }

    fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if entries.get(key).map(|e| e.is_expired(now)).unwrap_or(false) {
            entries.remove(key);
        }
        let entry = entries.entry(key.to_owned()).or_insert_with(|| Entry {
            value: "0".into(),
            expires_at: None,
        });
        let current = entry
            .value
            .parse::<i64>()
            .map_err(|_| Error::NotAnInteger)?;
        let next = current + delta;
        entry.value = next.to_string();
        Ok(next)
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        self.with_live_entry(key, |e| {
            if let Some(e) = e {
                e.expires_at = Some(Instant::now() + ttl);
            }
        });
        Ok(())
    }

    fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let now = Instant::now();
        Ok(self.with_live_entry(key, |e| {
            e.and_then(|e| e.expires_at)
                .map(|at| at.saturating_duration_since(now))
        }))
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn set_if_absent(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if let Some(e) = entries.get(key) {
            if !e.is_expired(now) {
                return Ok(false);
            }
        }
        entries.insert(
            key.to_owned(),
            Entry {
                value: value.to_owned(),
                expires_at: ttl.map(|ttl| now + ttl),
            },
        );
        Ok(true)
    }
}
