//! Process-wide response cache.
//!
//! Keys are `{path}|{METHOD}|{sha256 of the canonical JSON payload}`. The
//! path comes first so that every response of one family can be dropped by
//! prefix after a mutation.

use std::time::Duration;

use dashmap::DashMap;
use reqwest::Method;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::time::Instant;

use super::config::CachePolicy;

/// Result of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Younger than `stale_after`; serve without a request.
    Fresh(Value),
    /// Older than `stale_after` but not evicted.
    Stale(Value),
    Miss,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stored_at: Instant,
    stale_after: Duration,
    evict_after: Duration,
}

impl CacheEntry {
    fn is_evicted(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) >= self.evict_after
    }

    fn lookup(&self, now: Instant) -> Lookup {
        let age = now.saturating_duration_since(self.stored_at);
        if age >= self.evict_after {
            Lookup::Miss
        } else if age >= self.stale_after {
            Lookup::Stale(self.value.clone())
        } else {
            Lookup::Fresh(self.value.clone())
        }
    }
}

/// Shared key/value store for envelope bodies. Last write wins.
#[derive(Debug, Default)]
pub struct RequestCache {
    entries: DashMap<String, CacheEntry>,
}

impl RequestCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the cache key of a request.
    ///
    /// Object keys are sorted before hashing, so payloads that differ only
    /// in field order share a key.
    #[must_use]
    pub fn key(method: &Method, path: &str, payload: Option<&Value>) -> String {
        let canonical = payload.map_or_else(|| "null".to_string(), |value| canonicalize(value).to_string());
        let digest = Sha256::digest(canonical.as_bytes());
        format!(
            "/{}|{}|{}",
            path.trim_start_matches('/'),
            method.as_str(),
            hex::encode(digest)
        )
    }

    pub fn get(&self, key: &str) -> Lookup {
        let now = Instant::now();
        let lookup = match self.entries.get(key) {
            Some(entry) => entry.lookup(now),
            None => return Lookup::Miss,
        };
        if lookup == Lookup::Miss {
            self.entries.remove_if(key, |_, entry| entry.is_evicted(now));
        }
        lookup
    }

    pub fn insert(&self, key: String, value: Value, policy: &CachePolicy) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
                stale_after: policy.stale_after,
                evict_after: policy.evict_after,
            },
        );
    }

    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every key starting with `prefix`. Returns how many were dropped.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        self.remove_where(|key| key.starts_with(prefix))
    }

    /// Drop every response of `family`: `/{family}` and `/{family}/...`,
    /// but not `/{family}-archive`.
    pub fn invalidate_family(&self, family: &str) -> usize {
        let family = family.trim_matches('/');
        let exact = format!("/{family}|");
        let nested = format!("/{family}/");
        let removed = self.remove_where(|key| key.starts_with(&exact) || key.starts_with(&nested));
        tracing::debug!(family, removed, "invalidated cache family");
        removed
    }

    /// Drop entries older than their `evict_after`.
    pub fn purge_evicted(&self) -> usize {
        let now = Instant::now();
        self.remove_where_entry(|entry| entry.is_evicted(now))
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_where(&self, matches: impl Fn(&str) -> bool) -> usize {
        let mut removed = 0;
        self.entries.retain(|key, _| {
            let keep = !matches(key);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    fn remove_where_entry(&self, matches: impl Fn(&CacheEntry) -> bool) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !matches(entry);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }
}

/// Rebuild `value` with object keys in sorted order.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), canonicalize(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
