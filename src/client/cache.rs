//! Explicit query cache.
//!
//! Read operations are cached under a key of operation name plus serialized
//! parameters. The cache is the single authority per key: concurrent fetches
//! of one key are coalesced into a single in-flight request, failed fetches
//! retain the previously cached value alongside an error flag, and mutations
//! force refetches by invalidating key prefixes.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::{watch, Mutex};

use super::ClientError;

/// Cache key: operation name followed by serialized parameters,
/// e.g. `["dailyPollution", "day", "19797"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Whether this key falls under `prefix` (prefix-wise component match).
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

/// Lifecycle of a cached query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Loading,
    Success,
    Error,
}

/// Observable snapshot of one cache entry.
#[derive(Debug, Clone)]
pub struct QuerySnapshot {
    pub status: QueryStatus,
    pub value: Option<Value>,
    pub error: Option<ClientError>,
    pub updated_at: Option<DateTime<Utc>>,
    /// True when an invalidation arrived after the value was fetched.
    pub is_stale: bool,
}

#[derive(Debug, Clone)]
struct Entry {
    status: QueryStatus,
    value: Option<Value>,
    error: Option<ClientError>,
    updated_at: Option<DateTime<Utc>>,
    /// Generation the value was fetched under; compared against the slot
    /// generation to decide freshness.
    generation: u64,
}

struct Slot {
    /// Bumped by every invalidation covering this key.
    generation: u64,
    entry: Entry,
    inflight: Option<watch::Receiver<()>>,
}

impl Slot {
    fn empty() -> Self {
        Self {
            generation: 1,
            entry: Entry {
                status: QueryStatus::Loading,
                value: None,
                error: None,
                updated_at: None,
                generation: 0,
            },
            inflight: None,
        }
    }

    fn is_fresh(&self) -> bool {
        self.entry.status == QueryStatus::Success && self.entry.generation == self.generation
    }
}

enum Ticket {
    Hit(Value),
    Wait(watch::Receiver<()>),
    Run { tx: watch::Sender<()>, generation: u64 },
}

/// Cache map from query key to `{status, value, error, timestamp}` with
/// per-key request coalescing.
#[derive(Clone, Default)]
pub struct QueryCache {
    slots: Arc<Mutex<HashMap<QueryKey, Slot>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the value for `key`, consulting the cache first.
    ///
    /// A fresh entry is returned without touching the network. When another
    /// fetch for the same key is already in flight, this call awaits its
    /// outcome instead of issuing a duplicate request. On failure the
    /// previously cached value (if any) is returned and the error is retained
    /// in the entry; with no previous value the error itself is returned.
    /// `retries` extra attempts are made before a failure is recorded.
    pub async fn fetch<F, Fut>(
        &self,
        key: QueryKey,
        retries: u32,
        fetcher: F,
    ) -> Result<Value, ClientError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Value, ClientError>>,
    {
        let ticket = {
            let mut slots = self.slots.lock().await;
            let slot = slots.entry(key.clone()).or_insert_with(Slot::empty);

            if slot.is_fresh() {
                Ticket::Hit(slot.entry.value.clone().unwrap_or(Value::Null))
            } else if let Some(rx) = &slot.inflight {
                Ticket::Wait(rx.clone())
            } else {
                let (tx, rx) = watch::channel(());
                slot.inflight = Some(rx);
                slot.entry.status = QueryStatus::Loading;
                Ticket::Run {
                    tx,
                    generation: slot.generation,
                }
            }
        };

        match ticket {
            Ticket::Hit(value) => Ok(value),
            Ticket::Wait(mut rx) => {
                // Wakes when the in-flight request publishes its outcome.
                let _ = rx.changed().await;
                self.resolve(&key).await
            }
            Ticket::Run { tx, generation } => {
                let mut attempt = 0;
                let outcome = loop {
                    match fetcher().await {
                        Ok(value) => break Ok(value),
                        Err(_) if attempt < retries => attempt += 1,
                        Err(err) => break Err(err),
                    }
                };

                let result = {
                    let mut slots = self.slots.lock().await;
                    let slot = slots
                        .get_mut(&key)
                        .expect("slot exists while request in flight");
                    slot.inflight = None;

                    match outcome {
                        Ok(value) => {
                            slot.entry = Entry {
                                status: QueryStatus::Success,
                                value: Some(value.clone()),
                                error: None,
                                updated_at: Some(Utc::now()),
                                // An invalidation that raced the request keeps
                                // the entry stale and forces the next refetch.
                                generation,
                            };
                            Ok(value)
                        }
                        Err(err) => {
                            slot.entry.status = QueryStatus::Error;
                            slot.entry.error = Some(err.clone());
                            match &slot.entry.value {
                                Some(previous) => Ok(previous.clone()),
                                None => Err(err),
                            }
                        }
                    }
                };

                let _ = tx.send(());
                result
            }
        }
    }

    /// Mark stale every entry whose key starts with `prefix`.
    ///
    /// Stale entries keep serving their value to `peek` but force a refetch on
    /// the next `fetch`.
    pub async fn invalidate(&self, prefix: &QueryKey) {
        let mut slots = self.slots.lock().await;
        for (key, slot) in slots.iter_mut() {
            if key.starts_with(prefix) {
                slot.generation += 1;
            }
        }
    }

    /// Observe the entry for `key` without fetching.
    pub async fn peek(&self, key: &QueryKey) -> Option<QuerySnapshot> {
        let slots = self.slots.lock().await;
        slots.get(key).map(|slot| QuerySnapshot {
            status: slot.entry.status,
            value: slot.entry.value.clone(),
            error: slot.entry.error.clone(),
            updated_at: slot.entry.updated_at,
            is_stale: slot.entry.status == QueryStatus::Success && !slot.is_fresh(),
        })
    }

    async fn resolve(&self, key: &QueryKey) -> Result<Value, ClientError> {
        let mut slots = self.slots.lock().await;
        let slot = slots.get_mut(key).expect("slot exists after in-flight wake");
        // A runner dropped mid-flight never publishes; clear its dead channel
        // so the next fetch can take over the key.
        if slot.entry.status == QueryStatus::Loading {
            slot.inflight = None;
        }
        match &slot.entry.value {
            Some(value) => Ok(value.clone()),
            None => Err(slot
                .entry
                .error
                .clone()
                .unwrap_or_else(|| ClientError::Failed("Query produced no result".to_string()))),
        }
    }
}
