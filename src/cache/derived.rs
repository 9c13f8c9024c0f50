use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::marker::PhantomData;
use std::sync::Arc;

use super::backend::CacheBackend;
use crate::config::Config;
use crate::results::ResultEvent;

pub const TEAM_SCORES: &str = "team-scores";
pub const ATHLETE_RANKINGS: &str = "athlete-rankings";

/// Scope for derived entries of one database under one configuration.
///
/// Hashes the database location with every setting that changes a derived
/// view (ranking window, points, relay legs, event classification). The
/// database path setting itself is left out; `location` already covers it.
pub fn cache_scope(location: &str, config: &Config) -> Result<String> {
    let settings = serde_json::to_vec(&(
        &config.ranking,
        &config.scoring,
        &config.relay,
        &config.events,
    ))
    .context("Failed to serialize settings for cache scope")?;

    let mut hasher = Sha256::new();
    hasher.update(location.as_bytes());
    hasher.update([0u8]);
    hasher.update(&settings);
    let digest = format!("{:x}", hasher.finalize());
    Ok(digest[..16].to_string())
}

/// Reacts to changes in the result store.
pub trait ResultListener {
    fn on_result_event(&self, event: &ResultEvent);
}

/// A typed, per-meet view stored as JSON in a shared backend.
pub struct DerivedCache<V> {
    namespace: &'static str,
    scope: String,
    backend: Arc<dyn CacheBackend>,
    _value: PhantomData<fn() -> V>,
}

impl<V> Clone for DerivedCache<V> {
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace,
            scope: self.scope.clone(),
            backend: Arc::clone(&self.backend),
            _value: PhantomData,
        }
    }
}

impl<V: Serialize + DeserializeOwned> DerivedCache<V> {
    /// Entries are keyed `namespace:scope:meet`; see [`cache_scope`].
    pub fn new(namespace: &'static str, scope: &str, backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            namespace,
            scope: scope.to_string(),
            backend,
            _value: PhantomData,
        }
    }

    fn key(&self, meet: &str) -> String {
        format!("{}:{}:{}", self.namespace, self.scope, meet)
    }

    /// Cached value; an entry that no longer decodes counts as a miss.
    pub fn get(&self, meet: &str) -> Option<V> {
        let bytes = self.backend.get(&self.key(meet))?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(
                    namespace = self.namespace,
                    meet,
                    error = %e,
                    "discarding undecodable cache entry"
                );
                None
            }
        }
    }

    pub fn replace(&self, meet: &str, value: &V) -> Result<()> {
        let bytes = serde_json::to_vec(value).context("Failed to serialize cache entry")?;
        self.backend.replace(&self.key(meet), bytes)
    }

    pub fn invalidate(&self, meet: &str) -> Result<()> {
        self.backend.invalidate(&self.key(meet))
    }

    /// Return the cached value, computing and storing it on a miss.
    ///
    /// A failed write is logged and the computed value still returned.
    pub fn compute_if_absent<F>(&self, meet: &str, compute: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(value) = self.get(meet) {
            tracing::debug!(namespace = self.namespace, meet, "cache hit");
            return Ok(value);
        }

        let value = compute()?;
        if let Err(e) = self.replace(meet, &value) {
            tracing::warn!(
                namespace = self.namespace,
                meet,
                error = %e,
                "failed to store cache entry"
            );
        }
        Ok(value)
    }
}

impl<V: Serialize + DeserializeOwned> ResultListener for DerivedCache<V> {
    fn on_result_event(&self, event: &ResultEvent) {
        for meet in event.affected_meets() {
            match self.invalidate(meet) {
                Ok(()) => tracing::debug!(namespace = self.namespace, meet, "invalidated"),
                Err(e) => tracing::warn!(
                    namespace = self.namespace,
                    meet,
                    error = %e,
                    "failed to invalidate cache entry"
                ),
            }
        }
    }
}
