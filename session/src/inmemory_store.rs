//! # In-memory session store
//!
//! [`KvStore`] kept in a process-local map. Data is lost on restart; meant for tests, local runs
//! and single-process deployments.
//!
//! ## Thread Safety
//!
//! The map sits behind `Arc<RwLock<>>`; clones share the same map.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::store::KvStore;

#[derive(Debug, Clone, Default)]
pub struct InMemoryKvStore {
    entries: Arc<RwLock<HashMap<String, (Vec<u8>, DateTime<Utc>)>>>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held, expired ones included until they are read or purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops every expired key; returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        before - entries.len()
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().await;
        let value = entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(value, _)| value.clone());
        Ok(value)
    }

    async fn set_with_expiry_then_get(
        &self,
        key: &str,
        value: Vec<u8>,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Vec<u8>>> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), (value, expires_at));
        debug!(key = %key, expires_at = %expires_at, "session value stored");
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(value, _)| value.clone()))
    }
}
