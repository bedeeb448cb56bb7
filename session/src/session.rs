//! Namespaced view over a [`KvStore`].

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::store::KvStore;

/// Session of one chat or one chat/user pair. Every key is stored as `namespace + key`.
///
/// Concurrent writers to the same key are not coordinated; the last write wins.
#[derive(Clone)]
pub struct Session {
    namespace: String,
    store: Arc<dyn KvStore>,
    default_ttl: Duration,
}

impl Session {
    /// Expiry used by [`Session::set`] when none is given.
    pub fn default_ttl() -> Duration {
        Duration::weeks(1)
    }

    pub fn new(store: Arc<dyn KvStore>, namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            store,
            default_ttl: Self::default_ttl(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    /// Serializes `value` and stores it until `expires_at` (default: now + the session TTL).
    pub async fn set<T>(
        &self,
        key: &str,
        value: &T,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let expires_at = expires_at.unwrap_or_else(|| Utc::now() + self.default_ttl);
        let blob = serde_json::to_vec(value)?;
        self.store
            .set_with_expiry_then_get(&self.key(key), blob, expires_at)
            .await?;
        Ok(())
    }

    /// Reads and deserializes a value; `None` if absent or expired.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(&self.key(key)).await? {
            Some(blob) => Ok(Some(serde_json::from_slice(&blob)?)),
            None => Ok(None),
        }
    }

    /// Like [`Session::get`] but falls back to `default`.
    pub async fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        Ok(self.get(key).await?.unwrap_or(default))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("namespace", &self.namespace)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}
