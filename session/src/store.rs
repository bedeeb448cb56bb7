use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// Boundary to the external key-value store holding session blobs.
///
/// Keys are full keys (`namespace + key`); values are opaque bytes that must come back unchanged.
/// Implementations give no mutual exclusion around read-modify-write sequences.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the stored value, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value` with an absolute expiry, then reads the key back, as one transaction.
    async fn set_with_expiry_then_get(
        &self,
        key: &str,
        value: Vec<u8>,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Vec<u8>>>;
}
