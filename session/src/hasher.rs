//! Id hashing for session namespaces.

use sha2::{Digest, Sha256};

/// One-way hash of a chat or user id, used to build namespaces.
///
/// Output must be stable across process restarts for the same input.
pub trait IdHasher: Send + Sync {
    fn hash(&self, id: &str) -> String;
}

impl<F> IdHasher for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn hash(&self, id: &str) -> String {
        self(id)
    }
}

/// Default hasher: lowercase hex SHA-256 of `salt || id`.
#[derive(Debug, Clone, Default)]
pub struct Sha256Hasher {
    salt: Option<String>,
}

impl Sha256Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_salt(salt: impl Into<String>) -> Self {
        Self {
            salt: Some(salt.into()),
        }
    }
}

impl IdHasher for Sha256Hasher {
    fn hash(&self, id: &str) -> String {
        let mut hasher = Sha256::new();
        if let Some(salt) = &self.salt {
            hasher.update(salt.as_bytes());
        }
        hasher.update(id.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_is_hex_and_stable() {
        let hasher = Sha256Hasher::new();
        let h = hasher.hash("6789012");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(h, Sha256Hasher::new().hash("6789012"));
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            Sha256Hasher::new().hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_salt_changes_output() {
        assert_ne!(
            Sha256Hasher::new().hash("1"),
            Sha256Hasher::with_salt("pepper").hash("1")
        );
    }

    #[test]
    fn test_closure_hasher() {
        let hasher = |id: &str| format!("id{}", id);
        assert_eq!(IdHasher::hash(&hasher, "5"), "id5");
    }
}
