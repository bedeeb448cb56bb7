//! Application config, loaded from env (call `dotenvy::dotenv()` first to pick up `.env`).

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Duration;
use session::{InMemoryKvStore, KvStore, Sha256Hasher, SessionFactory, SqliteKvStore};
use tracing::info;

const DEFAULT_LOG_FILE: &str = "logs/telecore.log";
const DEFAULT_SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// LOG_FILE
    pub log_file: String,
    /// SESSION_DATABASE_URL; `None` keeps sessions in memory
    pub session_database_url: Option<String>,
    /// SESSION_HASH_SALT
    pub session_hash_salt: Option<String>,
    /// SESSION_TTL_SECS
    pub session_ttl_secs: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
        let session_database_url = non_empty_var("SESSION_DATABASE_URL");
        let session_hash_salt = non_empty_var("SESSION_HASH_SALT");
        let session_ttl_secs = match env::var("SESSION_TTL_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|secs| *secs > 0)
                .with_context(|| {
                    format!("SESSION_TTL_SECS must be a positive integer, got \"{}\"", raw)
                })?,
            Err(_) => DEFAULT_SESSION_TTL_SECS,
        };

        Ok(Self {
            log_file,
            session_database_url,
            session_hash_salt,
            session_ttl_secs,
        })
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_secs)
    }

    /// SQLite file path of SESSION_DATABASE_URL, without a `sqlite:` / `file:` scheme.
    pub fn session_database_path(&self) -> Option<&str> {
        self.session_database_url.as_deref().map(|url| {
            url.strip_prefix("sqlite://")
                .or_else(|| url.strip_prefix("sqlite:"))
                .or_else(|| url.strip_prefix("file:"))
                .unwrap_or(url)
        })
    }

    /// Session factory over the configured store, hasher salt and TTL.
    pub async fn session_factory(&self) -> Result<SessionFactory> {
        let store: Arc<dyn KvStore> = match self.session_database_path() {
            Some(path) => {
                info!(path = %path, "step: session store sqlite");
                Arc::new(
                    SqliteKvStore::new(path)
                        .await
                        .with_context(|| format!("open session database {}", path))?,
                )
            }
            None => {
                info!("step: session store in-memory");
                Arc::new(InMemoryKvStore::new())
            }
        };

        let hasher = match &self.session_hash_salt {
            Some(salt) => Sha256Hasher::with_salt(salt.clone()),
            None => Sha256Hasher::new(),
        };

        Ok(SessionFactory::new(store)
            .with_hasher(Arc::new(hasher))
            .with_ttl(self.session_ttl()))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
