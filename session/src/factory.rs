//! Derives chat and chat/user scoped sessions.
//!
//! Namespace formats:
//! - chat: `session://chat-{hash(chat.id)}/`
//! - chat/user: `session://chat-{hash(chat.id)}/user-{hash(user.id)}/`

use std::sync::Arc;

use chrono::Duration;
use telecore_core::{Chat, Message, User};
use tracing::info;

use crate::error::{Result, SessionError};
use crate::hasher::{IdHasher, Sha256Hasher};
use crate::session::Session;
use crate::store::KvStore;

/// Builds [`Session`]s over one store. Cheap to clone.
#[derive(Clone)]
pub struct SessionFactory {
    store: Arc<dyn KvStore>,
    hasher: Arc<dyn IdHasher>,
    ttl: Duration,
}

impl SessionFactory {
    /// Factory using [`Sha256Hasher`] without salt and a one-week default TTL.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            hasher: Arc::new(Sha256Hasher::new()),
            ttl: Session::default_ttl(),
        }
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn IdHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn chat_session(&self, chat: &Chat) -> Result<Session> {
        self.chat_session_with(chat, self.hasher.as_ref())
    }

    pub fn chat_session_with(&self, chat: &Chat, hasher: &dyn IdHasher) -> Result<Session> {
        let namespace = format!("session://chat-{}/", scope_hash(hasher, chat.id)?);
        Ok(self.session(namespace))
    }

    pub fn chat_user_session(&self, chat: &Chat, user: &User) -> Result<Session> {
        self.chat_user_session_with(chat, user, self.hasher.as_ref())
    }

    pub fn chat_user_session_with(
        &self,
        chat: &Chat,
        user: &User,
        hasher: &dyn IdHasher,
    ) -> Result<Session> {
        let namespace = format!(
            "session://chat-{}/user-{}/",
            scope_hash(hasher, chat.id)?,
            scope_hash(hasher, user.id)?
        );
        Ok(self.session(namespace))
    }

    /// Chat/user session of a message; chat-only when the message has no sender.
    pub fn from_message(&self, message: &Message) -> Result<Session> {
        let chat = message.chat.as_ref().ok_or(SessionError::MissingChat)?;
        match &message.from {
            Some(user) => self.chat_user_session(chat, user),
            None => self.chat_session(chat),
        }
    }

    fn session(&self, namespace: String) -> Session {
        info!(namespace = %namespace, "step: session derived");
        Session::new(self.store.clone(), namespace).with_ttl(self.ttl)
    }
}

/// Hashes an id into a key-safe, non-empty namespace segment.
fn scope_hash(hasher: &dyn IdHasher, id: i64) -> Result<String> {
    let hashed = hasher.hash(&id.to_string()).replace('/', "_");
    if hashed.is_empty() {
        return Err(SessionError::EmptyHash);
    }
    Ok(hashed)
}
