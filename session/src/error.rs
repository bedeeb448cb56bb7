//! Session error types.
//!
//! Returned by [`crate::KvStore`] implementations and by session reads/writes; converted into
//! [`telecore_core::RouteError`] when they surface through routing.

use telecore_core::RouteError;
use thiserror::Error;

/// Errors that can occur while deriving or using a session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Hasher produced an empty hash")]
    EmptyHash,
    #[error("Message has no chat")]
    MissingChat,
}

impl From<sqlx::Error> for SessionError {
    fn from(e: sqlx::Error) -> Self {
        SessionError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        SessionError::Serialization(e.to_string())
    }
}

impl From<SessionError> for RouteError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::MissingChat => {
                RouteError::MalformedUpdate("message.chat is missing".to_string())
            }
            other => RouteError::Session(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
