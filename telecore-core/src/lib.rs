//! # telecore-core
//!
//! Shared types for the webhook router: the [`Update`] payload and its typed views, the closed
//! [`UpdateType`] set, the dependency [`Container`] handlers are resolved from, the
//! [`MessageHandler`] trait, the [`RouteError`] taxonomy and tracing initialization. Used by
//! `handler-chain`, `session` and `dispatcher`.

pub mod container;
pub mod error;
pub mod handler;
pub mod logger;
pub mod types;

pub use container::{type_key, Container, Dependency, Registry};
pub use error::{Result, RouteError};
pub use handler::MessageHandler;
pub use logger::init_tracing;
pub use types::{Chat, Message, MessageEntity, Update, UpdateType, User};
