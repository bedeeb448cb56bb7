//! Session crate: per-conversation state over an external key-value store.
//!
//! ## Modules
//!
//! - [`error`] – Session error types
//! - [`store`] – KvStore trait (the external store boundary)
//! - [`inmemory_store`] – InMemoryKvStore
//! - [`sqlite_store`] – SqliteKvStore (sqlx)
//! - [`hasher`] – IdHasher, Sha256Hasher
//! - [`session`] – Session
//! - [`factory`] – SessionFactory

pub mod error;
pub mod factory;
pub mod hasher;
pub mod inmemory_store;
pub mod session;
pub mod sqlite_store;
pub mod store;

pub use error::SessionError;
pub use factory::SessionFactory;
pub use hasher::{IdHasher, Sha256Hasher};
pub use inmemory_store::InMemoryKvStore;
pub use session::Session;
pub use sqlite_store::SqliteKvStore;
pub use store::KvStore;
