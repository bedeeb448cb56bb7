//! Update routing for telecore bots.
//!
//! An [`UpdateDispatcher`] picks the handler registered for the update type present in a
//! payload, resolves the handler's declared parameters from a [`Container`] and returns both as
//! a [`Dispatch`]. `message` updates go through the built-in command router unless the
//! application registers its own `message` route; [`MessageEntityRouter`] routes by mentions,
//! hashtags and other leading entities and plugs into a handler chain.

mod commands;
pub mod controller;
pub mod dispatcher;
pub mod entity;
pub mod handler;
pub mod resolver;

pub use commands::normalize_command;
pub use controller::{Controller, ExecuteOutcome};
pub use dispatcher::{Dispatch, DispatcherBuilder, UpdateDispatcher};
pub use entity::MessageEntityRouter;
pub use handler::{Args, Handler, HandlerFuture, Param};
pub use resolver::resolve;
pub use telecore_core::{type_key, Container, Dependency, Registry};
