//! Routes an incoming update to the handler registered for its update type.
//!
//! Setup happens once through [`DispatcherBuilder`]; the built [`UpdateDispatcher`] is immutable
//! and can be shared across tasks behind an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use session::{Session, SessionFactory};
use telecore_core::{
    type_key, Container, Dependency, Registry, Result, RouteError, Update, UpdateType,
};
use tracing::{debug, instrument};

use crate::commands::{normalize_command, request_overrides, CommandRouter};
use crate::handler::{Args, Handler, HandlerFuture};
use crate::resolver::resolve;

enum Route {
    /// The built-in `message` route backed by the command table.
    Commands,
    Custom(Handler),
}

/// Registration phase of an [`UpdateDispatcher`].
pub struct DispatcherBuilder {
    container: Container,
    sessions: SessionFactory,
    routes: Vec<(UpdateType, Route)>,
    commands: HashMap<String, Handler>,
}

impl DispatcherBuilder {
    /// Builder with the built-in command router registered as the `message` route.
    pub fn new(container: Container, sessions: SessionFactory) -> Self {
        let mut builder = Self::without_commands(container, sessions);
        builder.routes.push((UpdateType::Message, Route::Commands));
        builder
    }

    /// Builder with an empty route table; `message` is free for an application handler.
    pub fn without_commands(container: Container, sessions: SessionFactory) -> Self {
        Self {
            container,
            sessions,
            routes: Vec::new(),
            commands: HashMap::new(),
        }
    }

    /// Registers `handler` for the update type named `update_type`.
    pub fn add_handler(&mut self, update_type: &str, handler: Handler) -> Result<&mut Self> {
        let update_type: UpdateType = update_type.parse()?;
        if self.routes.iter().any(|(t, _)| *t == update_type) {
            return Err(RouteError::DuplicateHandler(update_type.to_string()));
        }
        debug!(update_type = %update_type, handler = %handler.name(), "handler registered");
        self.routes.push((update_type, Route::Custom(handler)));
        Ok(self)
    }

    /// Registers `handler` for a bot command; `start`, `/start` and `//start` are the same command.
    pub fn add_command(&mut self, command: &str, handler: Handler) -> Result<&mut Self> {
        let command = normalize_command(command);
        if self.commands.contains_key(&command) {
            return Err(RouteError::DuplicateHandler(command));
        }
        debug!(command = %command, handler = %handler.name(), "command registered");
        self.commands.insert(command, handler);
        Ok(self)
    }

    pub fn build(self) -> UpdateDispatcher {
        let mut commands = Some(CommandRouter::new(self.commands));
        let routes = self
            .routes
            .into_iter()
            .map(|(update_type, route)| {
                let handler = match route {
                    Route::Custom(handler) => handler,
                    // At most one built-in route: `message` can only be registered once.
                    Route::Commands => commands.take().unwrap_or_default().into_handler(),
                };
                (update_type, handler)
            })
            .collect();

        UpdateDispatcher {
            container: self.container,
            sessions: self.sessions,
            routes,
        }
    }
}

/// A resolved route, ready to run.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub update_type: UpdateType,
    pub handler: Handler,
    pub args: Args,
}

impl Dispatch {
    pub fn invoke(self) -> HandlerFuture {
        self.handler.call(self.args)
    }
}

/// Immutable route table plus the base container and session factory.
pub struct UpdateDispatcher {
    container: Container,
    sessions: SessionFactory,
    routes: Vec<(UpdateType, Handler)>,
}

impl UpdateDispatcher {
    /// Registered update types, in registration order.
    pub fn list_handlers(&self) -> Vec<UpdateType> {
        self.routes.iter().map(|(t, _)| *t).collect()
    }

    /// Selects the first registered update type present in `update` and resolves its handler.
    ///
    /// `Ok(None)` when no registered type is present.
    #[instrument(skip(self, update))]
    pub fn dispatch(&self, update: &Update) -> Result<Option<Dispatch>> {
        let Some((update_type, handler)) = self.routes.iter().find(|(t, _)| update.has(*t)) else {
            debug!("no handler for update");
            return Ok(None);
        };

        let session = self.session_for(*update_type, update)?;

        let mut registry = self.container.clone();
        registry.set("type", Dependency::new(update_type.as_str().to_string()));
        registry.set(
            type_key::<Session>(),
            session.map(Dependency::new).unwrap_or_else(Dependency::null),
        );
        let snapshot = registry.clone();
        registry.set(type_key::<Container>(), Dependency::new(snapshot));

        let overrides = request_overrides(&Arc::new(update.clone()));
        let args = resolve(&registry, handler, &overrides)?;
        debug!(update_type = %update_type, handler = %handler.name(), "handler found");

        Ok(Some(Dispatch {
            update_type: *update_type,
            handler: handler.clone(),
            args,
        }))
    }

    fn session_for(&self, update_type: UpdateType, update: &Update) -> Result<Option<Session>> {
        let message = match update_type {
            UpdateType::Message => update.message()?,
            UpdateType::CallbackQuery => update.callback_query_message()?,
            _ => None,
        };
        match message {
            Some(message) => Ok(Some(self.sessions.from_message(&message)?)),
            None => Ok(None),
        }
    }
}
