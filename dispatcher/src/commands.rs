//! Built-in command routing for `message` updates: `/start`, `/help`, ...

use std::collections::HashMap;
use std::sync::Arc;

use telecore_core::{type_key, Container, Dependency, Registry, Result, RouteError, Update};
use tracing::debug;

use crate::handler::{Args, Handler, Param};
use crate::resolver::resolve;

const BOT_COMMAND: &str = "bot_command";

/// Normalizes a command to exactly one leading `/`.
pub fn normalize_command(command: &str) -> String {
    format!("/{}", command.trim_start_matches('/'))
}

/// Command table behind the dispatcher's built-in `message` handler.
#[derive(Debug, Default)]
pub(crate) struct CommandRouter {
    commands: HashMap<String, Handler>,
}

impl CommandRouter {
    pub(crate) fn new(commands: HashMap<String, Handler>) -> Self {
        Self { commands }
    }

    /// The built-in handler: `(type, request, container)`.
    pub(crate) fn into_handler(self) -> Handler {
        Handler::method(
            "handle_command_message",
            Arc::new(self),
            CommandRouter::handle_command_message,
        )
        .param(Param::named("type"))
        .param(Param::typed::<Update>("request"))
        .param(Param::typed::<Container>("container"))
    }

    /// Finds the handler for the leading `bot_command` of the message and resolves its
    /// arguments. `Ok(None)` when the message carries no leading command.
    pub(crate) fn dispatch_command(
        &self,
        container: &Container,
        request: &Arc<Update>,
    ) -> Result<Option<(Handler, Args)>> {
        let Some(message) = request.message()? else {
            return Ok(None);
        };
        let Some(entity) = message.leading_entity(BOT_COMMAND) else {
            return Ok(None);
        };
        let command_str = entity.slice(&message.text).ok_or_else(|| {
            RouteError::MalformedUpdate(format!(
                "bot_command entity {}+{} outside of message text",
                entity.offset, entity.length
            ))
        })?;
        let command_str = normalize_command(&command_str);

        let Some(handler) = self.commands.get(&command_str) else {
            debug!(command = %command_str, "command handler not found");
            return Err(RouteError::CommandHandlerNotFound(command_str));
        };

        let mut registry = container.clone();
        registry.set("messageEntity", Dependency::new(entity.clone()));
        registry.set("command", Dependency::new(command_str.clone()));

        let overrides = request_overrides(request);
        let args = resolve(&registry, handler, &overrides)?;
        debug!(command = %command_str, handler = %handler.name(), "command found");
        Ok(Some((handler.clone(), args)))
    }

    async fn handle_command_message(self: Arc<Self>, args: Args) -> Result<()> {
        let request = args.get_arc::<Update>(1)?;
        let container = args
            .get_opt::<Container>(2)
            .ok_or(RouteError::ContainerMissing)?;

        match self.dispatch_command(container, &request)? {
            Some((handler, args)) => handler.call(args).await,
            None => Ok(()),
        }
    }
}

/// Overrides carrying the request under both its name and its type key.
pub(crate) fn request_overrides(request: &Arc<Update>) -> Container {
    let dependency = Dependency::from_arc(request.clone());
    let mut overrides = Container::new();
    overrides.insert_dependency("request", dependency.clone());
    overrides.insert_dependency(type_key::<Update>(), dependency);
    overrides
}
