//! Routes a message by its leading entity of one type (`mention`, `hashtag`, `bot_command`, ...).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use telecore_core::{
    Container, Dependency, MessageEntity, MessageHandler, Registry, Result, RouteError, Update,
};
use tracing::{debug, instrument};

use crate::commands::request_overrides;
use crate::handler::{Args, Handler};
use crate::resolver::resolve;

/// Entity router usable on its own or as a link of a handler chain.
///
/// Handlers are keyed by the entity text with exactly one leading `prefix`, e.g. `@alice` for
/// mentions with prefix `@`.
#[derive(Debug)]
pub struct MessageEntityRouter {
    entity_type: String,
    prefix: String,
    container: Option<Container>,
    handlers: HashMap<String, Handler>,
    default_handler: Option<Handler>,
}

impl MessageEntityRouter {
    pub fn new(entity_type: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            prefix: prefix.into(),
            container: None,
            handlers: HashMap::new(),
            default_handler: None,
        }
    }

    pub fn with_container(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    pub fn set_handler(&mut self, entity_str: &str, handler: Handler) -> Result<&mut Self> {
        let key = self.normalize(entity_str);
        if self.handlers.contains_key(&key) {
            return Err(RouteError::DuplicateHandler(key));
        }
        self.handlers.insert(key, handler);
        Ok(self)
    }

    /// Fallback for entities without a specific handler. Replaces any earlier default.
    pub fn set_default_handler(&mut self, handler: Handler) -> &mut Self {
        self.default_handler = Some(handler);
        self
    }

    /// Picks the handler for `entity` in `request.message` and resolves its arguments from the
    /// router's own container.
    ///
    /// The registry gets `messageEntity` and `messageEntityStr`; the handler may also ask for
    /// `request` and `command` (the entity text).
    pub fn dispatch(
        &self,
        entity: &MessageEntity,
        request: &Arc<Update>,
    ) -> Result<(Handler, Args)> {
        self.dispatch_with(entity, request, None)
    }

    /// Like [`MessageEntityRouter::dispatch`], resolving from the registry of the current
    /// dispatch laid over the router's own container. Fails with
    /// [`RouteError::ContainerMissing`] when there is neither.
    pub fn dispatch_with(
        &self,
        entity: &MessageEntity,
        request: &Arc<Update>,
        request_container: Option<&Container>,
    ) -> Result<(Handler, Args)> {
        let mut registry = match (&self.container, request_container) {
            (Some(own), Some(current)) => own.merged(current),
            (Some(own), None) => own.clone(),
            (None, Some(current)) => current.clone(),
            (None, None) => return Err(RouteError::ContainerMissing),
        };
        let message = request
            .message()?
            .ok_or_else(|| RouteError::MalformedUpdate("message is missing".to_string()))?;
        let entity_str = entity.slice(&message.text).ok_or_else(|| {
            RouteError::MalformedUpdate(format!(
                "{} entity {}+{} outside of message text",
                entity.kind, entity.offset, entity.length
            ))
        })?;

        let handler = match self.handlers.get(&entity_str) {
            Some(handler) => {
                debug!(entity = %entity_str, "message entity handler found");
                handler
            }
            None => match &self.default_handler {
                Some(handler) => {
                    debug!(entity = %entity_str, "default message entity handler found");
                    handler
                }
                None => {
                    debug!(entity = %entity_str, "message entity handler not found");
                    return Err(RouteError::EntityHandlerNotFound(entity_str));
                }
            },
        };

        registry.set("messageEntity", Dependency::new(entity.clone()));
        registry.set("messageEntityStr", Dependency::new(entity_str.clone()));

        let mut overrides = request_overrides(request);
        overrides.insert("command", entity_str);

        let args = resolve(&registry, handler, &overrides)?;
        Ok((handler.clone(), args))
    }

    fn normalize(&self, entity_str: &str) -> String {
        if self.prefix.is_empty() {
            return entity_str.to_string();
        }
        format!(
            "{}{}",
            self.prefix,
            entity_str.trim_start_matches(self.prefix.as_str())
        )
    }
}

#[async_trait]
impl MessageHandler for MessageEntityRouter {
    #[instrument(skip(self, request, container))]
    async fn handle_message(
        &self,
        request: &Update,
        container: Option<&Container>,
    ) -> Result<bool> {
        let Some(message) = request.message()? else {
            return Ok(false);
        };
        let Some(entity) = message.leading_entity(&self.entity_type) else {
            return Ok(false);
        };

        let request = Arc::new(request.clone());
        let (handler, args) = self.dispatch_with(entity, &request, container)?;
        handler.call(args).await?;
        Ok(true)
    }
}
