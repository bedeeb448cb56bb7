//! # Handler chain
//!
//! Composes independent message handlers into one: each inner handler gets the message in turn
//! and the first one that reports it handled the message ends the chain.

use std::sync::Arc;

use async_trait::async_trait;
use telecore_core::{Container, MessageHandler, Result, Update};
use tracing::{debug, instrument};

/// Ordered fall-through composition of [`MessageHandler`]s. Itself a [`MessageHandler`], so chains
/// nest.
#[derive(Clone, Default)]
pub struct MessageHandlerChain {
    handlers: Vec<Arc<dyn MessageHandler>>,
}

impl MessageHandlerChain {
    /// Creates an empty chain. An empty chain handles nothing.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Appends a handler; handlers are tried in the order they were added.
    pub fn add_handler(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait]
impl MessageHandler for MessageHandlerChain {
    /// Returns `true` at the first inner handler that returns `true`. An inner error stops the
    /// chain and propagates. Every inner handler sees the same `container`.
    #[instrument(skip(self, request, container))]
    async fn handle_message(
        &self,
        request: &Update,
        container: Option<&Container>,
    ) -> Result<bool> {
        for (position, handler) in self.handlers.iter().enumerate() {
            if handler.handle_message(request, container).await? {
                debug!(position, "step: message handled");
                return Ok(true);
            }
            debug!(position, "step: handler passed");
        }
        debug!("step: no handler in chain took the message");
        Ok(false)
    }
}

// Integration tests live in tests/handler_chain_test.rs
