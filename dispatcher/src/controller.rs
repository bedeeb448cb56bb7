//! Webhook entry point: decode a request body, dispatch it, run the handler.

use std::sync::Arc;

use telecore_core::{Result, Update, UpdateType};
use tracing::{debug, error, info};

use crate::dispatcher::UpdateDispatcher;

/// What happened to one webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// A handler for this update type ran to completion. For a `message` route built with
    /// `Handler::from_message_handler` this includes the case where no inner handler took the
    /// message.
    Handled(UpdateType),
    /// No registered update type was present in the payload.
    Unrouted,
    /// Decoding, routing or the handler failed; the error text is kept for the caller.
    Failed(String),
}

/// Runs deliveries against a shared dispatcher. Never panics or propagates errors; every failure
/// is logged and reported as [`ExecuteOutcome::Failed`].
#[derive(Clone)]
pub struct Controller {
    dispatcher: Arc<UpdateDispatcher>,
}

impl Controller {
    pub fn new(dispatcher: Arc<UpdateDispatcher>) -> Self {
        Self { dispatcher }
    }

    pub async fn execute(&self, body: &[u8]) -> ExecuteOutcome {
        match self.run(body).await {
            Ok(Some(update_type)) => {
                info!(update_type = %update_type, "step: update handled");
                ExecuteOutcome::Handled(update_type)
            }
            Ok(None) => {
                debug!("no handler found for update");
                ExecuteOutcome::Unrouted
            }
            Err(e) => {
                error!(error = %e, "update failed");
                ExecuteOutcome::Failed(e.to_string())
            }
        }
    }

    async fn run(&self, body: &[u8]) -> Result<Option<UpdateType>> {
        let update = Update::from_slice(body)?;
        debug!(request = %update.raw(), "request");

        let Some(dispatch) = self.dispatcher.dispatch(&update)? else {
            return Ok(None);
        };
        let update_type = dispatch.update_type;
        dispatch.invoke().await?;
        Ok(Some(update_type))
    }
}
