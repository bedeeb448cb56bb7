//! Message handler trait shared by the entity router and the handler chain.

use async_trait::async_trait;

use crate::container::Container;
use crate::error::Result;
use crate::types::Update;

/// Something that may handle a `message` update.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Returns `Ok(true)` if this handler took the message, `Ok(false)` to let the next one try.
    ///
    /// `container` is the registry of the current dispatch (session, update type, ...) when the
    /// handler runs behind a dispatcher; `None` when it is called on its own.
    async fn handle_message(&self, request: &Update, container: Option<&Container>)
        -> Result<bool>;
}
