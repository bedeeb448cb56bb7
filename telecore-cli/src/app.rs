//! Sample routing setup used by the `telecore` binary.
//!
//! Replies are not sent anywhere; handlers push them to an [`Outbox`] shared through the
//! container so the CLI can print them.

use std::sync::Arc;

use dispatcher::{
    type_key, Args, Container, Dependency, DispatcherBuilder, Handler, Param, UpdateDispatcher,
};
use session::{Session, SessionFactory};
use telecore_core::{Result, Update};
use tokio::sync::Mutex;
use tracing::info;

/// A reply a handler would send back to the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub chat_id: Option<i64>,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct Outbox {
    replies: Mutex<Vec<Reply>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, chat_id: Option<i64>, text: impl Into<String>) {
        let reply = Reply {
            chat_id,
            text: text.into(),
        };
        info!(chat_id = ?reply.chat_id, text = %reply.text, "step: reply queued");
        self.replies.lock().await.push(reply);
    }

    pub async fn drain(&self) -> Vec<Reply> {
        std::mem::take(&mut *self.replies.lock().await)
    }
}

pub const HELP_TEXT: &str = "/start - start a conversation\n/help - show this message";

/// Builds the sample dispatcher: `/start`, `/help`, callback buttons and inline queries.
pub fn build_dispatcher(
    sessions: SessionFactory,
    outbox: Arc<Outbox>,
) -> Result<UpdateDispatcher> {
    let mut container = Container::new();
    container.insert_dependency(type_key::<Outbox>(), Dependency::from_arc(outbox));

    let mut builder = DispatcherBuilder::new(container, sessions);
    builder
        .add_command(
            "start",
            Handler::new("start", start)
                .param(Param::typed::<Update>("request"))
                .param(Param::typed::<Session>("session"))
                .param(Param::typed::<Outbox>("outbox")),
        )?
        .add_command(
            "help",
            Handler::new("help", help)
                .param(Param::typed::<Update>("request"))
                .param(Param::typed::<Outbox>("outbox")),
        )?
        .add_handler(
            "callback_query",
            Handler::new("callback_query", callback_query)
                .param(Param::typed::<Update>("request"))
                .param(Param::typed::<Session>("session"))
                .param(Param::typed::<Outbox>("outbox")),
        )?
        .add_handler(
            "inline_query",
            Handler::new("inline_query", inline_query)
                .param(Param::named("type"))
                .param(Param::typed::<Update>("request"))
                .param(Param::typed::<Outbox>("outbox")),
        )?;
    Ok(builder.build())
}

async fn start(args: Args) -> Result<()> {
    let request = args.get::<Update>(0)?;
    let session = args.get_arc::<Session>(1)?;
    let outbox = args.get_arc::<Outbox>(2)?;

    let message = request.message()?;
    let chat_id = message.as_ref().and_then(|m| m.chat.as_ref()).map(|c| c.id);
    let name = message
        .as_ref()
        .and_then(|m| m.from.as_ref())
        .and_then(|u| u.first_name.clone().or_else(|| u.username.clone()))
        .unwrap_or_else(|| "there".to_string());

    let returning = session.get_or("started", false).await?;
    session.set("started", &true, None).await?;

    let text = if returning {
        format!("Welcome back, {}!", name)
    } else {
        format!("Hello, {}! Send /help to see what I can do.", name)
    };
    outbox.push(chat_id, text).await;
    Ok(())
}

async fn help(args: Args) -> Result<()> {
    let request = args.get::<Update>(0)?;
    let outbox = args.get_arc::<Outbox>(1)?;
    let chat_id = request.message()?.and_then(|m| m.chat).map(|c| c.id);
    outbox.push(chat_id, HELP_TEXT).await;
    Ok(())
}

/// Counts button presses per chat/user; callbacks from inline messages carry no session.
async fn callback_query(args: Args) -> Result<()> {
    let request = args.get::<Update>(0)?;
    let outbox = args.get_arc::<Outbox>(2)?;

    let data = request
        .get("callback_query")
        .and_then(|q| q.get("data"))
        .and_then(|d| d.as_str())
        .unwrap_or_default()
        .to_string();
    let chat_id = request.callback_query_message()?.and_then(|m| m.chat).map(|c| c.id);

    let text = match args.get_arc::<Session>(1).ok() {
        Some(session) => {
            let presses: u64 = session.get_or("presses", 0u64).await? + 1;
            session.set("presses", &presses, None).await?;
            format!("pressed {} ({} so far)", data, presses)
        }
        None => format!("pressed {}", data),
    };
    outbox.push(chat_id, text).await;
    Ok(())
}

async fn inline_query(args: Args) -> Result<()> {
    let update_type = args.get::<String>(0)?;
    let request = args.get::<Update>(1)?;
    let outbox = args.get_arc::<Outbox>(2)?;

    let query = request
        .get(update_type)
        .and_then(|q| q.get("query"))
        .and_then(|q| q.as_str())
        .unwrap_or_default();
    outbox.push(None, format!("results for \"{}\"", query)).await;
    Ok(())
}
