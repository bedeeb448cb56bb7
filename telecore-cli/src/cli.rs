//! CLI parser and command handlers.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dispatcher::{Controller, ExecuteOutcome};
use telecore_core::{Chat, User};

use crate::app::{build_dispatcher, Outbox};
use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "telecore")]
#[command(about = "Route bot updates through the sample telecore setup", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dispatch one update JSON (from a file, or stdin) and print the replies.
    Dispatch {
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Print the session namespace of a chat, or of a user in a chat.
    Namespace {
        #[arg(long, allow_hyphen_values = true)]
        chat_id: i64,
        #[arg(long)]
        user_id: Option<i64>,
    },
    /// List the update types routed by the sample setup, in dispatch order.
    Routes,
}

pub async fn run(cli: Cli, config: &AppConfig) -> Result<()> {
    match cli.command {
        Commands::Dispatch { file } => handle_dispatch(config, file).await,
        Commands::Namespace { chat_id, user_id } => {
            handle_namespace(config, chat_id, user_id).await
        }
        Commands::Routes => handle_routes(config).await,
    }
}

async fn handle_dispatch(config: &AppConfig, file: Option<PathBuf>) -> Result<()> {
    let body = match file {
        Some(path) => std::fs::read(&path).with_context(|| format!("read {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("read update from stdin")?;
            buf
        }
    };

    let outbox = Arc::new(Outbox::new());
    let dispatcher = build_dispatcher(config.session_factory().await?, outbox.clone())?;
    let controller = Controller::new(Arc::new(dispatcher));

    let outcome = controller.execute(&body).await;
    for reply in outbox.drain().await {
        match reply.chat_id {
            Some(chat_id) => println!("[{}] {}", chat_id, reply.text),
            None => println!("{}", reply.text),
        }
    }

    match outcome {
        ExecuteOutcome::Handled(update_type) => {
            println!("handled: {}", update_type);
            Ok(())
        }
        ExecuteOutcome::Unrouted => {
            println!("no handler for this update");
            Ok(())
        }
        ExecuteOutcome::Failed(e) => anyhow::bail!("dispatch failed: {}", e),
    }
}

async fn handle_namespace(config: &AppConfig, chat_id: i64, user_id: Option<i64>) -> Result<()> {
    let sessions = config.session_factory().await?;
    let chat = Chat {
        id: chat_id,
        chat_type: None,
        title: None,
        username: None,
    };
    let session = match user_id {
        Some(id) => {
            let user = User {
                id,
                is_bot: false,
                username: None,
                first_name: None,
                last_name: None,
            };
            sessions.chat_user_session(&chat, &user)?
        }
        None => sessions.chat_session(&chat)?,
    };
    println!("{}", session.namespace());
    Ok(())
}

async fn handle_routes(config: &AppConfig) -> Result<()> {
    let dispatcher = build_dispatcher(config.session_factory().await?, Arc::new(Outbox::new()))?;
    for update_type in dispatcher.list_handlers() {
        println!("{}", update_type);
    }
    Ok(())
}
