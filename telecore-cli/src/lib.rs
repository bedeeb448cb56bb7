//! # telecore-cli
//!
//! The `telecore` binary's pieces: env config, the sample routing setup and the CLI commands.

pub mod app;
pub mod cli;
pub mod config;

pub use app::{build_dispatcher, Outbox, Reply};
pub use cli::{run, Cli, Commands};
pub use config::AppConfig;
