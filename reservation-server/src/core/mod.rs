//! Core: configuration, state, background tasks and the HTTP server
//!
//! - [`Config`] - environment configuration
//! - [`AppState`] - shared application state
//! - [`BackgroundTasks`] - background task registry
//! - [`Server`] - HTTP server lifecycle

pub mod config;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use server::Server;
pub use state::AppState;
pub use tasks::{BackgroundTasks, TaskKind};
