//! Task time tracker CLI library.
//!
//! This crate provides the CLI interface for the task time tracker.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, EntryAction, TaskAction};
pub use config::Config;
