//! tracktime CLI library.
//!
//! This crate provides the CLI interface and the live session recorder.

mod cli;
pub mod clock;
pub mod commands;
mod config;
pub mod recorder;

pub use cli::{Cli, Commands};
pub use config::Config;
