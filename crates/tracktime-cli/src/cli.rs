//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Manual time tracker.
///
/// Start a session when you begin working and press Enter when you are done.
/// Open sessions are autosaved so a crash loses at most one autosave period.
#[derive(Debug, Parser)]
#[command(name = "tracktime", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the session log. Created if it does not exist.
    #[arg(short = 'f', long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a session and record it until Enter is pressed.
    Start {
        /// Minutes between autosaves while the session is open (0 disables).
        #[arg(short, long)]
        autosave: Option<u64>,
    },

    /// List recorded sessions.
    List {
        /// Split sessions that cross midnight into one entry per day.
        #[arg(long)]
        by_day: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show tracked time per calendar day.
    Report {
        /// First day to include (YYYY-MM-DD, "today", "yesterday", "N days ago").
        #[arg(long)]
        from: Option<String>,

        /// Last day to include.
        #[arg(long)]
        to: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the session log location and any open session.
    Status,
}
