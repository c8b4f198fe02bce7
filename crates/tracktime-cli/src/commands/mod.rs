//! CLI subcommand implementations.

pub mod list;
pub mod report;
pub mod start;
pub mod status;
pub mod util;
