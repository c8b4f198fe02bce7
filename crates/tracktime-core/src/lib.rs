//! Core domain logic for tracktime.
//!
//! This crate contains the fundamental types and logic for:
//! - Sessions: validated spans of tracked wall-clock time
//! - Day splitting: cutting sessions at midnight into single-day pieces
//! - Totals: summing tracked time per calendar date
//! - Ordinals: "1st", "2nd", ... for date headings

pub mod ordinal;
pub mod session;
mod split;
mod totals;
pub mod types;

pub use ordinal::{ordinal, ordinal_suffix};
pub use session::Session;
pub use split::{SPLIT_TICK, split_by_day};
pub use totals::{DayTotal, daily_totals};
pub use types::{SessionStatus, ValidationError};
