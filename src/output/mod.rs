//! Output module for the run's durable and console output
//!
//! - `entry_log`: the append-only file of accepted entries
//! - `summary`: the closing banner and run totals

mod entry_log;
mod summary;

pub use entry_log::{read_last_run, read_records, EntryLog, EntryRecord};
pub use summary::{print_summary, RunSummary};
