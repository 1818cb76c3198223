//! End-of-run summary

use crate::crawler::DiscoveryStop;
use std::path::PathBuf;

/// Totals for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Entries recorded in the entry log this run
    pub entered: u64,

    /// Workflows that stopped because a page lacked what they needed
    pub abandoned: u64,

    /// Workflows that stopped on a network or log error
    pub failed: u64,

    /// Listing pages fetched during discovery
    pub pages_fetched: u32,

    /// Distinct listings handed to entry workflows
    pub listings_queued: usize,

    pub discovery_stop: DiscoveryStop,

    pub entry_log_path: PathBuf,
}

impl RunSummary {
    /// The closing banner, one line per element
    pub fn banner(&self) -> [String; 3] {
        [
            "-------- BOT WORK COMPLETED --------".to_string(),
            format!("-------- Giveaways Entered: {} --------", self.entered),
            "-------- REGARDS --------".to_string(),
        ]
    }
}

/// Prints the run summary
pub fn print_summary(summary: &RunSummary) {
    println!();
    for line in summary.banner() {
        println!("{}", line);
    }
    println!();

    println!("Run details:");
    println!("  Listing pages fetched: {}", summary.pages_fetched);
    println!("  Giveaways queued: {}", summary.listings_queued);
    println!("  Entered: {}", summary.entered);
    println!("  Abandoned: {}", summary.abandoned);
    println!("  Failed: {}", summary.failed);
    println!("  Discovery stopped: {}", summary.discovery_stop);
    println!("  Entry log: {}", summary.entry_log_path.display());
}
