//! Append-only audit log of accepted entries
//!
//! File layout, one run after another:
//!
//! ```text
//!
//! ---- 2026-10-19T09:12:03.512904+02:00 ----
//!
//! 1. 2026-10-19T09:12:09.004117+02:00 : 	https://www.goodreads.com/giveaway/show/40123
//! 2. 2026-10-19T09:12:09.871350+02:00 : 	https://www.goodreads.com/giveaway/show/40188
//! ```
//!
//! Sequence numbers restart at 1 for every run and are assigned under the same lock
//! as the append, so they stay gap-free and in file order no matter how many entry
//! workflows finish at once.

use crate::GiveawayError;
use chrono::{DateTime, FixedOffset, Local, SecondsFormat};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Separator between the timestamp and URL of a record line
const RECORD_SEPARATOR: &str = " : \t";

/// One accepted entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    /// Position within the run, starting at 1
    pub sequence_number: u64,

    pub timestamp: DateTime<FixedOffset>,

    /// Final URL of the accepted submission
    pub giveaway_url: String,
}

impl EntryRecord {
    /// Renders the record as a log line, without the trailing newline
    pub fn to_line(&self) -> String {
        format!(
            "{}. {}{}{}",
            self.sequence_number,
            format_timestamp(&self.timestamp),
            RECORD_SEPARATOR,
            self.giveaway_url
        )
    }

    /// Parses a record line; banners and blank lines yield `None`
    pub fn parse_line(line: &str) -> Option<Self> {
        let (number, rest) = line.split_once(". ")?;
        let sequence_number = number.trim().parse().ok()?;
        let (timestamp, giveaway_url) = rest.split_once(RECORD_SEPARATOR)?;
        let timestamp = DateTime::parse_from_rfc3339(timestamp.trim()).ok()?;
        let giveaway_url = giveaway_url.trim_end();
        if giveaway_url.is_empty() {
            return None;
        }

        Some(Self {
            sequence_number,
            timestamp,
            giveaway_url: giveaway_url.to_string(),
        })
    }
}

fn format_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, false)
}

fn now() -> DateTime<FixedOffset> {
    Local::now().into()
}

/// The run's entry log
///
/// Owned by the coordinator and shared with every entry workflow through an `Arc`.
#[derive(Debug)]
pub struct EntryLog {
    path: PathBuf,

    /// Entries recorded during this run
    entered: Mutex<u64>,
}

impl EntryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entered: Mutex::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends the run banner, creating the file if needed
    ///
    /// Returns the banner line as written.
    pub async fn write_banner(&self) -> Result<String, GiveawayError> {
        let _guard = self.entered.lock().await;
        let banner = format!("---- {} ----", format_timestamp(&now()));
        self.append(&format!("\n{}\n\n", banner)).await?;
        Ok(banner)
    }

    /// Appends a record for an accepted entry and bumps the counter
    ///
    /// The counter only advances once the line is written, so the count always
    /// equals the number of records this run added to the file.
    pub async fn record_entry(&self, giveaway_url: &str) -> Result<EntryRecord, GiveawayError> {
        let mut entered = self.entered.lock().await;
        let record = EntryRecord {
            sequence_number: *entered + 1,
            timestamp: now(),
            giveaway_url: giveaway_url.to_string(),
        };
        self.append(&format!("{}\n", record.to_line())).await?;
        *entered = record.sequence_number;
        Ok(record)
    }

    /// Number of entries recorded during this run
    pub async fn entered_count(&self) -> u64 {
        *self.entered.lock().await
    }

    async fn append(&self, text: &str) -> Result<(), GiveawayError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Reads back every record in an entry log file, across all runs
pub fn read_records(path: &Path) -> Result<Vec<EntryRecord>, GiveawayError> {
    let content = fs::read_to_string(path)?;
    Ok(content.lines().filter_map(EntryRecord::parse_line).collect())
}

/// Reads back the records of the last run in an entry log file
pub fn read_last_run(path: &Path) -> Result<Vec<EntryRecord>, GiveawayError> {
    let content = fs::read_to_string(path)?;
    let last_run = content
        .rsplit_once("---- ")
        .map(|(_, tail)| tail)
        .unwrap_or(&content);
    Ok(last_run.lines().filter_map(EntryRecord::parse_line).collect())
}
