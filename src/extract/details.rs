//! Display details of an accepted giveaway entry
//!
//! Nothing here can fail an entry: by the time the confirmation page is parsed the
//! entry has already been committed, so every miss only degrades the message.

use crate::extract::html::{document_text, selector};
use crate::extract::patterns::{compile, first_match};
use crate::extract::ExtractionError;
use scraper::Html;
use std::fmt;

const COPIES_PATTERN: &str = r"(?i)(\d[\d,]*)\s+cop(?:y|ies)\s+available";
const ENTRANTS_PATTERN: &str = r"(?i)(\d[\d,]*)\s+(?:people|person)\s+requesting";
const DATE_RANGE_PATTERN: &str =
    r"([A-Z][a-z]+\.? \d{1,2}(?:, \d{4})?)\s*[-\x{2013}]\s*([A-Z][a-z]+\.? \d{1,2}, \d{4})";

/// Edition offered by a giveaway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookFormat {
    Print,
    Kindle,
}

impl fmt::Display for BookFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Print => write!(f, "Print"),
            Self::Kindle => write!(f, "Kindle"),
        }
    }
}

/// Best-effort description of the giveaway just entered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiveawayDetails {
    pub title: String,
    pub author: String,
    pub format: BookFormat,
    pub copies_available: u32,
    pub entrants: u32,
    pub starts: String,
    pub ends: String,
}

/// Splits a "Title by Author" heading on the last " by "
///
/// # Example
///
/// ```
/// use bookdraw::extract::split_title_author;
///
/// let (title, author) = split_title_author("Stand by Me by Jane Doe").unwrap();
/// assert_eq!(title, "Stand by Me");
/// assert_eq!(author, "Jane Doe");
/// ```
pub fn split_title_author(heading: &str) -> Result<(String, String), ExtractionError> {
    let heading = heading.split_whitespace().collect::<Vec<_>>().join(" ");
    match heading.rsplit_once(" by ") {
        Some((title, author)) if !title.trim().is_empty() && !author.trim().is_empty() => {
            Ok((title.trim().to_string(), author.trim().to_string()))
        }
        _ => Err(ExtractionError::Malformed {
            field: "title heading".to_string(),
            value: heading,
        }),
    }
}

/// Parses the confirmation page shown after an entry is submitted
pub fn parse_giveaway_details(html: &str) -> Result<GiveawayDetails, ExtractionError> {
    let document = Html::parse_document(html);

    let heading_selector = selector("h1")?;
    let heading = document
        .select(&heading_selector)
        .map(|element| element.text().collect::<String>())
        .find(|text| !text.trim().is_empty())
        .ok_or_else(|| ExtractionError::not_found("title heading"))?;
    let (title, author) = split_title_author(&heading)?;

    let text = document_text(&document);

    let format = if text.contains("Kindle") {
        BookFormat::Kindle
    } else {
        BookFormat::Print
    };

    let copies_available = count(COPIES_PATTERN, &text, "copies available")?;
    let entrants = count(ENTRANTS_PATTERN, &text, "entrant count")?;

    let range = compile(DATE_RANGE_PATTERN)?;
    let caps = range
        .captures(&text)
        .ok_or_else(|| ExtractionError::not_found("giveaway dates"))?;

    Ok(GiveawayDetails {
        title,
        author,
        format,
        copies_available,
        entrants,
        starts: caps[1].to_string(),
        ends: caps[2].to_string(),
    })
}

fn count(pattern: &str, text: &str, what: &str) -> Result<u32, ExtractionError> {
    let raw = first_match(pattern, text)?.ok_or_else(|| ExtractionError::not_found(what))?;
    raw.replace(',', "")
        .parse()
        .map_err(|_| ExtractionError::Malformed {
            field: what.to_string(),
            value: raw,
        })
}

/// Formats the console line for an accepted entry
///
/// A parse failure falls back to a generic line naming the listing.
pub fn describe_entry(
    listing: &str,
    details: &Result<GiveawayDetails, ExtractionError>,
) -> String {
    match details {
        Ok(d) => format!(
            "Giveaway entered: {} by {} [{}] - {} copies, {} entrants, {} - {}",
            d.title, d.author, d.format, d.copies_available, d.entrants, d.starts, d.ends
        ),
        Err(e) => format!(
            "Giveaway entered: {} (details unavailable: {})",
            listing, e
        ),
    }
}
