//! Extraction of values from fetched pages
//!
//! Pages on the giveaway site mix HTML markup with embedded JSON islands, so values
//! are pulled out two ways:
//! - `patterns`: regex search over the raw body (JSON fields, the login URL)
//! - `html`: CSS selectors over the parsed document (CSRF meta tag, links)
//!
//! `details` builds the display-only summary of an accepted entry on top of both.
//! Every miss is an explicit [`ExtractionError`]; callers decide whether it is
//! fatal, abandons a workflow, or only degrades a message.

mod details;
mod html;
mod patterns;

pub use details::{
    describe_entry, parse_giveaway_details, split_title_author, BookFormat, GiveawayDetails,
};
pub(crate) use html::selector;
pub use html::{csrf_token, link_with_text, parse_entry_page, unescape_html, EntryPage};
pub use patterns::{all_matches, first_match, json_string_values};

use thiserror::Error;

/// Errors raised while extracting values from a page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("No {what} found on page")]
    NotFound { what: String },

    #[error("Form '{name}' not found on page")]
    FormNotFound { name: String },

    #[error("Malformed {field}: '{value}'")]
    Malformed { field: String, value: String },

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

impl ExtractionError {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }
}
