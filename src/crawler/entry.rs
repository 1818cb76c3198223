//! Per-listing entry workflow
//!
//! Each queued listing runs through its own state machine:
//!
//! ```text
//! Selecting --> Confirming --> Accepted
//!     |             |
//!     +--> Abandoned / Failed
//! ```
//!
//! - **Selecting**: fetch the entry page, pick the address (print) or reuse the
//!   entry URL (Kindle), capture the CSRF token
//! - **Confirming**: POST the token, then submit the confirmation form with the
//!   terms accepted and the to-read opt-in declined
//! - **Accepted**: record the entry in the log
//!
//! A page that lacks what the next step needs abandons the workflow without further
//! requests. A network error fails it. Neither affects other workflows.

use crate::config::Config;
use crate::crawler::discovery::GiveawayListing;
use crate::crawler::fetcher::{FetchError, PageRequest};
use crate::crawler::form::FormSubmission;
use crate::extract::{
    describe_entry, parse_entry_page, parse_giveaway_details, ExtractionError, GiveawayDetails,
};
use crate::output::{EntryLog, EntryRecord};
use crate::session::SessionContext;
use crate::state::EntryAttemptState;
use crate::{ConfigError, GiveawayError};
use regex::Regex;
use std::sync::Arc;
use url::Url;

/// Name of the confirmation form
pub const ENTRY_FORM_NAME: &str = "entry_form";

/// Form field carrying the CSRF token
pub const CSRF_FIELD: &str = "authenticity_token";

/// Fixed confirmation fields: accept the terms, decline the to-read shelf
pub const CONFIRMATION_FIELDS: [(&str, &str); 4] = [
    ("commit", "Enter Giveaway"),
    ("entry_terms", "1"),
    ("utf8", "\u{2713}"),
    ("want_to_read", "0"),
];

/// How a workflow ended
#[derive(Debug)]
pub enum EntryOutcome {
    Accepted {
        record: EntryRecord,

        /// Display details; a parse failure here never undoes the entry
        details: Result<GiveawayDetails, ExtractionError>,
    },

    Abandoned {
        state: EntryAttemptState,
        reason: String,
    },

    Failed {
        state: EntryAttemptState,
        error: GiveawayError,
    },
}

impl EntryOutcome {
    /// Terminal state the workflow reached
    pub fn state(&self) -> EntryAttemptState {
        match self {
            Self::Accepted { .. } => EntryAttemptState::Accepted,
            Self::Abandoned { .. } => EntryAttemptState::Abandoned,
            Self::Failed { .. } => EntryAttemptState::Failed,
        }
    }
}

/// Runs entry workflows against a shared session and log
///
/// Cheap to clone; each spawned workflow gets its own copy.
#[derive(Clone)]
pub struct EntryWorkflow {
    session: Arc<SessionContext>,
    log: Arc<EntryLog>,
    kindle_pattern: Regex,
}

impl EntryWorkflow {
    pub fn new(
        session: Arc<SessionContext>,
        log: Arc<EntryLog>,
        config: &Config,
    ) -> Result<Self, GiveawayError> {
        let kindle_pattern = Regex::new(&config.site.kindle_url_pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("{}: {}", config.site.kindle_url_pattern, e))
        })?;

        Ok(Self {
            session,
            log,
            kindle_pattern,
        })
    }

    /// Returns true if `url` is a Kindle giveaway's entry URL
    pub fn is_kindle(&self, url: &Url) -> bool {
        self.kindle_pattern.is_match(url.as_str())
    }

    /// Drives one listing to a terminal state
    pub async fn run(&self, listing: GiveawayListing) -> EntryOutcome {
        let outcome = self.attempt(&listing).await;
        match &outcome {
            EntryOutcome::Accepted { details, .. } => {
                tracing::info!("{}", describe_entry(listing.id(), details));
            }
            EntryOutcome::Abandoned { state, reason } => {
                tracing::warn!(
                    "Abandoned giveaway {} while {}: {}",
                    listing.entry_url,
                    state,
                    reason
                );
            }
            EntryOutcome::Failed { state, error } => {
                tracing::error!(
                    "Giveaway {} failed while {}: {}",
                    listing.entry_url,
                    state,
                    error
                );
            }
        }
        outcome
    }

    async fn attempt(&self, listing: &GiveawayListing) -> EntryOutcome {
        let mut state = EntryAttemptState::Selecting;

        let entry_page = match self
            .session
            .fetch(PageRequest::get(listing.entry_url.clone()))
            .await
        {
            Ok(page) => page,
            Err(e) => return failed(state, e),
        };
        let parsed = parse_entry_page(&entry_page.body);

        let target = if self.is_kindle(&entry_page.request_url) {
            entry_page.request_url.clone()
        } else {
            let Some(link) = parsed.address_link else {
                return abandoned(state, "no address selection link on entry page");
            };
            match entry_page.url.join(&link) {
                Ok(url) => url,
                Err(e) => {
                    return abandoned(state, format!("unusable address link '{}': {}", link, e))
                }
            }
        };

        let Some(csrf_token) = parsed.csrf_token else {
            return abandoned(state, "no CSRF token on entry page");
        };
        self.session.record_csrf_token(&csrf_token);

        state = match state.advance(EntryAttemptState::Confirming) {
            Ok(next) => next,
            Err(e) => return EntryOutcome::Failed { state, error: e },
        };

        let confirmation_page = match self
            .session
            .fetch(PageRequest::post_form(
                target,
                vec![(CSRF_FIELD.to_string(), csrf_token.clone())],
            ))
            .await
        {
            Ok(page) => page,
            Err(e) => return failed(state, e),
        };

        let mut fields = vec![(CSRF_FIELD, csrf_token.as_str())];
        fields.extend(CONFIRMATION_FIELDS);
        let submission =
            match FormSubmission::from_page(&confirmation_page, ENTRY_FORM_NAME, &fields) {
                Ok(submission) => submission,
                Err(e) => return abandoned(state, e.to_string()),
            };

        let accepted_page = match self.session.fetch(submission.into_request()).await {
            Ok(page) => page,
            Err(e) => return failed(state, e),
        };

        // The site has accepted the entry; from here on it is always recorded.
        state = match state.advance(EntryAttemptState::Accepted) {
            Ok(next) => next,
            Err(e) => return EntryOutcome::Failed { state, error: e },
        };
        let details = parse_giveaway_details(&accepted_page.body);

        match self.log.record_entry(accepted_page.url.as_str()).await {
            Ok(record) => EntryOutcome::Accepted { record, details },
            Err(error) => EntryOutcome::Failed { state, error },
        }
    }
}

fn abandoned(state: EntryAttemptState, reason: impl Into<String>) -> EntryOutcome {
    EntryOutcome::Abandoned {
        state,
        reason: reason.into(),
    }
}

fn failed(state: EntryAttemptState, error: FetchError) -> EntryOutcome {
    EntryOutcome::Failed {
        state,
        error: error.into(),
    }
}
