//! Crawler module for the giveaway run
//!
//! This module contains the network-facing logic, including:
//! - HTTP fetching through the session's cookie-carrying client
//! - Named-form discovery and submission
//! - The authentication, discovery and entry stages
//! - Overall run coordination

mod auth;
mod coordinator;
mod discovery;
mod entry;
mod fetcher;
mod form;

pub use auth::{authenticate, login_rejection};
pub use coordinator::{run_giveaways, Coordinator};
pub use discovery::{
    build_page_query, discover, parse_listing_page, DiscoveredPage, DiscoveryReport,
    DiscoveryStop, GiveawayListing, PageCursor, ENTRY_URL_FIELD, GET_GIVEAWAYS_OPERATION,
    GET_GIVEAWAYS_QUERY, NEXT_PAGE_TOKEN_FIELD,
};
pub use entry::{EntryOutcome, EntryWorkflow, CONFIRMATION_FIELDS, CSRF_FIELD, ENTRY_FORM_NAME};
pub use fetcher::{build_http_client, fetch, FetchError, Page, PageRequest, RequestBody};
pub use form::FormSubmission;
