//! Paginated giveaway discovery
//!
//! The first listing page is plain HTML with the first batch of listings embedded
//! as JSON. Later pages come from the GraphQL listing API, authorized with the
//! rolling bearer token and keyed by the previous page's continuation token.
//! Pagination stops when the token is missing or empty, or when a safety limit
//! trips.

use crate::config::{Config, DiscoveryConfig};
use crate::crawler::fetcher::{Page, PageRequest};
use crate::extract::{json_string_values, ExtractionError};
use crate::session::SessionContext;
use crate::GiveawayError;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// Body field holding each listing's relative entry URL
pub const ENTRY_URL_FIELD: &str = "enterGiveawayUrl";

/// Body field holding the continuation token
pub const NEXT_PAGE_TOKEN_FIELD: &str = "nextPageToken";

/// GraphQL operation issued for every page after the first
pub const GET_GIVEAWAYS_OPERATION: &str = "getGiveaways";

/// Query document of the listing API
pub const GET_GIVEAWAYS_QUERY: &str = "query getGiveaways($format: GiveawayFormat, $sort: GiveawaySortOption, $genre: String, $nextPageToken: String, $limit: Int) {
  getGiveaways(
    getGiveawaysInput: {sort: $sort, format: $format, genre: $genre}
    pagination: {after: $nextPageToken, limit: $limit}
  ) {
    edges {
      node {
        id
        legacyId
        details {
          book {
            id
            imageUrl
            title
            titleComplete
            description
            primaryContributorEdge {
              ...BasicContributorFragment
              __typename
            }
            secondaryContributorEdges {
              ...BasicContributorFragment
              __typename
            }
            __typename
          }
          format
          genres {
            name
            __typename
          }
          numCopiesAvailable
          numEntrants
          enterGiveawayUrl
          __typename
        }
        metadata {
          countries {
            countryCode
            __typename
          }
          endDate
          __typename
        }
        webUrl
        __typename
      }
      __typename
    }
    pageInfo {
      hasNextPage
      nextPageToken
      __typename
    }
    totalCount
    __typename
  }
}

fragment BasicContributorFragment on BookContributorEdge {
  node {
    id
    name
    webUrl
    isGrAuthor
    __typename
  }
  role
  __typename
}
";

/// A giveaway queued for entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GiveawayListing {
    /// Absolute entry URL
    pub entry_url: Url,
}

impl GiveawayListing {
    pub fn new(entry_url: Url) -> Self {
        Self { entry_url }
    }

    /// Short label for log lines: the last path segment of the entry URL
    pub fn id(&self) -> &str {
        self.entry_url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .unwrap_or_else(|| self.entry_url.as_str())
    }
}

/// Continuation state taken from one listing page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageCursor {
    /// `None` when the page carried no token or an empty one
    pub next_page_token: Option<String>,
}

impl PageCursor {
    /// Returns true if no further page should be requested
    pub fn is_exhausted(&self) -> bool {
        self.next_page_token.is_none()
    }
}

/// The listings and cursor carried by one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPage {
    /// Entry URLs in page order, as they appear in the body
    pub entry_urls: Vec<String>,

    pub cursor: PageCursor,
}

/// Extracts listings and the continuation token from a listing page
pub fn parse_listing_page(body: &str) -> Result<DiscoveredPage, ExtractionError> {
    let entry_urls = json_string_values(ENTRY_URL_FIELD, body)?;
    let next_page_token = json_string_values(NEXT_PAGE_TOKEN_FIELD, body)?
        .into_iter()
        .next()
        .filter(|token| !token.is_empty());

    Ok(DiscoveredPage {
        entry_urls,
        cursor: PageCursor { next_page_token },
    })
}

/// Builds the GraphQL request body for the page after `next_page_token`
pub fn build_page_query(next_page_token: &str, discovery: &DiscoveryConfig) -> Value {
    let mut variables = Map::new();
    variables.insert("nextPageToken".to_string(), json!(next_page_token));
    variables.insert("sort".to_string(), json!(discovery.sort));
    if let Some(format) = &discovery.format {
        variables.insert("format".to_string(), json!(format));
    }
    if let Some(genre) = &discovery.genre {
        variables.insert("genre".to_string(), json!(genre));
    }
    if let Some(limit) = discovery.limit {
        variables.insert("limit".to_string(), json!(limit));
    }

    json!({
        "operationName": GET_GIVEAWAYS_OPERATION,
        "query": GET_GIVEAWAYS_QUERY,
        "variables": variables,
    })
}

/// Why discovery stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryStop {
    /// The last page had no continuation token
    Exhausted,

    /// More pages were available but the page limit was reached
    PageLimitExceeded { limit: u32 },

    /// The API handed back the token it was just given
    RepeatedToken { token: String },

    /// A continuation token arrived but no bearer token was ever available
    MissingToken,

    /// A listing page could not be fetched
    FetchFailed { url: String, error: String },
}

impl fmt::Display for DiscoveryStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => write!(f, "no more pages"),
            Self::PageLimitExceeded { limit } => write!(f, "page limit of {} reached", limit),
            Self::RepeatedToken { token } => write!(f, "continuation token '{}' repeated", token),
            Self::MissingToken => write!(f, "no bearer token for the listing API"),
            Self::FetchFailed { url, error } => write!(f, "fetching {} failed: {}", url, error),
        }
    }
}

/// Outcome of a discovery pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Listing pages successfully fetched
    pub pages_fetched: u32,

    /// Distinct listings handed to the sink
    pub listings_queued: usize,

    pub stop: DiscoveryStop,
}

/// Walks the listing pages, handing every new listing to `on_listing`
///
/// Listings are passed on as soon as their page is parsed, so entry work can run
/// while later pages are still being fetched. A listing seen on an earlier page is
/// not passed on again.
///
/// # Errors
///
/// Only configuration problems (unparseable URLs) are returned as errors. Network
/// failures end discovery early and are reported through [`DiscoveryStop`].
pub async fn discover<F>(
    session: &SessionContext,
    config: &Config,
    mut on_listing: F,
) -> Result<DiscoveryReport, GiveawayError>
where
    F: FnMut(GiveawayListing),
{
    let endpoint = config.discovery_endpoint()?;
    let max_pages = config.discovery.max_pages;

    let mut request = PageRequest::get(config.giveaway_url()?);
    let mut seen: HashSet<Url> = HashSet::new();
    let mut pages_fetched = 0u32;
    let mut previous_token: Option<String> = None;

    let stop = loop {
        if pages_fetched >= max_pages {
            tracing::warn!("Stopping discovery after {} pages", max_pages);
            break DiscoveryStop::PageLimitExceeded { limit: max_pages };
        }

        let url = request.url.to_string();
        let page = match session.fetch(request).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Failed to fetch listing page {}: {}", url, e);
                break DiscoveryStop::FetchFailed {
                    url,
                    error: e.to_string(),
                };
            }
        };
        pages_fetched += 1;

        let discovered = parse_listing_page(&page.body)?;
        let queued = queue_new_listings(session, &page, &discovered, &mut seen, &mut on_listing);
        tracing::info!(
            "Listing page {}: {} giveaways queued ({} total)",
            pages_fetched,
            queued,
            seen.len()
        );

        let bearer = session.renew_bearer_token(&page);

        let Some(token) = discovered.cursor.next_page_token else {
            break DiscoveryStop::Exhausted;
        };
        if previous_token.as_deref() == Some(token.as_str()) {
            tracing::warn!("Listing API repeated continuation token {}", token);
            break DiscoveryStop::RepeatedToken { token };
        }
        let Some(bearer) = bearer else {
            tracing::warn!("Continuation token found but no bearer token to send it with");
            break DiscoveryStop::MissingToken;
        };

        tracing::debug!("Requesting listing page after token {}", token);
        let body = build_page_query(&token, &config.discovery);
        request = PageRequest::post_json(endpoint.clone(), &body).with_authorization(bearer);
        previous_token = Some(token);
    };

    tracing::info!(
        "Discovery finished after {} pages ({}): {} giveaways queued",
        pages_fetched,
        stop,
        seen.len()
    );

    Ok(DiscoveryReport {
        pages_fetched,
        listings_queued: seen.len(),
        stop,
    })
}

/// Resolves the page's entry URLs and passes on the unseen ones
fn queue_new_listings<F>(
    session: &SessionContext,
    page: &Page,
    discovered: &DiscoveredPage,
    seen: &mut HashSet<Url>,
    on_listing: &mut F,
) -> usize
where
    F: FnMut(GiveawayListing),
{
    let mut queued = 0;
    for link in &discovered.entry_urls {
        let entry_url = match session.resolve(link) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Skipping unresolvable entry URL {} on {}: {}", link, page.url, e);
                continue;
            }
        };
        if seen.insert(entry_url.clone()) {
            on_listing(GiveawayListing::new(entry_url));
            queued += 1;
        }
    }
    queued
}
