use crate::config::Config;
use crate::crawler::{build_http_client, fetch, FetchError, Page, PageRequest};
use crate::extract::json_string_values;
use crate::GiveawayError;
use reqwest::cookie::Jar;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use url::Url;

/// Body field carrying the listing API's bearer token
pub const BEARER_TOKEN_FIELD: &str = "jwtToken";

static NEXT_JAR_ID: AtomicU64 = AtomicU64::new(1);

/// Identity and token state shared by every request of one run
///
/// The cookie jar is fixed at construction; losing it would lose the login, so the
/// only way to get a client is through this context. Token slots are interior-mutable
/// because many workflows hold the context at once.
pub struct SessionContext {
    jar_id: u64,
    jar: Arc<Jar>,
    client: Client,
    base_url: Url,
    bearer_token: RwLock<Option<String>>,
    csrf_token: RwLock<Option<String>>,
}

impl SessionContext {
    /// Creates a session with a fresh cookie jar
    pub fn new(config: &Config) -> Result<Self, GiveawayError> {
        let jar = Arc::new(Jar::default());
        let client = build_http_client(&config.crawler, Arc::clone(&jar))?;
        let jar_id = NEXT_JAR_ID.fetch_add(1, Ordering::Relaxed);

        tracing::debug!("Session created with cookie jar #{}", jar_id);

        Ok(Self {
            jar_id,
            jar,
            client,
            base_url: config.base_url()?,
            bearer_token: RwLock::new(None),
            csrf_token: RwLock::new(None),
        })
    }

    /// Opaque identifier of the cookie jar backing this session
    pub fn jar_id(&self) -> u64 {
        self.jar_id
    }

    pub fn cookie_jar(&self) -> &Arc<Jar> {
        &self.jar
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Resolves a site link (relative or absolute) against the base URL
    pub fn resolve(&self, link: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(link)
    }

    /// Issues `request` with this session's cookies
    pub async fn fetch(&self, request: PageRequest) -> Result<Page, FetchError> {
        fetch(&self.client, request).await
    }

    /// Last known bearer token
    pub fn bearer_token(&self) -> Option<String> {
        self.bearer_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Updates the bearer token from the latest listing response and returns it
    pub fn renew_bearer_token(&self, latest: &Page) -> Option<String> {
        let mut slot = self
            .bearer_token
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let renewed = next_bearer_token(slot.as_deref(), latest);
        *slot = renewed.clone();
        renewed
    }

    /// Most recently extracted CSRF token
    pub fn csrf_token(&self) -> Option<String> {
        self.csrf_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records a CSRF token extracted from an entry page
    pub fn record_csrf_token(&self, token: &str) {
        *self
            .csrf_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    }
}

/// Chooses the bearer token for the next listing request
///
/// In order of preference:
/// 1. a non-empty token issued in the latest response body
/// 2. the token the latest request itself carried
/// 3. the previously known token
pub fn next_bearer_token(previous: Option<&str>, latest: &Page) -> Option<String> {
    json_string_values(BEARER_TOKEN_FIELD, &latest.body)
        .ok()
        .and_then(|tokens| tokens.into_iter().find(|token| !token.is_empty()))
        .or_else(|| latest.request_authorization.clone())
        .or_else(|| previous.map(str::to_string))
}
