//! HTTP fetcher implementation
//!
//! This module is the only place that touches the network. It handles:
//! - Building the HTTP client around the run's shared cookie jar
//! - Describing requests (method, URL, authorization, body)
//! - Issuing them and capturing the final URL and body
//! - Error classification

use crate::config::CrawlerConfig;
use reqwest::cookie::Jar;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client, Method};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised while issuing a request
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status_code} from {url}")]
    Status { url: String, status_code: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}")]
    Connect { url: String },

    #[error("Network error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },
}

/// Body carried by an outgoing request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    /// `application/x-www-form-urlencoded` fields, in order
    Form(Vec<(String, String)>),
    /// Serialized JSON document
    Json(String),
}

/// A request to issue within the run's session
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub method: Method,
    pub url: Url,
    /// Value of the `authorization` header, if any
    pub authorization: Option<String>,
    pub body: RequestBody,
}

impl PageRequest {
    /// A plain GET
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            authorization: None,
            body: RequestBody::Empty,
        }
    }

    /// A form-encoded POST
    pub fn post_form(url: Url, fields: Vec<(String, String)>) -> Self {
        Self {
            method: Method::POST,
            url,
            authorization: None,
            body: RequestBody::Form(fields),
        }
    }

    /// A JSON POST
    pub fn post_json(url: Url, document: &serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            url,
            authorization: None,
            body: RequestBody::Json(document.to_string()),
        }
    }

    /// Attaches an `authorization` header
    pub fn with_authorization(mut self, token: impl Into<String>) -> Self {
        self.authorization = Some(token.into());
        self
    }
}

/// A successfully fetched response
#[derive(Debug, Clone)]
pub struct Page {
    /// URL the request was sent to
    pub request_url: Url,

    /// Final URL after redirects
    pub url: Url,

    /// HTTP status code
    pub status_code: u16,

    /// `authorization` header the request carried
    pub request_authorization: Option<String>,

    /// Response body
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// Every request made through the returned client shares `jar`, which is what keeps
/// one login alive for the whole run.
///
/// # Arguments
///
/// * `config` - The HTTP client configuration
/// * `jar` - The run's cookie jar
pub fn build_http_client(config: &CrawlerConfig, jar: Arc<Jar>) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(10))
        .cookie_provider(jar)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues a request and reads the whole body
///
/// # Error Classification
///
/// | Condition | Result |
/// |-----------|--------|
/// | Non-2xx status after redirects | `FetchError::Status` |
/// | Timeout | `FetchError::Timeout` |
/// | Connection refused / DNS / TLS | `FetchError::Connect` |
/// | Anything else | `FetchError::Network` |
///
/// No retries: a failed request ends the workflow that issued it.
pub async fn fetch(client: &Client, request: PageRequest) -> Result<Page, FetchError> {
    let PageRequest {
        method,
        url,
        authorization,
        body,
    } = request;

    let mut builder = client.request(method.clone(), url.clone());
    if let Some(token) = &authorization {
        builder = builder.header(AUTHORIZATION, token.as_str());
    }
    builder = match body {
        RequestBody::Empty => builder,
        RequestBody::Form(fields) => builder.form(&fields),
        RequestBody::Json(document) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(document),
    };

    tracing::debug!("{} {}", method, url);

    let response = builder
        .send()
        .await
        .map_err(|e| classify_error(url.as_str(), e))?;

    let status = response.status();
    let final_url = response.url().clone();

    if !status.is_success() {
        return Err(FetchError::Status {
            url: final_url.to_string(),
            status_code: status.as_u16(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| classify_error(final_url.as_str(), e))?;

    Ok(Page {
        request_url: url,
        url: final_url,
        status_code: status.as_u16(),
        request_authorization: authorization,
        body,
    })
}

/// Maps a reqwest error onto the fetch taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            source: error,
        }
    }
}
