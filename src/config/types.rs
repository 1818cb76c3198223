use serde::Deserialize;
use url::Url;

/// Main configuration structure for Bookdraw
///
/// Every section falls back to its defaults, so a config file only needs to name
/// the values it overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub login: LoginConfig,
    pub discovery: DiscoveryConfig,
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Base URL of the site
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.site.base_url)
    }

    /// Absolute URL of the sign-in landing page
    pub fn sign_in_url(&self) -> Result<Url, url::ParseError> {
        self.base_url()?.join(&self.site.sign_in_path)
    }

    /// Absolute URL of the first giveaway listing page
    pub fn giveaway_url(&self) -> Result<Url, url::ParseError> {
        self.base_url()?.join(&self.site.giveaway_path)
    }

    /// Absolute URL of the GraphQL listing endpoint
    pub fn discovery_endpoint(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.site.discovery_endpoint)
    }
}

/// Where the giveaway site and its listing API live
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Base URL that relative giveaway links are resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the sign-in landing page
    #[serde(rename = "sign-in-path")]
    pub sign_in_path: String,

    /// Path of the first giveaway listing page
    #[serde(rename = "giveaway-path")]
    pub giveaway_path: String,

    /// Absolute URL of the GraphQL listing endpoint
    #[serde(rename = "discovery-endpoint")]
    pub discovery_endpoint: String,

    /// Regex matched against entry URLs to detect Kindle giveaways
    #[serde(rename = "kindle-url-pattern")]
    pub kindle_url_pattern: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.goodreads.com".to_string(),
            sign_in_path: "/user/sign_in".to_string(),
            giveaway_path: "/giveaway".to_string(),
            discovery_endpoint:
                "https://kxbwmqov6jgg3daaamb744ycu4.appsync-api.us-east-1.amazonaws.com/graphql"
                    .to_string(),
            kindle_url_pattern: r"/giveaway/enter_kindle_giveaway/\d+".to_string(),
        }
    }
}

/// Sign-in form details
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    /// Regex whose first capture group is the one-time login URL on the landing page
    #[serde(rename = "login-url-pattern")]
    pub login_url_pattern: String,

    /// `name` attribute of the credential form
    #[serde(rename = "form-name")]
    pub form_name: String,

    /// Form field receiving the username
    #[serde(rename = "username-field")]
    pub username_field: String,

    /// Form field receiving the password
    #[serde(rename = "password-field")]
    pub password_field: String,

    /// Phrases whose presence in the post-login body means the login was rejected
    #[serde(rename = "failure-phrases")]
    pub failure_phrases: Vec<String>,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            login_url_pattern: r#"href="([^"]*/ap/signin\?[^"]*)""#.to_string(),
            form_name: "signIn".to_string(),
            username_field: "email".to_string(),
            password_field: "password".to_string(),
            failure_phrases: vec![
                "try again".to_string(),
                "There was a problem".to_string(),
            ],
        }
    }
}

/// Listing API query variables and the pagination cap
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Sort order sent as the `sort` variable
    pub sort: String,

    /// Optional `format` variable (e.g. "PRINT" or "KINDLE")
    pub format: Option<String>,

    /// Optional `genre` variable
    pub genre: Option<String>,

    /// Optional `limit` variable (listings per page)
    pub limit: Option<u32>,

    /// Maximum number of listing pages fetched in one run
    #[serde(rename = "max-pages")]
    pub max_pages: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            sort: "ENDING_SOON".to_string(),
            format: None,
            genre: None,
            limit: None,
            max_pages: 100,
        }
    }
}

/// HTTP client behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Maximum number of entry workflows in flight at once
    #[serde(rename = "max-concurrent-entries")]
    pub max_concurrent_entries: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("bookdraw/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            max_concurrent_entries: 8,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the append-only entry log
    #[serde(rename = "entry-log-path")]
    pub entry_log_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            entry_log_path: "EnteredGiveaways.txt".to_string(),
        }
    }
}
