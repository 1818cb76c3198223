//! Bookdraw: automated book-giveaway entry
//!
//! This crate signs in to a giveaway site, pages through its listing API and walks
//! every listing through the multi-step entry form, keeping an append-only record
//! of each entry it makes.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod session;
pub mod state;

use thiserror::Error;

/// Main error type for Bookdraw operations
#[derive(Debug, Error)]
pub enum GiveawayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Request failed: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] extract::ExtractionError),

    #[error("Login failed: {reason}")]
    LoginFailed { reason: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern in config: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Bookdraw operations
pub type Result<T> = std::result::Result<T, GiveawayError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_giveaways, Coordinator};
pub use output::{EntryLog, RunSummary};
pub use session::{Credentials, SessionContext};
pub use state::{AuthState, EntryAttemptState};
