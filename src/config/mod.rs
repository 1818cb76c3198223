//! Configuration module for Bookdraw
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Running without a file uses [`Config::default`], which targets the live site.
//!
//! # Example
//!
//! ```no_run
//! use bookdraw::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("bookdraw.toml")).unwrap();
//! println!("Listing pages capped at: {}", config.discovery.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DiscoveryConfig, LoginConfig, OutputConfig, SiteConfig,
};

// Re-export parser functions
pub use parser::{load_config, load_config_or_default, parse_config};
pub use validation::validate;
