//! Carrier-Scout: freight carrier directory harvester
//!
//! This crate scrapes freight-carrier listings from several directory websites,
//! each with its own pagination scheme and HTML layout, and normalizes them into
//! one record shape: company name, known origin/destination routes and contact
//! details.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod sources;

use thiserror::Error;

/// Main error type for Carrier-Scout operations
///
/// Extraction never produces these: a failed fetch or a missing field is
/// represented as absent data. Errors only come from setup and from the
/// source registry boundary.
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Unknown source id {id}; valid ids are {valid}")]
    UnknownSource { id: u32, valid: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

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
}

/// Result type alias for Carrier-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Aggregator, PageFetcher, Pipeline};
pub use model::{AggregatedCompany, CompanySummary, DetailRecord, PageOutcome, Route};
pub use sources::{SourceAdapter, SourceId};
