use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Carrier-Scout
///
/// Every section is optional; an empty file yields the same configuration as
/// `Config::default()`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub sources: SourcesConfig,
}

/// HTTP behaviour shared by every source
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Timeout for listing and route pages (seconds)
    #[serde(rename = "listing-timeout-secs")]
    pub listing_timeout_secs: u64,

    /// Timeout for company detail pages (seconds)
    #[serde(rename = "detail-timeout-secs")]
    pub detail_timeout_secs: u64,

    /// Total attempts for a detail page, the first one included
    #[serde(rename = "retry-attempts")]
    pub retry_attempts: u32,

    /// Fixed delay between detail attempts (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0".to_string(),
            listing_timeout_secs: 30,
            detail_timeout_secs: 15,
            retry_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl HttpConfig {
    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_timeout_secs)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_secs(self.detail_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Per-source settings, one table per registered directory site
///
/// Each table is laid over that site's own defaults, so a table only needs
/// the keys it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "SourcesOverlay")]
pub struct SourcesConfig {
    pub portal_dos_fretes: SourceConfig,
    pub cargas: SourceConfig,
    pub guia_do_transporte: SourceConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            portal_dos_fretes: SourceConfig {
                base_url: "https://portaldosfretes.com.br".to_string(),
                workers: 8,
                politeness_delay_ms: 500,
                batch_scope: BatchScope::Route,
                name_fallback: vec![
                    NameSource::AnchorText,
                    NameSource::CardAttribute,
                    NameSource::NearbyLabel,
                ],
            },
            cargas: SourceConfig {
                base_url: "https://cargas.com.br".to_string(),
                workers: 8,
                politeness_delay_ms: 300,
                batch_scope: BatchScope::Page,
                name_fallback: vec![NameSource::AnchorText],
            },
            guia_do_transporte: SourceConfig {
                base_url: "https://www.guiadotransporte.com.br".to_string(),
                workers: 10,
                politeness_delay_ms: 300,
                batch_scope: BatchScope::Route,
                name_fallback: vec![NameSource::AnchorText, NameSource::InnerHeading],
            },
        }
    }
}

/// `[sources]` as written in the file, before site defaults are applied
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SourcesOverlay {
    #[serde(rename = "portal-dos-fretes")]
    portal_dos_fretes: SourceOverlay,

    cargas: SourceOverlay,

    #[serde(rename = "guia-do-transporte")]
    guia_do_transporte: SourceOverlay,
}

impl From<SourcesOverlay> for SourcesConfig {
    fn from(overlay: SourcesOverlay) -> Self {
        let defaults = SourcesConfig::default();
        Self {
            portal_dos_fretes: overlay
                .portal_dos_fretes
                .apply(defaults.portal_dos_fretes),
            cargas: overlay.cargas.apply(defaults.cargas),
            guia_do_transporte: overlay
                .guia_do_transporte
                .apply(defaults.guia_do_transporte),
        }
    }
}

/// One `[sources.*]` table; absent keys keep the site default
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct SourceOverlay {
    base_url: Option<String>,
    workers: Option<usize>,
    politeness_delay_ms: Option<u64>,
    batch_scope: Option<BatchScope>,
    name_fallback: Option<Vec<NameSource>>,
}

impl SourceOverlay {
    fn apply(self, site: SourceConfig) -> SourceConfig {
        SourceConfig {
            base_url: self.base_url.unwrap_or(site.base_url),
            workers: self.workers.unwrap_or(site.workers),
            politeness_delay_ms: self.politeness_delay_ms.unwrap_or(site.politeness_delay_ms),
            batch_scope: self.batch_scope.unwrap_or(site.batch_scope),
            name_fallback: self.name_fallback.unwrap_or(site.name_fallback),
        }
    }
}

/// Settings for a single directory site
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Site root; listing, route and detail URLs are resolved against it
    pub base_url: String,

    /// Size of the detail-fetch worker pool
    pub workers: usize,

    /// Pause after each batch of detail fetches (milliseconds)
    pub politeness_delay_ms: u64,

    /// Whether detail fetches are batched per route or per listing page
    pub batch_scope: BatchScope,

    /// Ordered candidate locations for a company name on a route page
    pub name_fallback: Vec<NameSource>,
}

impl SourceConfig {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }
}

/// Granularity at which detail fetches are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchScope {
    /// One concurrent batch per route, politeness delay after each route
    Route,
    /// One concurrent batch for the whole listing page
    Page,
}

/// A candidate location for a company name inside a route page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameSource {
    /// Text of the company anchor itself
    AnchorText,
    /// Name attribute of the enclosing card
    CardAttribute,
    /// First labelled element following the anchor
    NearbyLabel,
    /// Heading nested inside the anchor
    InnerHeading,
}
