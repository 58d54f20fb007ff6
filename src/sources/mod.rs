//! Source adapters, one per directory site
//!
//! Each adapter owns everything it knows about its site's URL scheme and HTML
//! layout. They share only the page fetcher and the text helpers in
//! `crawler::parser`; no selector is assumed to work on more than one site.
//!
//! Every adapter splits its work into an async fetch step and a synchronous
//! `parse_*` step over the fetched HTML, so parsing can be tested offline.

mod cargas;
mod guia_do_transporte;
mod naming;
mod portal_dos_fretes;
mod registry;

pub use cargas::Cargas;
pub use guia_do_transporte::GuiaDoTransporte;
pub use naming::{resolve_name, NameRules};
pub use portal_dos_fretes::PortalDosFretes;
pub use registry::SourceId;

use crate::config::{BatchScope, NameSource, SourceConfig};
use crate::model::{CompanySummary, DetailRecord, Route};
use crate::{ConfigError, ScoutError};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// The four operations every directory site supports
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Display name of the site
    fn name(&self) -> &'static str;

    /// Scheduling and naming settings for this site
    fn settings(&self) -> &SourceSettings;

    /// Highest listing page index advertised by page 1
    ///
    /// Returns 1 when page 1 has no pagination links and 0 when page 1 could
    /// not be fetched at all.
    async fn total_pages(&self) -> u32;

    /// Routes listed on one listing page; empty if the page is unavailable
    async fn enumerate_routes(&self, page: u32) -> Vec<Route>;

    /// Company occurrences on one route page, detail links deduplicated
    async fn extract_company_summaries(&self, route: &Route) -> Vec<CompanySummary>;

    /// Contact fields from the summary's detail page
    ///
    /// `route` is the route the summary was found on. Never fails; a missing
    /// link or an unreachable page yields an empty record.
    async fn extract_details(&self, summary: &CompanySummary, route: &Route) -> DetailRecord;
}

/// Resolved per-site settings
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub base_url: Url,
    pub workers: usize,
    pub politeness_delay: Duration,
    pub batch_scope: BatchScope,
    pub name_fallback: Vec<NameSource>,
}

impl SourceSettings {
    /// Resolves a source table against the name locations the site has
    ///
    /// A `name-fallback` entry naming a location the site does not have is a
    /// configuration error.
    pub fn from_config(config: &SourceConfig, rules: &NameRules) -> Result<Self, ScoutError> {
        if let Some(source) = config
            .name_fallback
            .iter()
            .find(|source| !rules.supports(**source))
        {
            return Err(ConfigError::Validation(format!(
                "name-fallback entry {:?} is not available for {}",
                source, config.base_url
            ))
            .into());
        }

        Ok(Self {
            base_url: Url::parse(&config.base_url)?,
            workers: config.workers,
            politeness_delay: config.politeness_delay(),
            batch_scope: config.batch_scope,
            name_fallback: config.name_fallback.clone(),
        })
    }

    /// Resolves a site path such as `/rotas?page=2` against the base URL
    pub fn page_url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }
}

/// Applies the shared "0 on failure, 1 without pagination" rule
fn page_count(body: Option<String>, parse: impl FnOnce(&str) -> Option<u32>) -> u32 {
    match body {
        None => 0,
        Some(html) => parse(&html).unwrap_or(1).max(1),
    }
}
