//! Guia do Transporte adapter
//!
//! Layout notes:
//! - Listing pages live at `/cotacao-transportadora/origem-e-destino?page={n}`
//! - Route cards sit in a `div.grid` and read "De X para Y"
//! - Company anchors often wrap the name in an `h4`
//! - Detail pages are loosely structured, so most fields fall back to the
//!   page text

use super::{page_count, resolve_name, NameRules, SourceAdapter, SourceSettings};
use crate::config::{NameSource, SourceConfig};
use crate::crawler::{
    find_cnpj, find_email, find_phone, first_attr, first_text, is_same_site, page_text,
    resolve_link, selector, stripped_text, PageFetcher,
};
use crate::model::{CompanySummary, DetailRecord, Route};
use crate::ScoutError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

static PAGE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"page=(\d+)").expect("valid page pattern"));

static ROUTE_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)De\s+(.+?)\s+para\s+(.+)").expect("valid route pattern"));

static PAGINATION: Lazy<Selector> = Lazy::new(|| selector("a[href*='origem-e-destino?page=']"));
static ROUTE_ANCHOR: Lazy<Selector> = Lazy::new(|| selector("div.grid a[href*='/rotas/']"));
static COMPANY_ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a[href*='/transportadora/']"));
static NAME: Lazy<Selector> =
    Lazy::new(|| selector("body > section:nth-of-type(1) div div:nth-of-type(1) div h3"));
static ADDRESS: Lazy<Selector> =
    Lazy::new(|| selector("body section div div:nth-of-type(1) div p"));
static MAILTO: Lazy<Selector> = Lazy::new(|| selector("a[href^='mailto:']"));
static TEL: Lazy<Selector> = Lazy::new(|| selector("a[href^='tel:']"));
static EXTERNAL: Lazy<Selector> = Lazy::new(|| selector("a[href^='http']"));
static WHATSAPP: Lazy<Selector> = Lazy::new(|| selector("a[href*='wa.me']"));

// Cards have no name attribute and no label; the logo anchor and the
// heading anchor are the only places a name appears
static NAME_RULES: Lazy<NameRules> = Lazy::new(|| NameRules {
    heading: Some(selector("h4")),
    ..Default::default()
});

const LISTING_PATH: &str = "/cotacao-transportadora/origem-e-destino";

/// Adapter for guiadotransporte.com.br
pub struct GuiaDoTransporte {
    fetcher: PageFetcher,
    settings: SourceSettings,
}

impl GuiaDoTransporte {
    pub fn new(fetcher: PageFetcher, config: &SourceConfig) -> Result<Self, ScoutError> {
        Ok(Self {
            fetcher,
            settings: SourceSettings::from_config(config, &NAME_RULES)?,
        })
    }

    fn listing_url(&self, page: u32) -> Option<Url> {
        self.settings
            .page_url(&format!("{}?page={}", LISTING_PATH, page))
            .ok()
    }
}

#[async_trait]
impl SourceAdapter for GuiaDoTransporte {
    fn name(&self) -> &'static str {
        "Guia do Transporte"
    }

    fn settings(&self) -> &SourceSettings {
        &self.settings
    }

    async fn total_pages(&self) -> u32 {
        let body = match self.listing_url(1) {
            Some(url) => self.fetcher.fetch_listing(&url).await,
            None => None,
        };
        page_count(body, parse_total_pages)
    }

    async fn enumerate_routes(&self, page: u32) -> Vec<Route> {
        let Some(url) = self.listing_url(page) else {
            return Vec::new();
        };
        match self.fetcher.fetch_listing(&url).await {
            Some(html) => parse_routes(&html, &self.settings.base_url),
            None => Vec::new(),
        }
    }

    async fn extract_company_summaries(&self, route: &Route) -> Vec<CompanySummary> {
        match self.fetcher.fetch_listing(&route.link).await {
            Some(html) => parse_summaries(
                &html,
                route,
                &self.settings.base_url,
                &self.settings.name_fallback,
            ),
            None => Vec::new(),
        }
    }

    async fn extract_details(&self, summary: &CompanySummary, route: &Route) -> DetailRecord {
        let Some(link) = &summary.detail_link else {
            return DetailRecord::default();
        };
        match self.fetcher.fetch_detail(link).await {
            Some(html) => parse_details(&html, &self.settings.base_url),
            None => {
                tracing::debug!(
                    "No detail page for '{}' on route {}",
                    summary.name,
                    route.link
                );
                DetailRecord::default()
            }
        }
    }
}

/// Highest `page=N` among the pagination anchors
pub fn parse_total_pages(html: &str) -> Option<u32> {
    let document = Html::parse_document(html);
    document
        .select(&PAGINATION)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| PAGE_NUMBER.captures(href)?.get(1)?.as_str().parse().ok())
        .max()
}

/// Splits "De X para Y" card text into its endpoints
pub fn parse_route_text(text: &str) -> (Option<String>, Option<String>) {
    match ROUTE_TEXT.captures(text) {
        Some(caps) => (
            caps.get(1).map(|m| m.as_str().trim().to_string()),
            caps.get(2).map(|m| m.as_str().trim().to_string()),
        ),
        None => (None, None),
    }
}

/// Route cards inside the listing grid
///
/// A card whose text does not follow "De X para Y" is still a route, just
/// without endpoints.
pub fn parse_routes(html: &str, base_url: &Url) -> Vec<Route> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut routes = Vec::new();

    for anchor in document.select(&ROUTE_ANCHOR) {
        let Some(link) = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_link(base_url, href))
        else {
            continue;
        };
        if !seen.insert(link.clone()) {
            continue;
        }

        let (origin, destination) = parse_route_text(&stripped_text(&anchor, " "));
        routes.push(Route::new(origin, destination, link));
    }

    routes
}

/// Company anchors on a route page
pub fn parse_summaries(
    html: &str,
    route: &Route,
    base_url: &Url,
    name_order: &[NameSource],
) -> Vec<CompanySummary> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut summaries = Vec::new();

    for anchor in document.select(&COMPANY_ANCHOR) {
        let Some(link) = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_link(base_url, href))
        else {
            continue;
        };
        if !seen.insert(link.clone()) {
            continue;
        }

        let name = resolve_name(&document, &anchor, name_order, &NAME_RULES);
        summaries.push(CompanySummary::on_route(name, route, Some(link)));
    }

    summaries
}

/// Contact fields from a company page
pub fn parse_details(html: &str, base_url: &Url) -> DetailRecord {
    let document = Html::parse_document(html);
    let text = page_text(&document);

    let mut record = DetailRecord {
        resolved_name: first_text(&document, &NAME).unwrap_or_default(),
        tax_id: find_cnpj(&text),
        address: first_text(&document, &ADDRESS),
        ..Default::default()
    };

    record.email = first_attr(&document, &MAILTO, "href")
        .map(|href| href.replace("mailto:", "").trim().to_string())
        .filter(|email| !email.is_empty());

    record.telephone = first_attr(&document, &TEL, "href")
        .map(|href| href.replace("tel:", "").trim().to_string())
        .filter(|phone| !phone.is_empty());

    record.website = document
        .select(&EXTERNAL)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.contains("wa.me") && !is_same_site(base_url, href))
        .map(str::to_string);

    record.whatsapp = first_attr(&document, &WHATSAPP, "href");

    if record.telephone.is_none() {
        record.telephone = find_phone(&text);
    }
    if record.email.is_none() {
        record.email = find_email(&text);
    }

    record
}
