//! Cargas.com.br adapter
//!
//! Layout notes:
//! - Listing pages live at `/rotas?page={n}`
//! - Route links are `/transportadoras/{origin}/{destination}`, percent-encoded
//! - Company links are `/transportadora/{slug}` (singular)
//! - Detail pages keep everything in positional blocks under `#cargasAbout`

use super::{page_count, resolve_name, NameRules, SourceAdapter, SourceSettings};
use crate::config::{NameSource, SourceConfig};
use crate::crawler::{
    find_cnpj, find_email, find_phone, find_state_registration, first_attr, first_text,
    page_text, resolve_link, selector, slug_to_place, stripped_text, PageFetcher,
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

static PAGINATION: Lazy<Selector> = Lazy::new(|| selector("a[href*='rotas?page=']"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static HEADING: Lazy<Selector> = Lazy::new(|| selector("h1"));
static WHATSAPP: Lazy<Selector> =
    Lazy::new(|| selector("a[href*='wa.me'], a[href*='whatsapp']"));

const ABOUT: &str = "#cargasAbout div div div:nth-of-type(3)";

static REGISTRATION: Lazy<Selector> =
    Lazy::new(|| selector(&format!("{ABOUT} div:nth-of-type(1) p:nth-of-type(1)")));
static ADDRESS: Lazy<Selector> =
    Lazy::new(|| selector(&format!("{ABOUT} div:nth-of-type(1) p:nth-of-type(2)")));
static EMAIL: Lazy<Selector> = Lazy::new(|| {
    selector(&format!(
        "{ABOUT} div:nth-of-type(2) div:nth-of-type(2) div a[href^='mailto:']"
    ))
});
static PHONE: Lazy<Selector> = Lazy::new(|| {
    selector(&format!(
        "{ABOUT} div:nth-of-type(2) div:nth-of-type(3) div a[href^='tel:']"
    ))
});
static SITE: Lazy<Selector> = Lazy::new(|| {
    selector(&format!(
        "{ABOUT} div:nth-of-type(2) div:nth-of-type(4) div a[href^='http']"
    ))
});

// Company anchors carry the name as their own text; no other location exists
static NAME_RULES: Lazy<NameRules> = Lazy::new(NameRules::default);

const ROUTE_MARKER: &str = "/transportadoras/";
const COMPANY_MARKER: &str = "/transportadora/";

/// Adapter for cargas.com.br
pub struct Cargas {
    fetcher: PageFetcher,
    settings: SourceSettings,
}

impl Cargas {
    pub fn new(fetcher: PageFetcher, config: &SourceConfig) -> Result<Self, ScoutError> {
        Ok(Self {
            fetcher,
            settings: SourceSettings::from_config(config, &NAME_RULES)?,
        })
    }

    fn listing_url(&self, page: u32) -> Option<Url> {
        self.settings.page_url(&format!("/rotas?page={}", page)).ok()
    }
}

#[async_trait]
impl SourceAdapter for Cargas {
    fn name(&self) -> &'static str {
        "Cargas.com.br"
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

    async fn extract_details(&self, summary: &CompanySummary, _route: &Route) -> DetailRecord {
        let Some(link) = &summary.detail_link else {
            return DetailRecord::default();
        };
        match self.fetcher.fetch_detail(link).await {
            Some(html) => parse_details(&html),
            None => DetailRecord::default(),
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

/// Route links of the form `/transportadoras/{origin}/{destination}`
pub fn parse_routes(html: &str, base_url: &Url) -> Vec<Route> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut routes = Vec::new();

    for anchor in document.select(&ANCHOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains(ROUTE_MARKER) {
            continue;
        }

        let decoded = urlencoding::decode(href)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| href.to_string());
        let Some(tail) = decoded.rsplit(ROUTE_MARKER).next() else {
            continue;
        };

        let parts: Vec<&str> = tail.split('/').collect();
        let [origin, destination] = parts.as_slice() else {
            continue;
        };

        let Some(link) = resolve_link(base_url, href) else {
            continue;
        };
        if seen.insert(link.clone()) {
            routes.push(Route::new(
                slug_to_place(origin),
                slug_to_place(destination),
                link,
            ));
        }
    }

    routes
}

/// Company links on a route page
pub fn parse_summaries(
    html: &str,
    route: &Route,
    base_url: &Url,
    name_order: &[NameSource],
) -> Vec<CompanySummary> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut summaries = Vec::new();

    for anchor in document.select(&ANCHOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains(COMPANY_MARKER) || href.contains(ROUTE_MARKER) {
            continue;
        }

        let Some(link) = resolve_link(base_url, href) else {
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
pub fn parse_details(html: &str) -> DetailRecord {
    let document = Html::parse_document(html);
    let mut record = DetailRecord {
        resolved_name: first_text(&document, &HEADING).unwrap_or_default(),
        ..Default::default()
    };

    if let Some(block) = document.select(&REGISTRATION).next() {
        let text = stripped_text(&block, " ");
        record.tax_id = find_cnpj(&text);
        record.state_registration = find_state_registration(&text);
    }

    record.address = first_text(&document, &ADDRESS);

    record.email = first_attr(&document, &EMAIL, "href")
        .map(|href| href.replace("mailto:", "").trim().to_string())
        .filter(|email| !email.is_empty());

    record.telephone = first_attr(&document, &PHONE, "href")
        .map(|href| href.replace("tel:", "").trim().to_string())
        .filter(|phone| !phone.is_empty());

    record.website = first_attr(&document, &SITE, "href");

    record.whatsapp = first_attr(&document, &WHATSAPP, "href");

    let text = page_text(&document);
    if record.telephone.is_none() {
        record.telephone = find_phone(&text);
    }
    if record.email.is_none() {
        record.email = find_email(&text);
    }
    if record.tax_id.is_none() {
        record.tax_id = find_cnpj(&text);
    }

    record
}
