//! Portal dos Fretes adapter
//!
//! Layout notes:
//! - Listing pages live at `/rotas/pagina-{n}`
//! - Route anchors read "Fretes de X para Y"; endpoints come from the
//!   `frete-de-x-para-y` slug
//! - Company cards may hide the name in a `data-nome` attribute or a `p.blue`
//!   label next to a logo-only anchor
//! - Detail pages label their fields inside plain paragraphs and protect the
//!   email address with Cloudflare obfuscation

use super::{page_count, resolve_name, NameRules, SourceAdapter, SourceSettings};
use crate::config::{NameSource, SourceConfig};
use crate::crawler::{
    decode_cf_email, find_cnpj, find_email, find_phone, first_text, is_same_site, page_text,
    resolve_link, selector, slug_to_place, stripped_text, PageFetcher,
};
use crate::model::{CompanySummary, DetailRecord, Route};
use crate::ScoutError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

static PAGINATION: Lazy<Selector> = Lazy::new(|| selector("a[href*='/rotas/pagina-']"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static COMPANY_ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a[href*='/transportadora/']"));
static TEL_ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a[href^='tel:']"));
static CF_EMAIL: Lazy<Selector> = Lazy::new(|| selector("span.__cf_email__"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| selector("p"));
static HEADING: Lazy<Selector> = Lazy::new(|| selector("h1"));

static NAME_RULES: Lazy<NameRules> = Lazy::new(|| NameRules {
    card: Some(("div", "data-nome")),
    label: Some(selector("p.blue")),
    heading: None,
});

const ROUTE_PREFIXES: [&str; 2] = ["Fretes de", "Frete de"];

/// Adapter for portaldosfretes.com.br
pub struct PortalDosFretes {
    fetcher: PageFetcher,
    settings: SourceSettings,
}

impl PortalDosFretes {
    pub fn new(fetcher: PageFetcher, config: &SourceConfig) -> Result<Self, ScoutError> {
        Ok(Self {
            fetcher,
            settings: SourceSettings::from_config(config, &NAME_RULES)?,
        })
    }

    fn listing_url(&self, page: u32) -> Option<Url> {
        self.settings
            .page_url(&format!("/rotas/pagina-{}", page))
            .ok()
    }
}

#[async_trait]
impl SourceAdapter for PortalDosFretes {
    fn name(&self) -> &'static str {
        "Portal dos Fretes"
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
            Some(html) => parse_details(&html, &self.settings.base_url),
            None => DetailRecord::default(),
        }
    }
}

/// Highest `pagina-N` index among the pagination anchors
pub fn parse_total_pages(html: &str) -> Option<u32> {
    let document = Html::parse_document(html);
    document
        .select(&PAGINATION)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| {
            let tail = href.rsplit("pagina-").next()?;
            tail.split('/').next()?.trim().parse::<u32>().ok()
        })
        .max()
}

/// Route anchors whose text starts with one of the route prefixes
pub fn parse_routes(html: &str, base_url: &Url) -> Vec<Route> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut routes = Vec::new();

    for anchor in document.select(&ANCHOR) {
        let text = stripped_text(&anchor, "");
        if !ROUTE_PREFIXES.iter().any(|prefix| text.starts_with(prefix)) {
            continue;
        }

        let Some(link) = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_link(base_url, href))
        else {
            continue;
        };

        if seen.insert(link.clone()) {
            let (origin, destination) = parse_route_slug(&link);
            routes.push(Route::new(origin, destination, link));
        }
    }

    routes
}

/// Splits a `frete-de-{origin}-para-{destination}` slug into place names
pub fn parse_route_slug(link: &Url) -> (Option<String>, Option<String>) {
    let slug = link
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or_default();
    let slug = slug.strip_prefix("frete-de-").unwrap_or(slug);

    let parts: Vec<&str> = slug.split("-para-").collect();
    match parts.as_slice() {
        [origin, destination] => (slug_to_place(origin), slug_to_place(destination)),
        _ => (None, None),
    }
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
    let mut record = DetailRecord {
        resolved_name: first_text(&document, &HEADING).unwrap_or_default(),
        ..Default::default()
    };

    record.telephone = document
        .select(&TEL_ANCHOR)
        .next()
        .map(|a| stripped_text(&a, "").replace("Telefone:", "").trim().to_string())
        .filter(|phone| !phone.is_empty());

    let anchors: Vec<&str> = document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .collect();

    record.whatsapp = anchors
        .iter()
        .find(|href| is_whatsapp(href))
        .map(|href| href.to_string());

    record.website = anchors
        .iter()
        .find(|href| href.contains("http") && !is_whatsapp(href) && !is_same_site(base_url, href))
        .map(|href| href.to_string());

    // A present but undecodable address stays empty; the text fallback only
    // covers pages without the obfuscated span
    let cf_span = document.select(&CF_EMAIL).next();
    let has_cf_span = cf_span.is_some();
    record.email = cf_span
        .and_then(|span| span.value().attr("data-cfemail"))
        .and_then(decode_cf_email);

    for paragraph in document.select(&PARAGRAPH) {
        let text = stripped_text(&paragraph, "");
        if text.contains("Endereço") {
            record.address = Some(text.replace("Endereço:", "").trim().to_string());
        }
        if text.contains("CNPJ") {
            record.tax_id = Some(text.replace("CNPJ:", "").trim().to_string());
        }
        if text.contains("Inscrição") || text.contains("I.E") {
            record.state_registration = Some(
                text.replace("Inscrição estadual:", "")
                    .replace("I.E:", "")
                    .trim()
                    .to_string(),
            );
        }
        if text.contains("ANTT") {
            record.additional_id = Some(
                text.replace("Número da ANTT:", "")
                    .replace("ANTT:", "")
                    .trim()
                    .to_string(),
            );
        }
    }

    let text = page_text(&document);
    if record.telephone.is_none() {
        record.telephone = find_phone(&text);
    }
    if record.email.is_none() && !has_cf_span {
        record.email = find_email(&text);
    }
    if record.tax_id.is_none() {
        record.tax_id = find_cnpj(&text);
    }

    record
}

fn is_whatsapp(href: &str) -> bool {
    href.contains("wa.me") || href.contains("whatsapp")
}
