//! Listing-side types: routes and the company occurrences found on them
use url::Url;

/// An origin→destination pairing a site groups carrier listings under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Best-effort origin, parsed from the URL slug or link text
    pub origin: Option<String>,

    /// Best-effort destination, parsed from the URL slug or link text
    pub destination: Option<String>,

    /// Absolute URL of the route page
    pub link: Url,
}

impl Route {
    pub fn new(origin: Option<String>, destination: Option<String>, link: Url) -> Self {
        Self {
            origin: non_blank(origin),
            destination: non_blank(destination),
            link,
        }
    }
}

/// One company occurrence on one route page
///
/// The same company shows up once per route it serves; the aggregator merges
/// these occurrences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanySummary {
    /// Name as shown on the listing; empty when no candidate location had one
    pub name: String,

    pub origin_candidate: Option<String>,

    pub destination_candidate: Option<String>,

    /// Absolute URL of the company's detail page
    pub detail_link: Option<Url>,
}

impl CompanySummary {
    /// Builds a summary that inherits origin and destination from its route
    pub fn on_route(name: impl Into<String>, route: &Route, detail_link: Option<Url>) -> Self {
        Self {
            name: name.into(),
            origin_candidate: route.origin.clone(),
            destination_candidate: route.destination.clone(),
            detail_link,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
