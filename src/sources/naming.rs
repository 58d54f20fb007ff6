//! Company-name resolution on route pages
//!
//! Sites put the company name in different places, and sometimes in several.
//! The fallback order is per-adapter configuration (`name-fallback`); each
//! adapter also brings its own selectors for the candidate locations. A site
//! without a given location leaves that rule out, and the candidate is
//! skipped.

use crate::config::NameSource;
use crate::crawler::{ancestor_attr, next_matching, stripped_text};
use scraper::{ElementRef, Html, Selector};

/// Where a site keeps each name candidate relative to the company anchor
#[derive(Debug, Default)]
pub struct NameRules {
    /// Tag and attribute of the enclosing card element holding the name
    pub card: Option<(&'static str, &'static str)>,

    /// Labelled element following the anchor
    pub label: Option<Selector>,

    /// Heading nested inside the anchor
    pub heading: Option<Selector>,
}

impl NameRules {
    /// Whether this site has the given candidate location at all
    pub fn supports(&self, source: NameSource) -> bool {
        match source {
            NameSource::AnchorText => true,
            NameSource::CardAttribute => self.card.is_some(),
            NameSource::NearbyLabel => self.label.is_some(),
            NameSource::InnerHeading => self.heading.is_some(),
        }
    }
}

/// Walks `order` and returns the first non-empty candidate
///
/// Returns the empty string when every candidate location is empty.
pub fn resolve_name(
    document: &Html,
    anchor: &ElementRef,
    order: &[NameSource],
    rules: &NameRules,
) -> String {
    order
        .iter()
        .find_map(|source| candidate(document, anchor, *source, rules))
        .unwrap_or_default()
}

fn candidate(
    document: &Html,
    anchor: &ElementRef,
    source: NameSource,
    rules: &NameRules,
) -> Option<String> {
    let name = match source {
        NameSource::AnchorText => stripped_text(anchor, ""),
        NameSource::CardAttribute => {
            let (tag, attr) = rules.card?;
            ancestor_attr(anchor, tag, attr)?
        }
        NameSource::NearbyLabel => {
            let label = next_matching(document, anchor, rules.label.as_ref()?)?;
            stripped_text(&label, "")
        }
        NameSource::InnerHeading => {
            let heading = anchor.select(rules.heading.as_ref()?).next()?;
            stripped_text(&heading, "")
        }
    };

    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}
