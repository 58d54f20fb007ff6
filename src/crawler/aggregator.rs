//! Name-keyed merge of company occurrences
//!
//! The aggregator folds `(summary, detail record)` events into one entry per
//! canonical company name. Events may arrive in any order; the finished list
//! is the same regardless.
//!
//! # Keying
//!
//! 1. A non-empty resolved name from the detail page is the key.
//! 2. Otherwise the occurrence waits under its company identity: the detail
//!    link, or the listing name when there is no link.
//!
//! The first resolved name seen for an identity renames that company once.
//! Waiting occurrences follow the rename when the list is finished, and fall
//! back to their listing name when their company never resolved. An unnamed
//! occurrence without a link has no identity and is never renamed.
//!
//! # Details
//!
//! An entry's details are only replaced while they are still empty, so a
//! later failed fetch never erases a populated record.

use crate::model::{AggregatedCompany, CompanySummary, DetailRecord, RouteSets};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Accumulated state for one canonical name
#[derive(Debug, Default)]
struct Entry {
    origins: BTreeSet<String>,
    destinations: BTreeSet<String>,
    details: DetailRecord,
}

impl Entry {
    fn add_route(&mut self, summary: &CompanySummary) {
        if let Some(origin) = &summary.origin_candidate {
            self.origins.insert(origin.clone());
        }
        if let Some(destination) = &summary.destination_candidate {
            self.destinations.insert(destination.clone());
        }
    }

    fn offer_details(&mut self, details: &DetailRecord) {
        if self.details.is_empty() && !details.is_empty() {
            self.details = details.clone();
        }
    }

    fn absorb(&mut self, other: Entry) {
        self.origins.extend(other.origins);
        self.destinations.extend(other.destinations);
        self.offer_details(&other.details);
    }
}

/// What tells two occurrences apart as companies
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Identity {
    Link(String),
    Name(String),
}

impl Identity {
    fn of(summary: &CompanySummary) -> Option<Self> {
        match &summary.detail_link {
            Some(link) => Some(Identity::Link(link.to_string())),
            None => {
                let name = summary.name.trim();
                (!name.is_empty()).then(|| Identity::Name(name.to_string()))
            }
        }
    }
}

/// Occurrences of one company that have not resolved a name yet
#[derive(Debug, Default)]
struct Waiting {
    listing_name: String,
    entry: Entry,
}

/// Merges company occurrences for one page run
#[derive(Debug, Default)]
pub struct Aggregator {
    entries: HashMap<String, Entry>,

    /// Unresolved occurrences by company identity
    waiting: HashMap<Identity, Waiting>,

    /// Company identity → the resolved name it was renamed to
    renamed: HashMap<Identity, String>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one occurrence and the detail record fetched for it
    ///
    /// Pass `DetailRecord::default()` for occurrences that were never fetched.
    pub fn absorb(&mut self, summary: &CompanySummary, details: &DetailRecord) {
        let listing_name = summary.name.trim();
        let identity = Identity::of(summary);

        let entry = match (details.resolved(), identity) {
            (Some(resolved), identity) => {
                if let Some(identity) = identity {
                    if !self.renamed.contains_key(&identity) {
                        if resolved != listing_name {
                            tracing::debug!("Renaming '{}' to '{}'", listing_name, resolved);
                        }
                        self.renamed.insert(identity, resolved.to_string());
                    }
                }
                self.entries.entry(resolved.to_string()).or_default()
            }
            (None, Some(identity)) => match self.renamed.get(&identity) {
                Some(resolved) => self.entries.entry(resolved.clone()).or_default(),
                None => {
                    &mut self
                        .waiting
                        .entry(identity)
                        .or_insert_with(|| Waiting {
                            listing_name: listing_name.to_string(),
                            entry: Entry::default(),
                        })
                        .entry
                }
            },
            (None, None) => self.entries.entry(listing_name.to_string()).or_default(),
        };

        entry.add_route(summary);
        entry.offer_details(details);
    }

    /// Number of distinct companies so far
    pub(crate) fn len(&self) -> usize {
        let mut names: HashSet<&str> = self.entries.keys().map(String::as_str).collect();
        for (identity, waiting) in &self.waiting {
            let name = self
                .renamed
                .get(identity)
                .unwrap_or(&waiting.listing_name);
            names.insert(name);
        }
        names.len()
    }

    /// Emits the merged companies, route sets as sorted lists
    ///
    /// The list itself is ordered by name.
    pub fn finish(mut self) -> Vec<AggregatedCompany> {
        for (identity, waiting) in std::mem::take(&mut self.waiting) {
            let name = self
                .renamed
                .remove(&identity)
                .unwrap_or(waiting.listing_name);
            self.entries.entry(name).or_default().absorb(waiting.entry);
        }

        let mut companies: Vec<AggregatedCompany> = self
            .entries
            .into_iter()
            .map(|(name, entry)| AggregatedCompany {
                name,
                routes: RouteSets {
                    origins: entry.origins.into_iter().collect(),
                    destinations: entry.destinations.into_iter().collect(),
                },
                details: entry.details,
            })
            .collect();

        companies.sort_by(|a, b| a.name.cmp(&b.name));
        companies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(name: &str, origin: &str, destination: &str) -> CompanySummary {
        CompanySummary {
            name: name.to_string(),
            origin_candidate: Some(origin.to_string()),
            destination_candidate: Some(destination.to_string()),
            detail_link: None,
        }
    }

    fn details(resolved: &str, phone: Option<&str>) -> DetailRecord {
        DetailRecord {
            resolved_name: resolved.to_string(),
            telephone: phone.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_merges_routes_under_resolved_name() {
        let mut aggregator = Aggregator::new();
        aggregator.absorb(
            &summary("Zurcad", "Santos", "Recife"),
            &details("Zurcad Transportes", Some("(11) 1234-5678")),
        );
        aggregator.absorb(
            &summary("ZURCAD", "Campinas", "Recife"),
            &details("Zurcad Transportes", Some("(11) 1234-5678")),
        );

        let companies = aggregator.finish();
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].name, "Zurcad Transportes");
        assert_eq!(companies[0].routes.origins, vec!["Campinas", "Santos"]);
        assert_eq!(companies[0].routes.destinations, vec!["Recife"]);
    }

    #[test]
    fn test_populated_details_are_never_clobbered() {
        let mut aggregator = Aggregator::new();
        aggregator.absorb(
            &summary("Zurcad", "Santos", "Recife"),
            &details("Zurcad", Some("(11) 1234-5678")),
        );
        aggregator.absorb(&summary("Zurcad", "Natal", "Recife"), &DetailRecord::default());
        aggregator.absorb(
            &summary("Zurcad", "Belem", "Recife"),
            &details("Zurcad", Some("(21) 0000-0000")),
        );

        let companies = aggregator.finish();
        assert_eq!(companies.len(), 1);
        assert_eq!(
            companies[0].details.telephone,
            Some("(11) 1234-5678".to_string())
        );
        assert_eq!(companies[0].routes.origins, vec!["Belem", "Natal", "Santos"]);
    }

    #[test]
    fn test_rename_carries_accumulated_routes() {
        let mut aggregator = Aggregator::new();

        // Fetch failed for the first occurrence, so it is keyed by listing name
        aggregator.absorb(
            &summary("ABC Transportes", "Curitiba", "Joinville"),
            &DetailRecord::default(),
        );
        aggregator.absorb(
            &summary("ABC Transportes", "Londrina", "Maringa"),
            &details("ABC Transportes Ltda", Some("(41) 3333-4444")),
        );
        // A later failure follows the rename
        aggregator.absorb(
            &summary(" ABC Transportes ", "Cascavel", "Joinville"),
            &DetailRecord::default(),
        );

        let companies = aggregator.finish();
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].name, "ABC Transportes Ltda");
        assert_eq!(
            companies[0].routes.origins,
            vec!["Cascavel", "Curitiba", "Londrina"]
        );
        assert_eq!(companies[0].routes.destinations, vec!["Joinville", "Maringa"]);
        assert_eq!(
            companies[0].details.telephone,
            Some("(41) 3333-4444".to_string())
        );
    }

    #[test]
    fn test_rename_merges_into_existing_entry() {
        let mut aggregator = Aggregator::new();
        aggregator.absorb(
            &summary("Rapido Sul", "Porto Alegre", "Pelotas"),
            &details("Rapido Sul Cargas", Some("(51) 1111-2222")),
        );
        aggregator.absorb(&summary("Rapido", "Canoas", "Pelotas"), &DetailRecord::default());
        aggregator.absorb(
            &summary("Rapido", "Gravatai", "Pelotas"),
            &details("Rapido Sul Cargas", None),
        );

        let companies = aggregator.finish();
        assert_eq!(companies.len(), 1);
        assert_eq!(
            companies[0].routes.origins,
            vec!["Canoas", "Gravatai", "Porto Alegre"]
        );
        assert_eq!(
            companies[0].details.telephone,
            Some("(51) 1111-2222".to_string())
        );
    }

    #[test]
    fn test_order_independence() {
        let events = vec![
            (summary("ABC", "A", "B"), DetailRecord::default()),
            (summary("ABC", "C", "D"), details("ABC Ltda", Some("1"))),
            (summary("XYZ", "E", "F"), details("", Some("2"))),
            (summary("XYZ", "E", "G"), DetailRecord::default()),
        ];

        let mut forward = Aggregator::new();
        for (s, d) in &events {
            forward.absorb(s, d);
        }

        let mut backward = Aggregator::new();
        for (s, d) in events.iter().rev() {
            backward.absorb(s, d);
        }

        assert_eq!(forward.finish(), backward.finish());
    }

    #[test]
    fn test_unnamed_companies_stay_apart_in_any_order() {
        let linked = |origin: &str, slug: &str| CompanySummary {
            name: String::new(),
            origin_candidate: Some(origin.to_string()),
            destination_candidate: None,
            detail_link: Some(
                url::Url::parse("https://fretes.example/transportadora/")
                    .unwrap()
                    .join(slug)
                    .unwrap(),
            ),
        };
        let failed = (linked("Fail", "sem-pagina"), DetailRecord::default());
        let alpha = (linked("PA", "alpha"), details("Alpha Ltda", Some("1")));
        let beta = (linked("PB", "beta"), details("Beta Ltda", Some("2")));

        let orders = [
            [&failed, &alpha, &beta],
            [&failed, &beta, &alpha],
            [&alpha, &failed, &beta],
            [&beta, &alpha, &failed],
        ];

        let results: Vec<_> = orders
            .iter()
            .map(|order| {
                let mut aggregator = Aggregator::new();
                for (s, d) in order.iter() {
                    aggregator.absorb(s, d);
                }
                aggregator.finish()
            })
            .collect();

        for result in &results[1..] {
            assert_eq!(result, &results[0]);
        }

        let names: Vec<_> = results[0].iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["", "Alpha Ltda", "Beta Ltda"]);
        assert_eq!(results[0][0].routes.origins, vec!["Fail"]);
        assert_eq!(results[0][1].routes.origins, vec!["PA"]);
        assert_eq!(results[0][2].routes.origins, vec!["PB"]);
    }

    #[test]
    fn test_same_listing_name_different_links() {
        let mut aggregator = Aggregator::new();
        let at = |slug: &str, origin: &str| CompanySummary {
            name: "Transportes".to_string(),
            origin_candidate: Some(origin.to_string()),
            destination_candidate: None,
            detail_link: Some(
                url::Url::parse("https://fretes.example/transportadora/")
                    .unwrap()
                    .join(slug)
                    .unwrap(),
            ),
        };

        aggregator.absorb(&at("norte", "Belem"), &details("Transportes Norte", Some("1")));
        aggregator.absorb(&at("sul", "Pelotas"), &DetailRecord::default());
        aggregator.absorb(&at("norte", "Manaus"), &DetailRecord::default());
        assert_eq!(aggregator.len(), 2);

        let companies = aggregator.finish();
        assert_eq!(companies.len(), 2);
        assert_eq!(companies[0].name, "Transportes");
        assert_eq!(companies[0].routes.origins, vec!["Pelotas"]);
        assert_eq!(companies[1].name, "Transportes Norte");
        assert_eq!(companies[1].routes.origins, vec!["Belem", "Manaus"]);
    }

    #[test]
    fn test_unnamed_and_routeless_occurrences() {
        let mut aggregator = Aggregator::new();
        let unnamed = CompanySummary {
            name: "  ".to_string(),
            origin_candidate: None,
            destination_candidate: None,
            detail_link: None,
        };
        aggregator.absorb(&unnamed, &DetailRecord::default());

        assert_eq!(aggregator.len(), 1);
        let companies = aggregator.finish();
        assert_eq!(companies[0].name, "");
        assert!(companies[0].routes.origins.is_empty());
        assert!(companies[0].details.is_empty());
    }
}
