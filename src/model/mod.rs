//! Data model shared by the adapters, the aggregator and the output layer
//!
//! # Components
//!
//! - `Route`, `CompanySummary`: transient listing data, discarded after a page run
//! - `DetailRecord`: fields read from one detail page
//! - `AggregatedCompany`, `PageOutcome`: the finished output of a page run

mod company;
mod route;

pub use company::{AggregatedCompany, DetailRecord, PageOutcome, RouteSets};
pub use route::{CompanySummary, Route};
