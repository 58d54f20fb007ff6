//! Crawler module for page fetching and per-page orchestration
//!
//! This module contains the site-independent machinery, including:
//! - HTTP fetching with retry logic
//! - HTML text and pattern helpers shared by the source adapters
//! - Bounded scheduling of detail fetches
//! - Name-keyed aggregation of company occurrences
//! - The page pipeline tying these together

mod aggregator;
mod fetcher;
mod parser;
mod pipeline;
mod scheduler;

pub use aggregator::Aggregator;
pub use fetcher::{build_http_client, fetch_url, FetchResult, PageFetcher};
pub use parser::{
    ancestor_attr, decode_cf_email, find_cnpj, find_email, find_phone, find_state_registration,
    first_attr, first_text, is_same_site, next_matching, page_text, resolve_link, selector,
    slug_to_place, stripped_text, title_case,
};
pub use pipeline::Pipeline;
pub use scheduler::FetchScheduler;
