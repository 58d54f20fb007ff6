//! Output module for the JSON documents printed by the binary
//!
//! This module handles:
//! - The source listing (id, display name, page count)
//! - Rendering page outcomes and listings as pretty or compact JSON

use crate::config::Config;
use crate::crawler::{PageFetcher, Pipeline};
use crate::sources::SourceId;
use crate::ScoutError;
use serde::Serialize;
use std::io::Write;

/// One registered source, as shown by the `sources` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceListing {
    pub id: u32,

    #[serde(rename = "nome")]
    pub name: String,

    /// 0 when the site could not be reached
    #[serde(rename = "total_paginas")]
    pub total_pages: u32,
}

/// Lists every registered source with its current page count
///
/// Sources are queried one after another. An unreachable site is listed
/// with zero pages.
pub async fn list_sources(
    fetcher: &PageFetcher,
    config: &Config,
) -> Result<Vec<SourceListing>, ScoutError> {
    let mut listings = Vec::with_capacity(SourceId::ALL.len());

    for source in SourceId::ALL {
        let pipeline = Pipeline::new(source.build(fetcher.clone(), config)?);
        let total_pages = pipeline.total_pages().await;
        tracing::info!("{}: {} pages", source, total_pages);

        listings.push(SourceListing {
            id: source.id(),
            name: source.display_name().to_string(),
            total_pages,
        });
    }

    Ok(listings)
}

/// Serializes `value` as JSON, indented unless `compact`
pub fn render_json<T: Serialize + ?Sized>(value: &T, compact: bool) -> Result<String, ScoutError> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(json)
}

/// Writes the rendered JSON followed by a newline
pub fn write_json<W: Write, T: Serialize + ?Sized>(
    mut writer: W,
    value: &T,
    compact: bool,
) -> Result<(), ScoutError> {
    let json = render_json(value, compact)?;
    writeln!(writer, "{}", json)?;
    Ok(())
}
