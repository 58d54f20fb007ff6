//! Numeric source ids as exposed to callers

use super::{Cargas, GuiaDoTransporte, PortalDosFretes, SourceAdapter};
use crate::config::Config;
use crate::crawler::PageFetcher;
use crate::ScoutError;
use std::fmt;
use std::sync::Arc;

/// Stable ids of the supported directory sites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    PortalDosFretes = 1,
    Cargas = 2,
    GuiaDoTransporte = 3,
}

impl SourceId {
    pub const ALL: [SourceId; 3] = [
        SourceId::PortalDosFretes,
        SourceId::Cargas,
        SourceId::GuiaDoTransporte,
    ];

    pub fn id(self) -> u32 {
        self as u32
    }

    /// Looks up an id, listing the valid ones on failure
    pub fn from_id(id: u32) -> Result<Self, ScoutError> {
        Self::ALL
            .into_iter()
            .find(|source| source.id() == id)
            .ok_or_else(|| ScoutError::UnknownSource {
                id,
                valid: Self::ALL
                    .iter()
                    .map(|source| source.id().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SourceId::PortalDosFretes => "Portal dos Fretes",
            SourceId::Cargas => "Cargas.com.br",
            SourceId::GuiaDoTransporte => "Guia do Transporte",
        }
    }

    /// Builds the adapter for this site from its configuration section
    pub fn build(
        self,
        fetcher: PageFetcher,
        config: &Config,
    ) -> Result<Arc<dyn SourceAdapter>, ScoutError> {
        let sources = &config.sources;
        let adapter: Arc<dyn SourceAdapter> = match self {
            SourceId::PortalDosFretes => {
                Arc::new(PortalDosFretes::new(fetcher, &sources.portal_dos_fretes)?)
            }
            SourceId::Cargas => Arc::new(Cargas::new(fetcher, &sources.cargas)?),
            SourceId::GuiaDoTransporte => {
                Arc::new(GuiaDoTransporte::new(fetcher, &sources.guia_do_transporte)?)
            }
        };
        Ok(adapter)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.id())
    }
}
