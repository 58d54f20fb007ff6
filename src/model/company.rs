//! Detail-side and aggregated company types
//!
//! These types carry the wire names consumed by the dispatch layer
//! (`nome`, `rotas`, `detalhes`, ...).
use serde::Serialize;

/// Contact and registration fields read from a company's detail page
///
/// Every field is optional. A field missing from the page and a field that
/// failed to parse are both `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetailRecord {
    /// Name shown on the detail page; empty when the page did not yield one
    #[serde(skip)]
    pub resolved_name: String,

    #[serde(rename = "telefone")]
    pub telephone: Option<String>,

    pub whatsapp: Option<String>,

    #[serde(rename = "site")]
    pub website: Option<String>,

    pub email: Option<String>,

    #[serde(rename = "endereco")]
    pub address: Option<String>,

    /// CNPJ
    #[serde(rename = "cnpj")]
    pub tax_id: Option<String>,

    #[serde(rename = "inscricao_estadual")]
    pub state_registration: Option<String>,

    /// ANTT registration number
    #[serde(rename = "antt")]
    pub additional_id: Option<String>,
}

impl DetailRecord {
    /// True when no contact or registration field was found
    ///
    /// The resolved name does not count: a page with only a heading carries
    /// no details worth keeping.
    pub fn is_empty(&self) -> bool {
        self.telephone.is_none()
            && self.whatsapp.is_none()
            && self.website.is_none()
            && self.email.is_none()
            && self.address.is_none()
            && self.tax_id.is_none()
            && self.state_registration.is_none()
            && self.additional_id.is_none()
    }

    /// The resolved name, trimmed, if there is one
    pub fn resolved(&self) -> Option<&str> {
        let name = self.resolved_name.trim();
        (!name.is_empty()).then_some(name)
    }
}

/// Route sets of an aggregated company, sorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteSets {
    #[serde(rename = "origens")]
    pub origins: Vec<String>,

    #[serde(rename = "destinos")]
    pub destinations: Vec<String>,
}

/// One carrier after every occurrence across a page's routes was merged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedCompany {
    #[serde(rename = "nome")]
    pub name: String,

    #[serde(rename = "rotas")]
    pub routes: RouteSets,

    #[serde(rename = "detalhes")]
    pub details: DetailRecord,
}

/// Result of running one listing page of one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PageOutcome {
    /// Route enumeration found routes; the list may still be empty
    Companies(Vec<AggregatedCompany>),

    /// Route enumeration found nothing on that page
    NoRoutes {
        #[serde(rename = "mensagem")]
        message: String,
    },
}

impl PageOutcome {
    pub fn no_routes(page: u32) -> Self {
        Self::NoRoutes {
            message: format!("Nenhuma rota encontrada na página {}", page),
        }
    }

    pub fn companies(&self) -> Option<&[AggregatedCompany]> {
        match self {
            Self::Companies(list) => Some(list),
            Self::NoRoutes { .. } => None,
        }
    }
}
