//! Tender list query parameters and the paginated response page.

use serde::{Deserialize, Serialize};

use super::tender::{Tender, TenderStatus};

/// Query parameters for `GET /api/tenders`.
///
/// Every distinct combination of parameters is a distinct cache key:
/// changing the search text or page starts its own fetch without
/// evicting pages already cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TenderQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TenderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

impl Default for TenderQuery {
    fn default() -> Self {
        Self {
            q: None,
            status: None,
            date_from: None,
            date_to: None,
            page: 1,
            per_page: 20,
        }
    }
}

impl TenderQuery {
    /// Same filters, different page.
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }
}

/// One page of the tender list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderPage {
    pub items: Vec<Tender>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl TenderPage {
    /// "Previous" is meaningful only past the first page.
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// "Next" is meaningful only before the last page.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}
