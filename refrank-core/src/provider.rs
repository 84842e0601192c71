use crate::model::PubId;
use async_trait::async_trait;
use serde::Serialize;

/// Outcome of a publication title lookup. Callers branch on the variant
/// instead of comparing against a sentinel string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TitleResolution {
    Resolved(String),
    Unresolved,
}

impl TitleResolution {
    /// Human-readable title, "N/A" when the lookup failed.
    pub fn as_str(&self) -> &str {
        match self {
            TitleResolution::Resolved(title) => title,
            TitleResolution::Unresolved => "N/A",
        }
    }
}

/// Display metadata for one publication.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPublication {
    pub source_link: String,
    pub title: TitleResolution,
}

/// A category link found on a page.
#[derive(Debug, Clone)]
pub struct CategoryTag {
    pub title: String,
    pub href: String,
}

/// External metadata collaborator consumed by the relevance expander.
///
/// Implementations absorb their own failures: a lookup that goes wrong
/// returns an empty sequence or an `Unresolved` title, never an error, so a
/// single dead page can only shrink the expansion, not abort the query.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Source link and display title for a publication.
    async fn resolve_publication(&self, id: &PubId) -> ResolvedPublication;

    /// Category links of the page at `page_address` (a URL path).
    async fn fetch_categories(&self, page_address: &str) -> Vec<CategoryTag>;

    /// Titles of the pages directly under a category.
    async fn fetch_category_children(&self, category_name: &str) -> Vec<String>;
}
