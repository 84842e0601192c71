use crate::error::{GraphError, Result};
use crate::provider::TitleResolution;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Publication identity: id scheme plus value, e.g. `doi:10.1000/xyz123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PubId {
    pub id_type: String,
    pub value: String,
}

impl PubId {
    pub fn new(id_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id_type: id_type.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for PubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id_type, self.value)
    }
}

/// A node of the reference graph. Page-like nodes are identified by title,
/// publications by their id pair.
#[derive(Debug, Clone)]
pub enum Node {
    WebPage(WebPageNode),
    Publication(PublicationNode),
    Category(CategoryNode),
}

impl Node {
    pub fn is_web_page(&self) -> bool {
        matches!(self, Node::WebPage(_))
    }

    pub fn is_publication(&self) -> bool {
        matches!(self, Node::Publication(_))
    }

    pub fn is_category(&self) -> bool {
        matches!(self, Node::Category(_))
    }

    /// Title of a page-like node; publications have none.
    pub fn title(&self) -> Option<&str> {
        match self {
            Node::WebPage(page) => Some(&page.title),
            Node::Category(cat) => Some(&cat.title),
            Node::Publication(_) => None,
        }
    }
}

/// A topic page that cites publications.
#[derive(Debug, Clone)]
pub struct WebPageNode {
    pub title: String,
    pub page_id: u64,
    pub address: String,
    pub depth: u32,
}

impl WebPageNode {
    /// URL path of a page, derived from its title.
    pub fn derive_address(title: &str) -> String {
        format!("/wiki/{}", title.replace(' ', "_"))
    }
}

#[derive(Debug, Clone)]
pub struct PublicationNode {
    pub id: PubId,
}

/// A category page discovered during expansion. Only ever lives in a
/// per-query expansion subgraph, never in the full graph.
#[derive(Debug, Clone)]
pub struct CategoryNode {
    pub title: String,
    pub address: String,
}

/// One citation record from the tabular input: a page cites a publication.
#[derive(Debug, Clone, Deserialize)]
pub struct CitationRow {
    pub page_title: String,
    pub page_id: u64,
    pub pub_id_type: String,
    pub pub_id_value: String,
}

impl CitationRow {
    pub(crate) fn validate(&self, line: usize) -> Result<()> {
        let missing = if self.page_title.trim().is_empty() {
            Some("page_title")
        } else if self.pub_id_type.trim().is_empty() {
            Some("pub_id_type")
        } else if self.pub_id_value.trim().is_empty() {
            Some("pub_id_value")
        } else {
            None
        };
        match missing {
            Some(field) => Err(GraphError::Validation {
                line,
                reason: format!("missing required field `{field}`"),
            }),
            None => Ok(()),
        }
    }

    pub fn publication_id(&self) -> PubId {
        PubId::new(self.pub_id_type.clone(), self.pub_id_value.clone())
    }
}

/// One entry of the full centrality ranking.
#[derive(Debug, Clone, Serialize)]
pub struct RankedPublication {
    pub id: PubId,
    pub citations: usize,
    pub centrality: f64,
}

/// One entry of the expander output, rank positions starting at 1.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub rank: usize,
    pub citations: usize,
    pub id: PubId,
    pub source_link: String,
    pub title: TitleResolution,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_address_replaces_spaces() {
        assert_eq!(
            WebPageNode::derive_address("Graph theory"),
            "/wiki/Graph_theory"
        );
        assert_eq!(WebPageNode::derive_address("Logic"), "/wiki/Logic");
    }

    #[test]
    fn test_pub_id_display() {
        let id = PubId::new("doi", "10.1/x");
        assert_eq!(id.to_string(), "doi:10.1/x");
    }

    #[test]
    fn test_row_validation_rejects_blank_fields() {
        let row = CitationRow {
            page_title: "  ".to_string(),
            page_id: 1,
            pub_id_type: "doi".to_string(),
            pub_id_value: "10.1/x".to_string(),
        };
        assert!(row.validate(3).is_err());
    }
}
