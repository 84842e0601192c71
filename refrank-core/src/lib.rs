pub mod error;
pub mod expand;
pub mod graph;
pub mod loader;
pub mod model;
pub mod provider;
mod rank;

pub use error::{GraphError, Result};
pub use expand::{Expander, ExpanderConfig, MergeKey};
pub use graph::RefGraph;
pub use loader::{load_citations, read_citations};
pub use model::{CitationRow, Node, PubId, RankedPublication, Recommendation};
pub use provider::{CategoryTag, MetadataProvider, ResolvedPublication, TitleResolution};
