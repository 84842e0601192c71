// Tests for the two-level relevance expander, driven by an in-memory
// metadata provider fake.

use async_trait::async_trait;
use refrank_core::{
    CategoryTag, CitationRow, Expander, GraphError, MergeKey, MetadataProvider, PubId, RefGraph,
    ResolvedPublication, TitleResolution,
};
use std::collections::HashMap;

fn row(title: &str, page_id: u64, value: &str) -> CitationRow {
    CitationRow {
        page_title: title.to_string(),
        page_id,
        pub_id_type: "doi".to_string(),
        pub_id_value: value.to_string(),
    }
}

fn doi(value: &str) -> PubId {
    PubId::new("doi", value)
}

/// Provider fake backed by plain maps. Anything not configured behaves like
/// a failed lookup: empty lists, unresolved titles.
#[derive(Default)]
struct FakeProvider {
    titles: HashMap<PubId, String>,
    categories: HashMap<String, Vec<CategoryTag>>,
    children: HashMap<String, Vec<String>>,
}

impl FakeProvider {
    fn with_title(mut self, id: PubId, title: &str) -> Self {
        self.titles.insert(id, title.to_string());
        self
    }

    fn with_categories(mut self, address: &str, categories: &[&str]) -> Self {
        let tags = categories
            .iter()
            .map(|c| CategoryTag {
                title: c.to_string(),
                href: format!("/wiki/Category:{}", c.replace(' ', "_")),
            })
            .collect();
        self.categories.insert(address.to_string(), tags);
        self
    }

    fn with_children(mut self, category: &str, children: &[&str]) -> Self {
        self.children.insert(
            category.to_string(),
            children.iter().map(|c| c.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl MetadataProvider for FakeProvider {
    async fn resolve_publication(&self, id: &PubId) -> ResolvedPublication {
        ResolvedPublication {
            source_link: format!("https://doi.org/{}", id.value),
            title: match self.titles.get(id) {
                Some(title) => TitleResolution::Resolved(title.clone()),
                None => TitleResolution::Unresolved,
            },
        }
    }

    async fn fetch_categories(&self, page_address: &str) -> Vec<CategoryTag> {
        self.categories.get(page_address).cloned().unwrap_or_default()
    }

    async fn fetch_category_children(&self, category_name: &str) -> Vec<String> {
        self.children.get(category_name).cloned().unwrap_or_default()
    }
}

// Seed x cited by A and B; A also cites y and z; B also cites y.
fn co_citation_rows() -> Vec<CitationRow> {
    vec![
        row("A", 1, "x"),
        row("B", 2, "x"),
        row("A", 1, "y"),
        row("A", 1, "z"),
        row("B", 2, "y"),
    ]
}

// ============================================================================
// Seed state
// ============================================================================

#[tokio::test]
async fn test_unknown_seed_fails() {
    let graph = RefGraph::from_rows(&co_citation_rows()).unwrap();
    let expander = Expander::new(&graph, FakeProvider::default());
    let err = expander
        .find_most_relevant(&doi("missing"), 10)
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::SeedNotFound(_)));
}

// ============================================================================
// Level 1
// ============================================================================

#[test]
fn test_level1_ranking_excludes_seed() {
    let graph = RefGraph::from_rows(&co_citation_rows()).unwrap();
    let expander = Expander::new(&graph, FakeProvider::default());

    let candidates = expander.level1_candidates(&doi("x")).unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0], (doi("y"), 2));
    assert_eq!(candidates[1], (doi("z"), 1));
}

// ============================================================================
// Degenerate expansion (provider returns nothing)
// ============================================================================

#[tokio::test]
async fn test_empty_provider_degenerates_to_level1() {
    let graph = RefGraph::from_rows(&co_citation_rows()).unwrap();
    let expander = Expander::new(&graph, FakeProvider::default());

    let results = expander.find_most_relevant(&doi("x"), 10).await.unwrap();

    let ids: Vec<&PubId> = results.iter().map(|r| &r.id).collect();
    assert_eq!(ids, vec![&doi("y"), &doi("z")]);
    assert_eq!(results[0].citations, 2);
    assert_eq!(results[1].citations, 1);
    assert_eq!(results[0].rank, 1);
    assert_eq!(results[1].rank, 2);
}

#[tokio::test]
async fn test_seed_never_recommended() {
    let graph = RefGraph::from_rows(&co_citation_rows()).unwrap();
    let expander = Expander::new(&graph, FakeProvider::default());

    let results = expander.find_most_relevant(&doi("x"), 10).await.unwrap();
    assert!(results.iter().all(|r| r.id != doi("x")));
}

// ============================================================================
// Category-mediated level 2
// ============================================================================

#[tokio::test]
async fn test_category_expansion_reaches_sibling_pages() {
    // A cites the seed; B shares a category with A and cites v and w, so
    // both appear only through the category expansion.
    let rows = vec![
        row("A", 1, "x"),
        row("B", 2, "w"),
        row("B", 2, "v"),
    ];
    let graph = RefGraph::from_rows(&rows).unwrap();
    let provider = FakeProvider::default()
        .with_categories("/wiki/A", &["Graph drawing"])
        .with_children("Graph drawing", &["B", "Unknown page"]);
    let expander = Expander::new(&graph, provider);

    let results = expander.find_most_relevant(&doi("x"), 10).await.unwrap();

    let ids: Vec<&PubId> = results.iter().map(|r| &r.id).collect();
    assert_eq!(ids, vec![&doi("w"), &doi("v")]);
    assert!(results.iter().all(|r| r.citations == 1));
}

#[tokio::test]
async fn test_category_children_outside_graph_are_ignored() {
    let rows = vec![row("A", 1, "x"), row("A", 1, "y")];
    let graph = RefGraph::from_rows(&rows).unwrap();
    let provider = FakeProvider::default()
        .with_categories("/wiki/A", &["Logic"])
        .with_children("Logic", &["Nonexistent"]);
    let expander = Expander::new(&graph, provider);

    let results = expander.find_most_relevant(&doi("x"), 10).await.unwrap();
    let ids: Vec<&PubId> = results.iter().map(|r| &r.id).collect();
    assert_eq!(ids, vec![&doi("y")]);
}

// ============================================================================
// Title resolution and merging
// ============================================================================

#[tokio::test]
async fn test_title_prefix_collision_sums_counts() {
    // y and z share the 10-character prefix "Graph Theo"; under the default
    // merge key they become one candidate with summed citations.
    let graph = RefGraph::from_rows(&co_citation_rows()).unwrap();
    let provider = FakeProvider::default()
        .with_title(doi("x"), "Seed publication")
        .with_title(doi("y"), "Graph Theory Basics")
        .with_title(doi("z"), "Graph Theory Advanced");
    let expander = Expander::new(&graph, provider);

    let results = expander.find_most_relevant(&doi("x"), 10).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].citations, 3);
    assert_eq!(results[0].id, doi("y"));
    assert_eq!(
        results[0].title,
        TitleResolution::Resolved("Graph Theory Basics".to_string())
    );
}

#[tokio::test]
async fn test_full_title_merge_keeps_distinct_titles_apart() {
    let graph = RefGraph::from_rows(&co_citation_rows()).unwrap();
    let provider = FakeProvider::default()
        .with_title(doi("y"), "Graph Theory Basics")
        .with_title(doi("z"), "Graph Theory Advanced");
    let expander = Expander::new(&graph, provider).with_merge_key(MergeKey::FullTitle);

    let results = expander.find_most_relevant(&doi("x"), 10).await.unwrap();
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_unresolved_titles_never_merge() {
    // No titles configured at all: every candidate is unresolved and must
    // keep its own identity rather than collapsing on the "N/A" sentinel.
    let graph = RefGraph::from_rows(&co_citation_rows()).unwrap();
    let expander = Expander::new(&graph, FakeProvider::default());

    let results = expander.find_most_relevant(&doi("x"), 10).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.title == TitleResolution::Unresolved));
}

// ============================================================================
// Output shape
// ============================================================================

#[tokio::test]
async fn test_output_capped_at_thirteen() {
    let mut rows = vec![row("A", 1, "seed")];
    for i in 0..20 {
        rows.push(row("A", 1, &format!("p{i}")));
    }
    let graph = RefGraph::from_rows(&rows).unwrap();
    let expander = Expander::new(&graph, FakeProvider::default());

    let results = expander.find_most_relevant(&doi("seed"), 10).await.unwrap();
    assert_eq!(results.len(), 13);
}

#[tokio::test]
async fn test_worker_count_does_not_change_output() {
    let rows = vec![
        row("A", 1, "x"),
        row("B", 2, "w"),
        row("C", 3, "w"),
        row("C", 3, "v"),
    ];
    let build = || {
        FakeProvider::default()
            .with_categories("/wiki/A", &["Logic", "Graphs"])
            .with_children("Logic", &["B"])
            .with_children("Graphs", &["C"])
    };

    let graph = RefGraph::from_rows(&rows).unwrap();
    let serial = Expander::new(&graph, build()).with_workers(1);
    let parallel = Expander::new(&graph, build()).with_workers(8);

    let a = serial.find_most_relevant(&doi("x"), 10).await.unwrap();
    let b = parallel.find_most_relevant(&doi("x"), 10).await.unwrap();

    let ids_a: Vec<String> = a.iter().map(|r| r.id.to_string()).collect();
    let ids_b: Vec<String> = b.iter().map(|r| r.id.to_string()).collect();
    assert_eq!(ids_a, ids_b);
}
