use crate::error::{GraphError, Result};
use crate::graph::RefGraph;
use crate::model::{CategoryNode, Node, PubId, PublicationNode, Recommendation, WebPageNode};
use crate::provider::{CategoryTag, MetadataProvider, ResolvedPublication, TitleResolution};
use futures::stream::{self, StreamExt};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, info};

/// Key used to merge resolved candidates before the final ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeKey {
    /// First `n` characters of the resolved title. `TitlePrefix(10)` is the
    /// historical behavior; distinct titles sharing a prefix merge and their
    /// citation counts sum.
    TitlePrefix(usize),
    /// The full resolved title.
    FullTitle,
    /// The publication id pair; never merges distinct publications.
    Identifier,
}

#[derive(Debug, Clone)]
pub struct ExpanderConfig {
    /// Bound on concurrent metadata lookups.
    pub workers: usize,
    /// How resolved candidates are deduplicated.
    pub merge_key: MergeKey,
    /// Hard cap on emitted recommendations.
    pub max_results: usize,
    /// The level-2 candidate pool holds `candidate_multiplier * n` entries.
    pub candidate_multiplier: usize,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            merge_key: MergeKey::TitlePrefix(10),
            max_results: 13,
            candidate_multiplier: 3,
        }
    }
}

/// Two-level relevance expansion around a seed publication.
///
/// Reads the full graph, builds a private expansion subgraph per query and
/// consults the metadata provider for categories, category children and
/// publication titles. Concurrent queries may share one expander since the
/// full graph is never mutated.
pub struct Expander<'g, P> {
    graph: &'g RefGraph,
    provider: P,
    config: ExpanderConfig,
}

impl<'g, P: MetadataProvider> Expander<'g, P> {
    pub fn new(graph: &'g RefGraph, provider: P) -> Self {
        Self {
            graph,
            provider,
            config: ExpanderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExpanderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.workers = workers.max(1);
        self
    }

    pub fn with_merge_key(mut self, merge_key: MergeKey) -> Self {
        self.config.merge_key = merge_key;
        self
    }

    /// Publications co-cited with the seed by its own citing pages, ranked
    /// by co-citation count. This is the level-1 candidate list; it seeds
    /// the level-2 expansion and never contains the seed itself.
    pub fn level1_candidates(&self, seed: &PubId) -> Result<Vec<(PubId, usize)>> {
        let pages = self.seed_pages(seed)?;
        let (counts, _) = self.level1(&pages, seed);
        Ok(counts.ranked())
    }

    /// Find publications most relevant to `seed`, at most
    /// `min(max_results, candidates)` of them. `n` sizes the level-2
    /// candidate pool.
    pub async fn find_most_relevant(&self, seed: &PubId, n: usize) -> Result<Vec<Recommendation>> {
        let pages = self.seed_pages(seed)?;
        debug!(seed = %seed, citing_pages = pages.len(), "seed located");

        let (_, level1_pubs) = self.level1(&pages, seed);

        let mut sub = self.induce_subgraph(&pages, &level1_pubs);
        self.expand_categories(&mut sub).await;
        self.expand_category_children(&mut sub).await;

        let level2 = self.aggregate_level2(&sub);
        debug!(
            categories = sub.category_order.len(),
            topic_pages = sub.page_order.len(),
            candidates = level2.len(),
            "expansion subgraph complete"
        );

        let pool = (self.config.candidate_multiplier * n).min(level2.len());
        let candidates: Vec<(PubId, usize)> = level2.ranked().into_iter().take(pool).collect();

        let merged = self.resolve_and_merge(candidates, seed).await;

        let results: Vec<Recommendation> = merged
            .into_iter()
            .take(self.config.max_results)
            .enumerate()
            .map(|(i, entry)| Recommendation {
                rank: i + 1,
                citations: entry.citations,
                id: entry.id,
                source_link: entry.source_link,
                title: entry.title,
            })
            .collect();

        info!(seed = %seed, results = results.len(), "relevance expansion finished");
        Ok(results)
    }

    /// Pages citing the seed, or `SeedNotFound` when there are none.
    fn seed_pages(&self, seed: &PubId) -> Result<Vec<NodeIndex>> {
        let seed_ix = self
            .graph
            .publication_index(seed)
            .ok_or_else(|| GraphError::SeedNotFound(seed.clone()))?;
        let pages = self.graph.citing_pages(seed_ix);
        if pages.is_empty() {
            return Err(GraphError::SeedNotFound(seed.clone()));
        }
        Ok(pages)
    }

    /// Co-citation counts (seed excluded) and the full set of level-1
    /// publication nodes (seed included, first-encountered order).
    fn level1(&self, pages: &[NodeIndex], seed: &PubId) -> (CitationCounter, Vec<NodeIndex>) {
        let mut counts = CitationCounter::default();
        let mut seen: Vec<NodeIndex> = Vec::new();
        for &page in pages {
            for pub_ix in self.graph.cited_publications(page) {
                if !seen.contains(&pub_ix) {
                    seen.push(pub_ix);
                }
                let id = self
                    .graph
                    .publication_id(pub_ix)
                    .expect("successor of a page is a publication");
                if id != seed {
                    counts.add(id.clone());
                }
            }
        }
        (counts, seen)
    }

    /// Subgraph induced on the citing pages and the level-1 publications,
    /// with the page-to-publication edges between them.
    fn induce_subgraph(&self, pages: &[NodeIndex], level1_pubs: &[NodeIndex]) -> ExpansionGraph {
        let mut sub = ExpansionGraph::default();
        for &page_ix in pages {
            let page = self
                .graph
                .web_page(page_ix)
                .expect("predecessor of a publication is a page");
            sub.intern_page(page);
        }
        for &pub_ix in level1_pubs {
            let id = self
                .graph
                .publication_id(pub_ix)
                .expect("level-1 node is a publication");
            sub.intern_publication(id);
        }
        for &page_ix in pages {
            let page_title = &self
                .graph
                .web_page(page_ix)
                .expect("predecessor of a publication is a page")
                .title;
            let from = sub.titles[page_title];
            for pub_ix in self.graph.cited_publications(page_ix) {
                let id = self
                    .graph
                    .publication_id(pub_ix)
                    .expect("successor of a page is a publication");
                if let Some(&to) = sub.pubs.get(id) {
                    sub.link(from, to);
                }
            }
        }
        sub
    }

    /// Fetch category tags for every page in the subgraph and attach category
    /// nodes with category-to-page edges. Lookups run through a bounded pool;
    /// `buffered` yields results in page insertion order, so the subgraph
    /// comes out the same regardless of completion order.
    async fn expand_categories(&self, sub: &mut ExpansionGraph) {
        let targets: Vec<(NodeIndex, String)> = sub
            .page_order
            .iter()
            .map(|&ix| (ix, sub.page(ix).address.clone()))
            .collect();

        let provider = &self.provider;
        let fetched: Vec<(NodeIndex, Vec<CategoryTag>)> =
            stream::iter(targets.into_iter().map(|(ix, address)| async move {
                (ix, provider.fetch_categories(&address).await)
            }))
            .buffered(self.config.workers.max(1))
            .collect()
            .await;

        for (page_ix, tags) in fetched {
            for tag in tags {
                let cat_ix = sub.intern_category(&tag.title, &tag.href);
                sub.link(cat_ix, page_ix);
            }
        }
    }

    /// Fetch the child pages of every category in the subgraph; children that
    /// are topic pages of the full graph join the subgraph under their
    /// category.
    async fn expand_category_children(&self, sub: &mut ExpansionGraph) {
        let targets: Vec<(NodeIndex, String)> = sub
            .category_order
            .iter()
            .map(|&ix| (ix, sub.category_title(ix).to_string()))
            .collect();

        let provider = &self.provider;
        let fetched: Vec<(NodeIndex, Vec<String>)> =
            stream::iter(targets.into_iter().map(|(ix, name)| async move {
                (ix, provider.fetch_category_children(&name).await)
            }))
            .buffered(self.config.workers.max(1))
            .collect()
            .await;

        for (cat_ix, children) in fetched {
            for child in children {
                if let Some(full_ix) = self.graph.topic_index(&child) {
                    let page = self.graph.web_page(full_ix).expect("topic index is a page");
                    let child_ix = sub.intern_page(page);
                    sub.link(cat_ix, child_ix);
                }
            }
        }
    }

    /// Citation counts over the publications cited (in the full graph) by
    /// every topic page now present in the subgraph.
    fn aggregate_level2(&self, sub: &ExpansionGraph) -> CitationCounter {
        let mut counts = CitationCounter::default();
        for &page_ix in &sub.page_order {
            let title = &sub.page(page_ix).title;
            let full_ix = self
                .graph
                .topic_index(title)
                .expect("subgraph pages come from the full graph");
            for pub_ix in self.graph.cited_publications(full_ix) {
                let id = self
                    .graph
                    .publication_id(pub_ix)
                    .expect("successor of a page is a publication");
                counts.add(id.clone());
            }
        }
        counts
    }

    /// Resolve titles for the candidate pool and merge entries sharing a
    /// merge key, summing their citation counts. The seed is dropped wherever
    /// it appears. The first entry of a colliding group keeps its metadata.
    async fn resolve_and_merge(
        &self,
        candidates: Vec<(PubId, usize)>,
        seed: &PubId,
    ) -> Vec<MergedCandidate> {
        let provider = &self.provider;
        let resolved: Vec<(PubId, usize, ResolvedPublication)> =
            stream::iter(candidates.into_iter().map(|(id, citations)| async move {
                let info = provider.resolve_publication(&id).await;
                (id, citations, info)
            }))
            .buffered(self.config.workers.max(1))
            .collect()
            .await;

        let mut merged: Vec<MergedCandidate> = Vec::new();
        let mut by_key: HashMap<String, usize> = HashMap::new();
        for (id, citations, info) in resolved {
            if &id == seed {
                continue;
            }
            let key = self.merge_key_for(&id, &info.title);
            match by_key.entry(key) {
                Entry::Occupied(slot) => merged[*slot.get()].citations += citations,
                Entry::Vacant(slot) => {
                    slot.insert(merged.len());
                    merged.push(MergedCandidate {
                        id,
                        citations,
                        source_link: info.source_link,
                        title: info.title,
                    });
                }
            }
        }

        // Stable sort: colliding groups stay in first-encountered order.
        merged.sort_by(|a, b| b.citations.cmp(&a.citations));
        merged
    }

    fn merge_key_for(&self, id: &PubId, title: &TitleResolution) -> String {
        match (&self.config.merge_key, title) {
            // An unresolved title carries no information; falling back to
            // the id keeps unrelated unresolved candidates apart.
            (MergeKey::Identifier, _) | (_, TitleResolution::Unresolved) => id.to_string(),
            (MergeKey::FullTitle, TitleResolution::Resolved(t)) => t.clone(),
            (MergeKey::TitlePrefix(n), TitleResolution::Resolved(t)) => t.chars().take(*n).collect(),
        }
    }
}

struct MergedCandidate {
    id: PubId,
    citations: usize,
    source_link: String,
    title: TitleResolution,
}

/// Occurrence counter that remembers first-encountered order, so ranking
/// ties resolve the same way on every run.
#[derive(Default)]
struct CitationCounter {
    counts: HashMap<PubId, usize>,
    order: Vec<PubId>,
}

impl CitationCounter {
    fn add(&mut self, id: PubId) {
        match self.counts.entry(id) {
            Entry::Occupied(mut slot) => *slot.get_mut() += 1,
            Entry::Vacant(slot) => {
                self.order.push(slot.key().clone());
                slot.insert(1);
            }
        }
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    /// Entries sorted by count descending, ties by first-encountered order.
    fn ranked(&self) -> Vec<(PubId, usize)> {
        let mut out: Vec<(PubId, usize)> = self
            .order
            .iter()
            .map(|id| (id.clone(), self.counts[id]))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1));
        out
    }
}

/// Per-query working subgraph. Holds topic pages, the categories discovered
/// around them and the level-1 publications; dropped when the query ends.
#[derive(Default)]
struct ExpansionGraph {
    graph: DiGraph<Node, ()>,
    titles: HashMap<String, NodeIndex>,
    pubs: HashMap<PubId, NodeIndex>,
    page_order: Vec<NodeIndex>,
    category_order: Vec<NodeIndex>,
}

impl ExpansionGraph {
    fn intern_page(&mut self, page: &WebPageNode) -> NodeIndex {
        if let Some(&ix) = self.titles.get(&page.title) {
            return ix;
        }
        let ix = self.graph.add_node(Node::WebPage(page.clone()));
        self.titles.insert(page.title.clone(), ix);
        self.page_order.push(ix);
        ix
    }

    /// Category nodes share the title namespace with pages: a known title is
    /// reused as-is, whatever its kind.
    fn intern_category(&mut self, title: &str, address: &str) -> NodeIndex {
        if let Some(&ix) = self.titles.get(title) {
            return ix;
        }
        let ix = self.graph.add_node(Node::Category(CategoryNode {
            title: title.to_string(),
            address: address.to_string(),
        }));
        self.titles.insert(title.to_string(), ix);
        self.category_order.push(ix);
        ix
    }

    fn intern_publication(&mut self, id: &PubId) -> NodeIndex {
        if let Some(&ix) = self.pubs.get(id) {
            return ix;
        }
        let ix = self
            .graph
            .add_node(Node::Publication(PublicationNode { id: id.clone() }));
        self.pubs.insert(id.clone(), ix);
        ix
    }

    fn link(&mut self, from: NodeIndex, to: NodeIndex) {
        self.graph.update_edge(from, to, ());
    }

    fn page(&self, ix: NodeIndex) -> &WebPageNode {
        match &self.graph[ix] {
            Node::WebPage(page) => page,
            _ => unreachable!("page_order only holds web page nodes"),
        }
    }

    fn category_title(&self, ix: NodeIndex) -> &str {
        match &self.graph[ix] {
            Node::Category(cat) => &cat.title,
            _ => unreachable!("category_order only holds category nodes"),
        }
    }
}
