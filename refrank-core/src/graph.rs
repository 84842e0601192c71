use crate::error::Result;
use crate::model::{CitationRow, Node, PubId, PublicationNode, WebPageNode};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use tracing::info;

/// Directed bipartite reference graph: web pages cite publications.
///
/// Built once per dataset and read-only afterwards. Expansion queries work on
/// separate per-query subgraphs and never mutate this graph.
#[derive(Debug)]
pub struct RefGraph {
    graph: DiGraph<Node, ()>,
    titles: HashMap<String, NodeIndex>,
    pubs: HashMap<PubId, NodeIndex>,
    page_order: Vec<NodeIndex>,
    pub_order: Vec<NodeIndex>,
}

impl RefGraph {
    /// Build the graph from citation rows.
    ///
    /// Pages are deduplicated by title (the first row's page id wins),
    /// publications by their id pair, and repeated citations collapse into a
    /// single edge. Any malformed row aborts construction; silently skipping
    /// rows would skew the ranking.
    pub fn from_rows(rows: &[CitationRow]) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            row.validate(i + 1)?;
        }

        let mut g = Self {
            graph: DiGraph::new(),
            titles: HashMap::new(),
            pubs: HashMap::new(),
            page_order: Vec::new(),
            pub_order: Vec::new(),
        };

        for row in rows {
            let page = g.intern_page(row);
            let publication = g.intern_publication(row);
            g.graph.update_edge(page, publication, ());
        }

        info!(
            pages = g.page_order.len(),
            publications = g.pub_order.len(),
            citations = g.graph.edge_count(),
            "reference graph built"
        );
        Ok(g)
    }

    fn intern_page(&mut self, row: &CitationRow) -> NodeIndex {
        if let Some(&ix) = self.titles.get(&row.page_title) {
            return ix;
        }
        let ix = self.graph.add_node(Node::WebPage(WebPageNode {
            title: row.page_title.clone(),
            page_id: row.page_id,
            address: WebPageNode::derive_address(&row.page_title),
            depth: 0,
        }));
        self.titles.insert(row.page_title.clone(), ix);
        self.page_order.push(ix);
        ix
    }

    fn intern_publication(&mut self, row: &CitationRow) -> NodeIndex {
        let id = row.publication_id();
        if let Some(&ix) = self.pubs.get(&id) {
            return ix;
        }
        let ix = self
            .graph
            .add_node(Node::Publication(PublicationNode { id: id.clone() }));
        self.pubs.insert(id, ix);
        self.pub_order.push(ix);
        ix
    }

    pub fn page_count(&self) -> usize {
        self.page_order.len()
    }

    pub fn publication_count(&self) -> usize {
        self.pub_order.len()
    }

    pub fn citation_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node(&self, ix: NodeIndex) -> &Node {
        &self.graph[ix]
    }

    /// Web page nodes in insertion order.
    pub fn pages(&self) -> impl Iterator<Item = (NodeIndex, &WebPageNode)> {
        self.page_order.iter().map(|&ix| match &self.graph[ix] {
            Node::WebPage(page) => (ix, page),
            _ => unreachable!("page_order only holds web page nodes"),
        })
    }

    /// Publication nodes in insertion order.
    pub fn publications(&self) -> impl Iterator<Item = (NodeIndex, &PubId)> {
        self.pub_order.iter().map(|&ix| match &self.graph[ix] {
            Node::Publication(publication) => (ix, &publication.id),
            _ => unreachable!("pub_order only holds publication nodes"),
        })
    }

    /// O(1) membership check on page titles.
    pub fn contains_title(&self, title: &str) -> bool {
        self.titles.contains_key(title)
    }

    /// Index of the topic page with the given title, if present.
    pub fn topic_index(&self, title: &str) -> Option<NodeIndex> {
        self.titles.get(title).copied()
    }

    pub fn publication_index(&self, id: &PubId) -> Option<NodeIndex> {
        self.pubs.get(id).copied()
    }

    pub fn web_page(&self, ix: NodeIndex) -> Option<&WebPageNode> {
        match &self.graph[ix] {
            Node::WebPage(page) => Some(page),
            _ => None,
        }
    }

    pub fn publication_id(&self, ix: NodeIndex) -> Option<&PubId> {
        match &self.graph[ix] {
            Node::Publication(publication) => Some(&publication.id),
            _ => None,
        }
    }

    /// Pages citing a publication, in node insertion order.
    pub fn citing_pages(&self, publication: NodeIndex) -> Vec<NodeIndex> {
        let mut pages: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(publication, Direction::Incoming)
            .collect();
        pages.sort_unstable();
        pages
    }

    /// Publications cited by a page, in node insertion order.
    pub fn cited_publications(&self, page: NodeIndex) -> Vec<NodeIndex> {
        let mut cited: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(page, Direction::Outgoing)
            .collect();
        cited.sort_unstable();
        cited
    }
}
