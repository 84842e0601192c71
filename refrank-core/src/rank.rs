use crate::graph::RefGraph;
use crate::model::RankedPublication;
use std::cmp::Ordering;

impl RefGraph {
    /// Rank every publication by bipartite degree centrality: the number of
    /// distinct citing pages divided by the total number of web pages, so
    /// values fall in [0,1] and a publication cited by every page scores 1.0.
    ///
    /// Operates on the full graph only; the sort is stable, so ties keep
    /// publication insertion order for reproducible output.
    pub fn rank_publications(&self) -> Vec<RankedPublication> {
        let page_total = self.page_count();
        let mut ranked: Vec<RankedPublication> = self
            .publications()
            .map(|(ix, id)| {
                let citations = self.citing_pages(ix).len();
                let centrality = if page_total == 0 {
                    0.0
                } else {
                    citations as f64 / page_total as f64
                };
                RankedPublication {
                    id: id.clone(),
                    citations,
                    centrality,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.centrality
                .partial_cmp(&a.centrality)
                .unwrap_or(Ordering::Equal)
        });
        ranked
    }
}
