use crate::error::{Result, ScrapeError};
use async_trait::async_trait;
use refrank_core::model::PubId;
use refrank_core::provider::{CategoryTag, MetadataProvider, ResolvedPublication, TitleResolution};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Non-hidden category links on an article page.
const CATEGORY_LINKS_SELECTOR: &str = "#mw-normal-catlinks ul li a";
/// Article entries in the rendered Special:CategoryTree output.
const CATEGORY_TREE_PAGE_SELECTOR: &str = "a.CategoryTreeLabelPage";

/// Where one publication id scheme resolves: URL base plus the CSS selector
/// carrying the title on the landing page.
#[derive(Debug, Clone)]
struct Resolver {
    base: String,
    selector: String,
    take_last: bool,
}

/// Wikipedia-backed [`MetadataProvider`].
///
/// Every lookup is fallible over the network; failures are logged and
/// absorbed into empty results or unresolved titles, so callers never see a
/// transport error.
pub struct WikiClient {
    client: Client,
    wiki_base: String,
    resolvers: HashMap<String, Resolver>,
}

impl WikiClient {
    pub fn new() -> Self {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        let client = Client::builder()
            .user_agent("refrank/0.1 (reference graph recommender)")
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs((timeout_secs / 2).max(1)))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            wiki_base: "https://en.wikipedia.org".to_string(),
            resolvers: Self::default_resolvers(),
        }
    }

    fn default_resolvers() -> HashMap<String, Resolver> {
        let mut resolvers = HashMap::new();
        resolvers.insert(
            "doi".to_string(),
            Resolver {
                base: "https://doi.org/".to_string(),
                selector: "header h1".to_string(),
                take_last: false,
            },
        );
        resolvers.insert(
            "arxiv".to_string(),
            Resolver {
                base: "https://arxiv.org/abs/".to_string(),
                selector: "h1".to_string(),
                // arXiv abstract pages render the paper title as the last h1.
                take_last: true,
            },
        );
        resolvers.insert(
            "isbn".to_string(),
            Resolver {
                base: "https://books.google.com/books?isbn=".to_string(),
                selector: "h1".to_string(),
                take_last: false,
            },
        );
        resolvers.insert(
            "pmid".to_string(),
            Resolver {
                base: "https://www.ncbi.nlm.nih.gov/pubmed/".to_string(),
                selector: ".rprt_all h1".to_string(),
                take_last: false,
            },
        );
        resolvers
    }

    pub fn with_wiki_base(mut self, base: impl Into<String>) -> Self {
        self.wiki_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Add or replace the resolver for one id scheme.
    pub fn with_resolver(
        mut self,
        id_type: impl Into<String>,
        base: impl Into<String>,
        selector: impl Into<String>,
    ) -> Self {
        self.resolvers.insert(
            id_type.into(),
            Resolver {
                base: base.into(),
                selector: selector.into(),
                take_last: false,
            },
        );
        self
    }

    fn source_link(&self, id: &PubId) -> Option<String> {
        self.resolvers
            .get(&id.id_type)
            .map(|r| format!("{}{}", r.base, id.value))
    }

    async fn try_resolve(&self, id: &PubId) -> Result<(String, String)> {
        let resolver = self
            .resolvers
            .get(&id.id_type)
            .ok_or_else(|| ScrapeError::UnknownIdType(id.id_type.clone()))?;
        let link = format!("{}{}", resolver.base, id.value);
        debug!(%link, "resolving publication title");

        let body = self.client.get(&link).send().await?.text().await?;
        let title = extract_title(&body, &resolver.selector, resolver.take_last)?;
        Ok((link, title))
    }

    async fn try_fetch_categories(&self, address: &str) -> Result<Vec<CategoryTag>> {
        let url = format!("{}{}", self.wiki_base, address);
        let body = self.client.get(&url).send().await?.text().await?;
        Ok(extract_category_links(&body))
    }

    async fn try_fetch_children(&self, category_name: &str) -> Result<Vec<String>> {
        let mut url = url::Url::parse(&format!("{}/wiki/Special:CategoryTree", self.wiki_base))?;
        url.query_pairs_mut()
            .append_pair("target", category_name)
            .append_pair("mode", "all")
            .append_pair("namespaces", "0")
            .append_pair("title", "Special:CategoryTree");

        let body = self.client.get(url).send().await?.text().await?;
        Ok(extract_category_children(&body))
    }
}

impl Default for WikiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataProvider for WikiClient {
    async fn resolve_publication(&self, id: &PubId) -> ResolvedPublication {
        match self.try_resolve(id).await {
            Ok((link, title)) => ResolvedPublication {
                source_link: link,
                title: TitleResolution::Resolved(title),
            },
            Err(err) => {
                warn!(id = %id, %err, "publication title lookup failed");
                ResolvedPublication {
                    source_link: self.source_link(id).unwrap_or_default(),
                    title: TitleResolution::Unresolved,
                }
            }
        }
    }

    async fn fetch_categories(&self, page_address: &str) -> Vec<CategoryTag> {
        match self.try_fetch_categories(page_address).await {
            Ok(tags) => tags,
            Err(err) => {
                warn!(page_address, %err, "category lookup failed");
                Vec::new()
            }
        }
    }

    async fn fetch_category_children(&self, category_name: &str) -> Vec<String> {
        match self.try_fetch_children(category_name).await {
            Ok(children) => children,
            Err(err) => {
                warn!(category_name, %err, "category children lookup failed");
                Vec::new()
            }
        }
    }
}

// Parsing stays in sync helpers so no non-Send DOM handle lives across an
// await point.

fn extract_title(html: &str, selector: &str, take_last: bool) -> Result<String> {
    let document = Html::parse_document(html);
    let sel =
        Selector::parse(selector).map_err(|_| ScrapeError::NoMatch(selector.to_string()))?;

    let element = if take_last {
        document.select(&sel).last()
    } else {
        document.select(&sel).next()
    };
    let element = element.ok_or_else(|| ScrapeError::NoMatch(selector.to_string()))?;

    let text: String = element.text().collect();
    let title = text.replace("Title:", "").trim().to_string();
    if title.is_empty() {
        return Err(ScrapeError::NoMatch(selector.to_string()));
    }
    Ok(title)
}

fn extract_category_links(html: &str) -> Vec<CategoryTag> {
    let document = Html::parse_document(html);
    let sel = Selector::parse(CATEGORY_LINKS_SELECTOR).unwrap();

    document
        .select(&sel)
        .map(|element| CategoryTag {
            title: element.text().collect::<String>().trim().to_string(),
            href: element.value().attr("href").unwrap_or_default().to_string(),
        })
        .filter(|tag| !tag.title.is_empty())
        .collect()
}

fn extract_category_children(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let sel = Selector::parse(CATEGORY_TREE_PAGE_SELECTOR).unwrap();

    document
        .select(&sel)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
        .collect()
}
