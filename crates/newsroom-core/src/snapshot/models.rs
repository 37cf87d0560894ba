use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::feed::CuratedArticle;

/// Curated output for every category from one refresh cycle.
///
/// Serializes as a plain `{ "<category>": [ {title, description, link} ] }`
/// object. Categories keep the order they were first inserted in, which is
/// the configured order for snapshots built by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurationSnapshot {
    categories: IndexMap<String, Vec<CuratedArticle>>,
}

impl CurationSnapshot {
    /// A snapshot where each named category exists but holds no articles
    pub fn empty<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: names.into_iter().map(|n| (n.into(), Vec::new())).collect(),
        }
    }

    /// Set a category's articles. A category already present keeps its position.
    pub fn insert(&mut self, category: impl Into<String>, articles: Vec<CuratedArticle>) {
        self.categories.insert(category.into(), articles);
    }

    pub fn get(&self, category: &str) -> Option<&[CuratedArticle]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &[CuratedArticle])> {
        self.categories.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn category_names(&self) -> Vec<String> {
        self.categories.keys().cloned().collect()
    }

    pub fn article_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// Case-insensitive substring search over titles and descriptions.
    ///
    /// The query is used as given, surrounding whitespace included.
    /// Descriptions are escaped HTML and are matched with entities decoded.
    /// Results follow snapshot order: category order, then rank. An empty
    /// query matches nothing.
    pub fn search(&self, query: &str) -> Vec<CuratedArticle> {
        if query.is_empty() {
            return Vec::new();
        }
        let needle = query.to_lowercase();

        self.categories
            .values()
            .flatten()
            .filter(|article| article.matches_lowercase(&needle))
            .cloned()
            .collect()
    }
}
