use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use super::models::RawArticle;
use super::parser::parse_feed;
use crate::config::CategoryFeeds;
use crate::{Error, Result};

/// Something that can hand back the raw bytes behind a feed URL
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;

    /// Hard upper bound for one fetch, retries included
    fn timeout(&self) -> Duration {
        Duration::from_secs(30)
    }
}

/// A source that could not be used during aggregation
#[derive(Debug, Clone)]
pub struct SourceFailure {
    pub url: String,
    pub reason: String,
}

/// Articles gathered for one category plus the sources that failed
#[derive(Debug, Default)]
pub struct AggregationReport {
    pub articles: Vec<RawArticle>,
    pub failures: Vec<SourceFailure>,
    pub sources_ok: usize,
}

/// Pulls every configured feed of a category and concatenates the entries
pub struct FeedAggregator {
    source: Arc<dyn FeedSource>,
    categories: CategoryFeeds,
}

impl FeedAggregator {
    pub fn new(source: Arc<dyn FeedSource>, categories: CategoryFeeds) -> Self {
        Self { source, categories }
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Fetch all sources of `category` concurrently.
    ///
    /// Entries keep their feed order, and feeds keep their configured order.
    /// A failing source is logged and skipped; an unknown category yields an
    /// empty report.
    pub async fn aggregate(&self, category: &str) -> AggregationReport {
        let Some(urls) = self.categories.get(category) else {
            tracing::warn!("No sources configured for category '{}'", category);
            return AggregationReport::default();
        };

        let mut join_set: JoinSet<(usize, Result<Vec<RawArticle>>)> = JoinSet::new();
        for (index, url) in urls.iter().enumerate() {
            let source = Arc::clone(&self.source);
            let url = url.clone();
            join_set.spawn(async move { (index, fetch_one(source.as_ref(), &url).await) });
        }

        let mut results: Vec<Option<Result<Vec<RawArticle>>>> = (0..urls.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => tracing::error!("Feed task panicked or was cancelled: {}", e),
            }
        }

        let mut report = AggregationReport::default();
        for (url, result) in urls.iter().zip(results) {
            let result = result.unwrap_or_else(|| Err(Error::Other("fetch task aborted".to_string())));
            match result {
                Ok(mut articles) => {
                    tracing::debug!("Feed '{}': {} entries", url, articles.len());
                    report.sources_ok += 1;
                    report.articles.append(&mut articles);
                }
                Err(e) => {
                    tracing::warn!("Skipping feed '{}' in '{}': {}", url, category, e);
                    report.failures.push(SourceFailure {
                        url: url.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Category '{}': {} articles from {}/{} sources",
            category,
            report.articles.len(),
            report.sources_ok,
            urls.len()
        );

        report
    }
}

async fn fetch_one(source: &dyn FeedSource, url: &str) -> Result<Vec<RawArticle>> {
    let limit = source.timeout();
    let content = tokio::time::timeout(limit, source.fetch(url))
        .await
        .map_err(|_| Error::Timeout {
            what: format!("fetching {}", url),
            secs: limit.as_secs(),
        })??;

    Ok(parse_feed(&content)?.articles)
}
