use std::sync::Arc;

use crate::feed::{CuratedArticle, RawArticle, ScoredArticle};
use crate::Result;

pub const DEFAULT_MAX_ARTICLES: usize = 8;

/// Turns one article into its summarized, servable form
#[async_trait::async_trait]
pub trait ArticleSummarizer: Send + Sync {
    async fn summarize(&self, article: &RawArticle) -> Result<CuratedArticle>;
}

/// Summarizes the top of a ranked, deduplicated list
pub struct SummarizationOrchestrator {
    summarizer: Arc<dyn ArticleSummarizer>,
    max_articles: usize,
}

impl SummarizationOrchestrator {
    pub fn new(summarizer: Arc<dyn ArticleSummarizer>, max_articles: usize) -> Self {
        Self {
            summarizer,
            max_articles,
        }
    }

    pub fn max_articles(&self) -> usize {
        self.max_articles
    }

    /// Summarize at most `max_articles` entries, one at a time in rank order.
    ///
    /// The first failure aborts the whole list; no partial result is returned.
    pub async fn curate(&self, ranked: &[ScoredArticle]) -> Result<Vec<CuratedArticle>> {
        let mut curated = Vec::with_capacity(ranked.len().min(self.max_articles));

        for scored in ranked.iter().take(self.max_articles) {
            let article = self.summarizer.summarize(&scored.article).await?;
            curated.push(article);
        }

        Ok(curated)
    }
}
