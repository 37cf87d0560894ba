use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;

use super::dedup::NearDuplicateFilter;
use super::orchestrator::{ArticleSummarizer, SummarizationOrchestrator};
use super::scorer::RelevanceScorer;
use crate::ai::Summarizer;
use crate::config::AppConfig;
use crate::feed::{CuratedArticle, FeedAggregator, FeedFetcher, FeedSource, SourceFailure};
use crate::snapshot::CurationSnapshot;
use crate::{Error, Result};

/// What happened to one category during a cycle
#[derive(Debug, Clone)]
pub struct CategoryReport {
    pub category: String,
    pub fetched: usize,
    pub distinct: usize,
    pub curated: usize,
    pub failed_sources: Vec<SourceFailure>,
}

/// Summary of a completed refresh cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub categories: Vec<CategoryReport>,
}

impl CycleReport {
    pub fn curated_total(&self) -> usize {
        self.categories.iter().map(|c| c.curated).sum()
    }

    pub fn failed_sources_total(&self) -> usize {
        self.categories.iter().map(|c| c.failed_sources.len()).sum()
    }
}

/// aggregate → score → dedupe → top-K → summarize, per category
pub struct CurationPipeline {
    aggregator: FeedAggregator,
    scorer: RelevanceScorer,
    filter: NearDuplicateFilter,
    orchestrator: SummarizationOrchestrator,
    category_concurrency: usize,
}

impl CurationPipeline {
    pub fn new(
        aggregator: FeedAggregator,
        scorer: RelevanceScorer,
        filter: NearDuplicateFilter,
        orchestrator: SummarizationOrchestrator,
    ) -> Self {
        Self {
            aggregator,
            scorer,
            filter,
            orchestrator,
            category_concurrency: 1,
        }
    }

    /// Process up to `limit` categories at once during a cycle
    pub fn with_category_concurrency(mut self, limit: usize) -> Self {
        self.category_concurrency = limit.max(1);
        self
    }

    /// Wire the pipeline from configuration with the HTTP fetcher and the
    /// configured AI provider
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let fetcher: Arc<dyn FeedSource> = Arc::new(FeedFetcher::new(config)?);
        let summarizer: Arc<dyn ArticleSummarizer> = Arc::new(Summarizer::new(config)?);
        Ok(Self::with_components(config, fetcher, summarizer))
    }

    /// Wire the pipeline from configuration around the given collaborators
    pub fn with_components(
        config: &AppConfig,
        source: Arc<dyn FeedSource>,
        summarizer: Arc<dyn ArticleSummarizer>,
    ) -> Self {
        Self::new(
            FeedAggregator::new(source, config.categories.clone()),
            RelevanceScorer::default(),
            NearDuplicateFilter::new(config.curation.similarity_threshold),
            SummarizationOrchestrator::new(summarizer, config.curation.max_articles_per_category),
        )
        .with_category_concurrency(config.sync.category_concurrency)
    }

    pub fn category_names(&self) -> Vec<String> {
        self.aggregator.categories().map(str::to_string).collect()
    }

    /// Run every stage for one category
    pub async fn curate_category(&self, category: &str) -> Result<(Vec<CuratedArticle>, CategoryReport)> {
        let aggregated = self.aggregator.aggregate(category).await;
        let fetched = aggregated.articles.len();

        let ranked = self.scorer.rank(aggregated.articles);
        let distinct = self.filter.filter(ranked);
        let curated = self.orchestrator.curate(&distinct).await?;

        tracing::info!(
            "Category '{}': fetched {}, distinct {}, curated {}",
            category,
            fetched,
            distinct.len(),
            curated.len()
        );

        let report = CategoryReport {
            category: category.to_string(),
            fetched,
            distinct: distinct.len(),
            curated: curated.len(),
            failed_sources: aggregated.failures,
        };

        Ok((curated, report))
    }

    /// Build a complete snapshot for every configured category.
    ///
    /// Categories run concurrently. Any category error aborts the cycle and
    /// nothing is returned, so a caller never publishes a partial snapshot.
    pub async fn run_cycle(self: &Arc<Self>) -> Result<(CurationSnapshot, CycleReport)> {
        let started_at = Utc::now();
        let names = self.category_names();
        tracing::info!("Refresh cycle started for {} categories", names.len());

        // seeded in configured order; completion order does not matter
        let mut snapshot = CurationSnapshot::empty(names.iter().cloned());
        let mut reports = Vec::with_capacity(names.len());
        let mut join_set: JoinSet<(String, Result<(Vec<CuratedArticle>, CategoryReport)>)> = JoinSet::new();
        let mut pending = names.clone().into_iter();

        fn spawn_category(
            join_set: &mut JoinSet<(String, Result<(Vec<CuratedArticle>, CategoryReport)>)>,
            pipeline: Arc<CurationPipeline>,
            category: String,
        ) {
            join_set.spawn(async move {
                let result = pipeline.curate_category(&category).await;
                (category, result)
            });
        }

        for _ in 0..self.category_concurrency {
            if let Some(category) = pending.next() {
                spawn_category(&mut join_set, Arc::clone(self), category);
            }
        }

        while let Some(joined) = join_set.join_next().await {
            let (category, result) = joined
                .map_err(|e| Error::Other(format!("Category task join error: {}", e)))?;

            match result {
                Ok((articles, report)) => {
                    snapshot.insert(category, articles);
                    reports.push(report);
                }
                Err(e) => {
                    join_set.abort_all();
                    tracing::error!("Refresh cycle aborted in category '{}': {}", category, e);
                    return Err(e);
                }
            }

            if let Some(category) = pending.next() {
                spawn_category(&mut join_set, Arc::clone(self), category);
            }
        }

        reports.sort_by_key(|r| names.iter().position(|n| *n == r.category));
        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            categories: reports,
        };

        tracing::info!(
            "Refresh cycle finished: {} curated articles, {} failed sources",
            report.curated_total(),
            report.failed_sources_total()
        );

        Ok((snapshot, report))
    }
}
