pub mod aggregator;
mod fetcher;
mod models;
mod parser;

pub use aggregator::{AggregationReport, FeedAggregator, FeedSource, SourceFailure};
pub use fetcher::FeedFetcher;
pub use models::{CuratedArticle, RawArticle, ScoredArticle, MISSING_TITLE};
pub use parser::{parse_feed, ParsedFeed};
