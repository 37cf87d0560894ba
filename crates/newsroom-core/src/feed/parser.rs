use feed_rs::parser;

use super::models::RawArticle;
use crate::{Error, Result};

/// Parsed feed data from RSS/Atom content
#[derive(Debug)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub articles: Vec<RawArticle>,
}

/// Parse RSS/Atom feed content into raw articles, keeping entry order
pub fn parse_feed(content: &[u8]) -> Result<ParsedFeed> {
    let feed = parser::parse(content)
        .map_err(|e| Error::FeedParse(e.to_string()))?;

    let title = feed.title.map(|t| t.content);

    let articles = feed.entries.into_iter().map(|entry| {
        let title = entry.title
            .map(|t| t.content)
            .filter(|t| !t.trim().is_empty());

        let description = entry.summary
            .map(|s| s.content)
            .filter(|d| !d.trim().is_empty());

        let link = entry.links.first().map(|l| l.href.clone());

        RawArticle::from_parts(title, description, link)
    }).collect();

    Ok(ParsedFeed { title, articles })
}
