use std::sync::LazyLock;

use regex::Regex;

use crate::feed::{RawArticle, ScoredArticle};

/// Urgency keywords and their weights
pub const URGENCY_KEYWORDS: &[(&str, u32)] = &[
    ("breaking", 1),
    ("urgent", 1),
    ("exclusive", 1),
    ("important", 1),
    ("update", 1),
    ("alert", 1),
    ("major", 1),
    ("critical", 1),
    ("significant", 1),
    ("essential", 1),
    ("notable", 1),
    ("top story", 1),
];

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid regex"));

/// Heuristic ranking: urgency keyword hits plus raw length in words.
///
/// Long articles rank higher than short ones with the same keywords.
pub struct RelevanceScorer {
    keywords: Vec<(Regex, u32)>,
}

impl Default for RelevanceScorer {
    fn default() -> Self {
        Self::new(URGENCY_KEYWORDS)
    }
}

impl RelevanceScorer {
    pub fn new(keywords: &[(&str, u32)]) -> Self {
        let keywords = keywords
            .iter()
            .filter_map(|(keyword, weight)| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(keyword));
                match Regex::new(&pattern) {
                    Ok(re) => Some((re, *weight)),
                    Err(e) => {
                        tracing::warn!("Ignoring keyword '{}': {}", keyword, e);
                        None
                    }
                }
            })
            .collect();

        Self { keywords }
    }

    pub fn score(&self, article: &RawArticle) -> u32 {
        let keyword_score = self.keyword_score(&article.title) + self.keyword_score(&article.description);
        let word_count = WORD_RE
            .find_iter(&format!("{} {}", article.title, article.description))
            .count() as u32;

        keyword_score + word_count
    }

    fn keyword_score(&self, text: &str) -> u32 {
        self.keywords
            .iter()
            .map(|(re, weight)| re.find_iter(text).count() as u32 * weight)
            .sum()
    }

    /// Order by descending score; ties keep their arrival order
    pub fn rank(&self, articles: Vec<RawArticle>) -> Vec<ScoredArticle> {
        let mut scored: Vec<ScoredArticle> = articles
            .into_iter()
            .map(|article| ScoredArticle {
                score: self.score(&article),
                article,
            })
            .collect();

        // slice::sort_by is stable
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored
    }
}
