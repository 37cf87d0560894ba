//! Near-duplicate removal over one batch of articles.
//!
//! Descriptions are turned into TF-IDF vectors whose vocabulary and document
//! frequencies come from the batch itself, so the same pair of texts can score
//! differently in a different batch. The full pairwise cosine matrix is built
//! once and every keep/drop decision reads from that matrix.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::feed::ScoredArticle;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

// Two or more word characters, like the common TF-IDF default
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid regex"));

fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Sparse L2-normalized vector: (term index, weight), sorted by index
type SparseVector = Vec<(usize, f64)>;

fn tfidf_vectors(texts: &[&str]) -> Vec<SparseVector> {
    let documents: Vec<Vec<String>> = texts.iter().map(|t| tokenize(t)).collect();

    let mut vocabulary: HashMap<&str, usize> = HashMap::new();
    let mut document_frequency: Vec<usize> = Vec::new();
    let mut term_counts: Vec<HashMap<usize, usize>> = Vec::with_capacity(documents.len());

    for tokens in &documents {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for token in tokens {
            let next = vocabulary.len();
            let index = *vocabulary.entry(token.as_str()).or_insert(next);
            if index == document_frequency.len() {
                document_frequency.push(0);
            }
            *counts.entry(index).or_insert(0) += 1;
        }
        for index in counts.keys() {
            document_frequency[*index] += 1;
        }
        term_counts.push(counts);
    }

    // Smoothed idf: ln((1 + n) / (1 + df)) + 1
    let n = documents.len() as f64;
    let idf: Vec<f64> = document_frequency
        .iter()
        .map(|df| ((1.0 + n) / (1.0 + *df as f64)).ln() + 1.0)
        .collect();

    term_counts
        .into_iter()
        .map(|counts| {
            let mut vector: SparseVector = counts
                .into_iter()
                .map(|(index, count)| (index, count as f64 * idf[index]))
                .collect();
            vector.sort_unstable_by_key(|(index, _)| *index);

            let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                for (_, w) in vector.iter_mut() {
                    *w /= norm;
                }
            }
            vector
        })
        .collect()
}

/// Dot product of two sorted, normalized sparse vectors
fn cosine(a: &SparseVector, b: &SparseVector) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot.clamp(0.0, 1.0)
}

/// Symmetric pairwise cosine similarity over one batch of texts
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    values: Vec<Vec<f64>>,
}

impl SimilarityMatrix {
    pub fn from_texts(texts: &[&str]) -> Self {
        let vectors = tfidf_vectors(texts);
        let n = vectors.len();
        let mut values = vec![vec![0.0; n]; n];

        for i in 0..n {
            // Self-similarity is never consulted by the filter
            values[i][i] = if vectors[i].is_empty() { 0.0 } else { 1.0 };
            for j in (i + 1)..n {
                let sim = cosine(&vectors[i], &vectors[j]);
                values[i][j] = sim;
                values[j][i] = sim;
            }
        }

        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    /// True when row `i` is below `threshold` against every other column
    pub fn is_distinct(&self, i: usize, threshold: f64) -> bool {
        self.values[i]
            .iter()
            .enumerate()
            .all(|(j, sim)| j == i || *sim < threshold)
    }
}

/// Drops every article that is too similar to any other article in the batch
#[derive(Debug, Clone)]
pub struct NearDuplicateFilter {
    threshold: f64,
}

impl Default for NearDuplicateFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl NearDuplicateFilter {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Keep article `i` iff `sim(i, j) < threshold` for all `j != i`.
    ///
    /// Both members of a duplicate pair are dropped. Dropping one article
    /// never rescues another: decisions come from the full matrix.
    pub fn filter(&self, articles: Vec<ScoredArticle>) -> Vec<ScoredArticle> {
        if articles.len() < 2 {
            return articles;
        }

        let texts: Vec<&str> = articles.iter().map(|a| a.article.description.as_str()).collect();
        let matrix = SimilarityMatrix::from_texts(&texts);
        let keep: Vec<bool> = (0..matrix.len())
            .map(|i| matrix.is_distinct(i, self.threshold))
            .collect();

        let before = articles.len();
        let kept: Vec<ScoredArticle> = articles
            .into_iter()
            .zip(keep)
            .filter_map(|(article, keep)| keep.then_some(article))
            .collect();

        tracing::debug!("Near-duplicate filter kept {}/{} articles", kept.len(), before);
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::RawArticle;

    fn scored(title: &str, description: &str) -> ScoredArticle {
        ScoredArticle {
            article: RawArticle {
                title: title.to_string(),
                description: description.to_string(),
                link: format!("https://news.test/{}", title),
            },
            score: 0,
        }
    }

    fn titles(articles: &[ScoredArticle]) -> Vec<&str> {
        articles.iter().map(|a| a.article.title.as_str()).collect()
    }

    #[test]
    fn test_identical_texts_have_similarity_one() {
        let matrix = SimilarityMatrix::from_texts(&["the cat sat", "the cat sat", "dogs bark loudly"]);
        assert!((matrix.get(0, 1) - 1.0).abs() < 1e-9);
        assert_eq!(matrix.get(0, 2), 0.0);
        assert_eq!(matrix.get(1, 0), matrix.get(0, 1));
    }

    #[test]
    fn test_single_character_tokens_ignored() {
        // "a" and "I" are not tokens, so these share nothing
        let matrix = SimilarityMatrix::from_texts(&["a I a", "a I"]);
        assert_eq!(matrix.get(0, 1), 0.0);
    }

    #[test]
    fn test_empty_and_single_batches() {
        let filter = NearDuplicateFilter::default();
        assert!(filter.filter(Vec::new()).is_empty());

        let kept = filter.filter(vec![scored("only", "a lonely article")]);
        assert_eq!(titles(&kept), vec!["only"]);
    }

    #[test]
    fn test_two_identical_are_both_removed() {
        let filter = NearDuplicateFilter::default();
        let kept = filter.filter(vec![
            scored("first", "Central bank raises interest rates again"),
            scored("second", "Central bank raises interest rates again"),
        ]);
        assert!(kept.is_empty());
    }

    #[test]
    fn test_distinct_batch_is_identity() {
        let filter = NearDuplicateFilter::default();
        let input = vec![
            scored("a", "Central bank raises interest rates"),
            scored("b", "Local team wins championship final"),
            scored("c", "New smartphone released with faster chip"),
            scored("d", "Heatwave expected across southern regions"),
        ];
        let kept = filter.filter(input.clone());
        assert_eq!(kept, input);
    }

    #[test]
    fn test_not_greedy() {
        // b is close to both a and c, while a and c are far apart.
        // A greedy pass that keeps a and suppresses b would then keep c;
        // against the static matrix every one of them clashes with someone.
        let texts = [
            "apple banana cherry date",
            "apple banana cherry date elder fig grape honeydew",
            "elder fig grape honeydew",
        ];
        let matrix = SimilarityMatrix::from_texts(&texts);
        let threshold = 0.6;
        assert!(matrix.get(0, 1) >= threshold);
        assert!(matrix.get(1, 2) >= threshold);
        assert!(matrix.get(0, 2) < threshold);

        let filter = NearDuplicateFilter::new(threshold);
        let kept = filter.filter(texts.iter().enumerate().map(|(i, t)| scored(&i.to_string(), t)).collect());
        assert!(kept.is_empty());
    }

    #[test]
    fn test_output_is_ordered_subsequence() {
        let filter = NearDuplicateFilter::default();
        let input = vec![
            scored("storm-1", "Powerful storm hits the coast, thousands without power"),
            scored("markets", "Stocks slide as investors weigh inflation data"),
            scored("storm-2", "Powerful storm hits the coast, thousands without power tonight"),
            scored("science", "Astronomers spot a distant comet near Jupiter"),
            scored("sports", "Underdog club stuns league leaders in late comeback"),
        ];

        let kept = filter.filter(input.clone());
        assert_eq!(titles(&kept), vec!["markets", "science", "sports"]);

        // every kept item appears in input order
        let mut cursor = input.iter();
        for item in &kept {
            assert!(cursor.any(|candidate| candidate == item));
        }
    }

    #[test]
    fn test_empty_descriptions_never_clash() {
        let filter = NearDuplicateFilter::default();
        let kept = filter.filter(vec![scored("x", ""), scored("y", ""), scored("z", "!!")]);
        assert_eq!(titles(&kept), vec!["x", "y", "z"]);
    }
}
