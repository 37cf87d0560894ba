use serde::{Deserialize, Serialize};

/// Title used when a feed entry carries none
pub const MISSING_TITLE: &str = "No title";

/// One feed entry as pulled from a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawArticle {
    pub title: String,
    pub description: String,
    pub link: String,
}

impl RawArticle {
    /// Build an article applying the entry defaults: a missing title becomes
    /// `"No title"`, a missing description falls back to the title and a
    /// missing link is empty.
    pub fn from_parts(
        title: Option<String>,
        description: Option<String>,
        link: Option<String>,
    ) -> Self {
        let title = title.unwrap_or_else(|| MISSING_TITLE.to_string());
        let description = description.unwrap_or_else(|| title.clone());
        Self {
            title,
            description,
            link: link.unwrap_or_default(),
        }
    }
}

/// An article with its relevance score attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredArticle {
    pub article: RawArticle,
    pub score: u32,
}

/// A summarized article ready to be served
///
/// `description` is an HTML `<ul>` fragment, not the feed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuratedArticle {
    pub title: String,
    pub description: String,
    pub link: String,
}

impl CuratedArticle {
    /// Case-insensitive match against title or description.
    /// `needle` must already be lowercase. The description is matched with
    /// its entities decoded, so `q&a` finds a stored `Q&amp;A`.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || unescape_html(&self.description).to_lowercase().contains(needle)
    }
}

/// Undo the entity escaping applied to summary lines
fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<").replace("&gt;", ">").replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_fall_back() {
        let article = RawArticle::from_parts(None, None, None);
        assert_eq!(article.title, "No title");
        assert_eq!(article.description, "No title");
        assert_eq!(article.link, "");

        let article = RawArticle::from_parts(Some("Headline".into()), None, Some("https://a.b/c".into()));
        assert_eq!(article.description, "Headline");
        assert_eq!(article.link, "https://a.b/c");
    }

    #[test]
    fn test_curated_match_ignores_case() {
        let article = CuratedArticle {
            title: "Markets Rally".into(),
            description: "<ul><li>Stocks rose</li></ul>".into(),
            link: String::new(),
        };
        assert!(article.matches_lowercase("rally"));
        assert!(article.matches_lowercase("stocks"));
        assert!(!article.matches_lowercase("bonds"));
    }

    #[test]
    fn test_curated_match_sees_decoded_entities() {
        let article = CuratedArticle {
            title: "Town hall".into(),
            description: "<ul><li>Open Q&amp;A with the mayor</li><li>Budget &lt;draft&gt; shared</li></ul>".into(),
            link: String::new(),
        };
        assert!(article.matches_lowercase("q&a"));
        assert!(article.matches_lowercase("<draft>"));
        // literal entity text is not in the summary itself
        assert!(!article.matches_lowercase("&amp;"));
    }
}
