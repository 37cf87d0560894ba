use std::sync::Arc;
use std::time::Duration;

use super::providers::{AiProvider, ClaudeApiProvider, OpenAiProvider, SummaryPrompt};
use crate::config::AppConfig;
use crate::curation::ArticleSummarizer;
use crate::feed::{CuratedArticle, RawArticle};
use crate::{Error, Result};

const SYSTEM_INSTRUCTION: &str =
    "You are a helpful assistant that summarizes newspaper articles for the reader.";

const DIGEST_INSTRUCTION: &str = "\
Summarize the newspaper article below. Follow these rules:
- Main points: list the main points of the article as a numbered bullet list, one point per line.
- Key details: keep important names, dates, statistics and quotes.
- Tone: objective and neutral.
- Length: around 100 - 150 words in total.
- Output ONLY the bullet list. No introduction, no closing remarks, no headings.
- Do NOT include the source or link in your response.";

/// Build the fixed prompt for one article
pub fn build_prompt(article: &RawArticle, max_tokens: u32) -> SummaryPrompt {
    let user = format!(
        "{DIGEST_INSTRUCTION}\n\nTitle: {}\n\n{}\n\nSource: {}\n\nSummary:",
        article.title, article.description, article.link
    );

    SummaryPrompt {
        system: SYSTEM_INSTRUCTION.to_string(),
        user,
        max_tokens,
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Turn a newline-delimited completion into a `<ul>` fragment.
///
/// Returns `None` when there is no non-blank line to show.
pub fn render_bullets(completion: &str) -> Option<String> {
    let items: String = completion
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("<li>{}</li>", escape_html(line)))
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(format!("<ul>{}</ul>", items))
    }
}

/// AI Summarizer that wraps the configured provider
pub struct Summarizer {
    provider: Arc<dyn AiProvider>,
    max_tokens: u32,
    timeout: Duration,
}

impl Summarizer {
    /// Create a new summarizer based on configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let provider: Arc<dyn AiProvider> = match config.ai.provider.as_str() {
            "openai" => {
                let api_key = config.ai.resolved_openai_key()
                    .ok_or_else(|| Error::Config("OpenAI API key not configured".to_string()))?;
                Arc::new(OpenAiProvider::new(&api_key, &config.ai.openai_model))
            }
            "claude_api" => {
                let api_key = config.ai.resolved_claude_key()
                    .ok_or_else(|| Error::Config("Claude API key not configured".to_string()))?;
                Arc::new(ClaudeApiProvider::new(
                    &api_key,
                    &config.ai.claude_model,
                    config.ai.request_timeout_secs,
                )?)
            }
            other => {
                return Err(Error::Config(format!("Unknown AI provider: {}", other)));
            }
        };

        Ok(Self::with_provider(
            provider,
            config.ai.max_summary_tokens.max(1),
            Duration::from_secs(config.ai.request_timeout_secs.max(1)),
        ))
    }

    pub fn with_provider(provider: Arc<dyn AiProvider>, max_tokens: u32, timeout: Duration) -> Self {
        Self { provider, max_tokens, timeout }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}

#[async_trait::async_trait]
impl ArticleSummarizer for Summarizer {
    async fn summarize(&self, article: &RawArticle) -> Result<CuratedArticle> {
        let prompt = build_prompt(article, self.max_tokens);

        let completion = tokio::time::timeout(self.timeout, self.provider.complete(&prompt))
            .await
            .map_err(|_| Error::Timeout {
                what: format!("summarizing '{}'", article.title),
                secs: self.timeout.as_secs(),
            })??;

        let description = render_bullets(&completion).ok_or_else(|| Error::Summarization {
            title: article.title.clone(),
            reason: "empty response from summarization service".to_string(),
        })?;

        tracing::debug!("Summarized '{}' via {}", article.title, self.provider.name());

        Ok(CuratedArticle {
            title: article.title.clone(),
            description,
            link: article.link.clone(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Provider that returns canned text and records the prompts it saw
    pub(crate) struct CannedProvider {
        pub reply: Result<String>,
        pub prompts: Mutex<Vec<SummaryPrompt>>,
    }

    impl CannedProvider {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                reply: Err(Error::AiProvider(message.to_string())),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl AiProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, prompt: &SummaryPrompt) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(Error::AiProvider(e.to_string())),
            }
        }
    }

    struct StalledProvider;

    #[async_trait::async_trait]
    impl AiProvider for StalledProvider {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn complete(&self, _prompt: &SummaryPrompt) -> Result<String> {
            std::future::pending::<()>().await;
            Ok(String::new())
        }
    }

    fn article() -> RawArticle {
        RawArticle {
            title: "Rates rise".to_string(),
            description: "The central bank raised rates by a quarter point.".to_string(),
            link: "https://news.test/rates".to_string(),
        }
    }

    #[test]
    fn test_prompt_embeds_article() {
        let prompt = build_prompt(&article(), 1000);
        assert!(prompt.user.contains("Title: Rates rise"));
        assert!(prompt.user.contains("raised rates by a quarter point"));
        assert!(prompt.user.contains("Source: https://news.test/rates"));
        assert!(prompt.user.contains("100 - 150 words"));
        assert_eq!(prompt.system, SYSTEM_INSTRUCTION);
        assert_eq!(prompt.max_tokens, 1000);
    }

    #[test]
    fn test_render_bullets() {
        let html = render_bullets("1. First point\n\n   \n2. Second point\r\n").unwrap();
        assert_eq!(html, "<ul><li>1. First point</li><li>2. Second point</li></ul>");

        assert_eq!(render_bullets("\n \n"), None);
        assert_eq!(
            render_bullets("Profit <up> & rising").unwrap(),
            "<ul><li>Profit &lt;up&gt; &amp; rising</li></ul>"
        );
    }

    #[tokio::test]
    async fn test_summarize_passes_title_and_link_through() {
        let provider = Arc::new(CannedProvider::replying("- Rates up 0.25%\n- Markets calm"));
        let summarizer = Summarizer::with_provider(provider.clone(), 500, Duration::from_secs(5));

        let curated = summarizer.summarize(&article()).await.unwrap();
        assert_eq!(curated.title, "Rates rise");
        assert_eq!(curated.link, "https://news.test/rates");
        assert_eq!(curated.description, "<ul><li>- Rates up 0.25%</li><li>- Markets calm</li></ul>");
        assert_eq!(provider.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_completion_is_error() {
        let summarizer = Summarizer::with_provider(
            Arc::new(CannedProvider::replying("   \n")),
            500,
            Duration::from_secs(5),
        );
        let result = summarizer.summarize(&article()).await;
        assert!(matches!(result, Err(Error::Summarization { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_provider_times_out() {
        let summarizer = Summarizer::with_provider(Arc::new(StalledProvider), 500, Duration::from_secs(3));
        let result = summarizer.summarize(&article()).await;
        assert!(matches!(result, Err(Error::Timeout { secs: 3, .. })));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut config = AppConfig::default();
        config.ai.provider = "carrier_pigeon".to_string();
        assert!(matches!(Summarizer::new(&config), Err(Error::Config(_))));
    }
}
