mod claude_api;
mod openai;

pub use claude_api::ClaudeApiProvider;
pub use openai::OpenAiProvider;

use crate::Result;

/// One request to the summarization service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryPrompt {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

/// Trait for text-in/text-out language model backends
#[async_trait::async_trait]
pub trait AiProvider: Send + Sync {
    /// Provider name used in logs
    fn name(&self) -> &str;

    /// Send the prompt and return the raw completion text
    async fn complete(&self, prompt: &SummaryPrompt) -> Result<String>;
}
