pub mod providers;
mod summarizer;

pub use providers::{AiProvider, SummaryPrompt};
pub use summarizer::{build_prompt, render_bullets, Summarizer};

#[cfg(test)]
pub(crate) use summarizer::tests as tests_support;
