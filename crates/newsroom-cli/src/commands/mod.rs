pub mod categories;
pub mod config;
pub mod daemon;
pub mod refresh;
pub mod search;
pub mod show;

use newsroom_core::feed::CuratedArticle;

/// Digest HTML as terminal text
pub(crate) fn render_digest(html: &str) -> String {
    html2text::from_read(html.as_bytes(), 80).unwrap_or_else(|_| html.to_string())
}

pub(crate) fn print_article(index: usize, article: &CuratedArticle) {
    println!("{}. {}", index + 1, article.title);
    if !article.link.is_empty() {
        println!("   {}", article.link);
    }
    for line in render_digest(&article.description).lines() {
        if !line.trim().is_empty() {
            println!("   {}", line);
        }
    }
    println!();
}
