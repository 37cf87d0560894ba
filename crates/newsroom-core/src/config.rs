use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Category name → ordered list of feed URLs, in configured order
pub type CategoryFeeds = IndexMap<String, Vec<String>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub curation: CurationConfig,
    #[serde(default = "default_categories")]
    pub categories: CategoryFeeds,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            ai: AiConfig::default(),
            sync: SyncConfig::default(),
            curation: CurationConfig::default(),
            categories: default_categories(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path (holds the snapshot file)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// AI provider: "openai", "claude_api"
    #[serde(default = "default_ai_provider")]
    pub provider: String,
    /// OpenAI API key (falls back to OPENAI_API_KEY)
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// OpenAI model name
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// Claude/Anthropic API key (falls back to ANTHROPIC_API_KEY)
    #[serde(default)]
    pub claude_api_key: Option<String>,
    /// Claude model name
    #[serde(default = "default_claude_model")]
    pub claude_model: String,
    /// Max tokens for one summary
    #[serde(default = "default_max_tokens")]
    pub max_summary_tokens: u32,
    /// Upper bound for one summarization call
    #[serde(default = "default_ai_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: default_ai_provider(),
            openai_api_key: None,
            openai_model: default_openai_model(),
            claude_api_key: None,
            claude_model: default_claude_model(),
            max_summary_tokens: default_max_tokens(),
            request_timeout_secs: default_ai_timeout(),
        }
    }
}

impl AiConfig {
    pub fn resolved_openai_key(&self) -> Option<String> {
        self.openai_api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn resolved_claude_key(&self) -> Option<String> {
        self.claude_api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Full refresh interval in seconds (0 = disabled)
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Per-feed request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// HTTP proxy URL for feed fetching (e.g., "http://127.0.0.1:7890" or "socks5://127.0.0.1:1080")
    #[serde(default)]
    pub proxy_url: Option<String>,
    /// Categories curated in parallel during one refresh
    #[serde(default = "default_category_concurrency")]
    pub category_concurrency: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            request_timeout_secs: default_timeout(),
            proxy_url: None,
            category_concurrency: default_category_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationConfig {
    /// Summaries kept per category
    #[serde(default = "default_max_articles")]
    pub max_articles_per_category: usize,
    /// Cosine similarity at or above which two articles count as duplicates
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            max_articles_per_category: default_max_articles(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newsroom")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ai_provider() -> String {
    "openai".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_claude_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_ai_timeout() -> u64 {
    60
}

fn default_refresh_interval() -> u64 {
    86400 // once a day
}

fn default_timeout() -> u64 {
    30
}

fn default_category_concurrency() -> usize {
    3
}

fn default_max_articles() -> usize {
    8
}

fn default_similarity_threshold() -> f64 {
    0.7
}

fn default_categories() -> CategoryFeeds {
    let table: &[(&str, &[&str])] = &[
        ("general", &[
            "https://rss.nytimes.com/services/xml/rss/nyt/HomePage.xml",
            "http://feeds.bbci.co.uk/news/rss.xml",
            "https://feeds.a.dj.com/rss/RSSWorldNews.xml",
            "https://www.theguardian.com/world/rss",
            "http://rss.cnn.com/rss/edition_world.rss",
            "https://www.aljazeera.com/xml/rss/all.xml",
            "http://feeds.foxnews.com/foxnews/latest",
            "http://feeds.washingtonpost.com/rss/national",
            "https://www.npr.org/rss/rss.php?id=1001",
            "https://www.latimes.com/local/rss2.0.xml",
        ]),
        ("finance", &[
            "https://www.cnbc.com/id/100003114/device/rss/rss.html",
            "https://feeds.a.dj.com/rss/RSSMarketsMain.xml",
            "http://feeds.washingtonpost.com/rss/business",
            "https://www.cnbc.com/id/100727362/device/rss/rss.html",
            "http://rss.cnn.com/rss/money_news_international.rss",
            "https://www.ft.com/?format=rss",
            "http://feeds.skynews.com/feeds/rss/business.xml",
        ]),
        ("technology", &[
            "https://rss.nytimes.com/services/xml/rss/nyt/Technology.xml",
            "http://feeds.bbci.co.uk/news/technology/rss.xml",
            "https://www.cnbc.com/id/19854910/device/rss/rss.html",
            "http://rss.cnn.com/rss/edition_technology.rss",
            "http://feeds.foxnews.com/foxnews/tech",
            "http://feeds.washingtonpost.com/rss/business/technology",
            "https://www.npr.org/rss/rss.php?id=1019",
            "https://www.latimes.com/business/technology/rss2.0.xml",
        ]),
        ("health", &[
            "https://rss.nytimes.com/services/xml/rss/nyt/Health.xml",
            "http://feeds.bbci.co.uk/news/health/rss.xml",
            "https://www.cnbc.com/id/10000108/device/rss/rss.html",
            "http://feeds.foxnews.com/foxnews/health",
            "http://feeds.washingtonpost.com/rss/national/health-science",
            "https://www.npr.org/rss/rss.php?id=1003",
            "https://www.latimes.com/health/rss2.0.xml",
        ]),
        ("sports", &[
            "https://rss.nytimes.com/services/xml/rss/nyt/Sports.xml",
            "http://feeds.bbci.co.uk/sport/rss.xml",
            "https://www.cnbc.com/id/100003114/device/rss/rss.html",
            "http://rss.cnn.com/rss/edition_sport.rss",
            "http://feeds.foxnews.com/foxnews/sports",
            "http://feeds.washingtonpost.com/rss/sports",
            "https://www.npr.org/rss/rss.php?id=1055",
            "https://www.latimes.com/sports/rss2.0.xml",
        ]),
        ("entertainment", &[
            "https://rss.nytimes.com/services/xml/rss/nyt/Arts.xml",
            "http://feeds.bbci.co.uk/news/entertainment_and_arts/rss.xml",
            "https://www.cnbc.com/id/10000739/device/rss/rss.html",
            "http://rss.cnn.com/rss/edition_entertainment.rss",
            "http://feeds.foxnews.com/foxnews/entertainment",
            "http://feeds.washingtonpost.com/rss/entertainment",
            "https://www.npr.org/rss/rss.php?id=1045",
            "https://www.latimes.com/entertainment-arts/rss2.0.xml",
        ]),
    ];

    table
        .iter()
        .map(|(name, urls)| {
            (name.to_string(), urls.iter().map(|u| u.to_string()).collect())
        })
        .collect()
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from file or return defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to file
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        let threshold = self.curation.similarity_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(crate::Error::Config(format!(
                "curation.similarity_threshold must be in (0, 1], got {}",
                threshold
            )));
        }
        if self.curation.max_articles_per_category == 0 {
            return Err(crate::Error::Config(
                "curation.max_articles_per_category must be at least 1".to_string(),
            ));
        }
        if self.categories.is_empty() {
            return Err(crate::Error::Config("no categories configured".to_string()));
        }
        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/newsroom/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("newsroom")
            .join("config.toml")
    }

    /// Get the persisted snapshot path
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir().join("curated_news.json")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }

    /// Configured category names, in snapshot order
    pub fn category_names(&self) -> Vec<String> {
        self.categories.keys().cloned().collect()
    }
}
