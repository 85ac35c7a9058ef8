use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: String,

    /// Feed-listing URL revealing how many review pages an app has.
    /// `{id}` is replaced with the app id.
    #[serde(default = "default_probe_url_template")]
    pub probe_url_template: String,

    /// Paginated reviews URL. `{page}` and `{id}` are replaced per request.
    #[serde(default = "default_reviews_url_template")]
    pub reviews_url_template: String,

    #[serde(default = "default_probe_pool_size")]
    pub probe_pool_size: usize,

    #[serde(default = "default_scrape_pool_size")]
    pub scrape_pool_size: usize,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn data_dir() -> PathBuf {
    let dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("review-harvester");
    std::fs::create_dir_all(&dir).ok();
    dir
}

fn default_db_path() -> String {
    data_dir().join("reviews.db").to_string_lossy().to_string()
}

fn default_checkpoint_dir() -> String {
    data_dir().join("checkpoints").to_string_lossy().to_string()
}

fn default_probe_url_template() -> String {
    "https://itunes.apple.com/rss/customerreviews/id={id}/json".to_string()
}

fn default_reviews_url_template() -> String {
    "https://itunes.apple.com/us/rss/customerreviews/page={page}/id={id}/sortby=mostrecent/json"
        .to_string()
}

fn default_probe_pool_size() -> usize {
    200
}

fn default_scrape_pool_size() -> usize {
    50
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            checkpoint_dir: default_checkpoint_dir(),
            probe_url_template: default_probe_url_template(),
            reviews_url_template: default_reviews_url_template(),
            probe_pool_size: default_probe_pool_size(),
            scrape_pool_size: default_scrape_pool_size(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(&config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("review-harvester")
            .join("config.toml")
    }

    pub fn probe_url(&self, app_id: i64) -> String {
        self.probe_url_template.replace("{id}", &app_id.to_string())
    }

    pub fn scrape_url(&self, page: i64, app_id: i64) -> String {
        self.reviews_url_template
            .replace("{page}", &page.to_string())
            .replace("{id}", &app_id.to_string())
    }
}
