use std::env;
use std::time::Duration;

use log::LevelFilter;

pub struct Config {
    pub api_url: String,
    pub music_path: Option<String>,
    pub search_limit: u32,
    pub search_country: Option<String>,
    pub timeout_secs: u64,
    pub log_level: LevelFilter,
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Reads `ONGAKU_TAG_*` variables, after loading a `.env` file if present.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self {
            api_url: env::var("ONGAKU_TAG_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string()),
            music_path: non_empty("ONGAKU_TAG_MUSIC_PATH"),
            search_limit: env::var("ONGAKU_TAG_SEARCH_LIMIT")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .unwrap_or(15),
            search_country: non_empty("ONGAKU_TAG_SEARCH_COUNTRY"),
            timeout_secs: env::var("ONGAKU_TAG_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            log_level: env::var("ONGAKU_TAG_LOG")
                .unwrap_or_else(|_| "info".to_string())
                .parse()
                .unwrap_or(LevelFilter::Info),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
