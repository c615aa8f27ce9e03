use std::fmt;

const COVER_ENDPOINT: &str = "/api/library/cover";

/// Token appended to cover URLs so cached artwork is refetched after a
/// library mutation. Process-local; only `LibrarySession` advances it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheEpoch(i64);

impl CacheEpoch {
    pub fn now() -> Self {
        CacheEpoch(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(millis: i64) -> Self {
        CacheEpoch(millis)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Next epoch: the current time, or one past this epoch if the clock has
    /// not moved forward.
    pub(crate) fn advance(self) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        CacheEpoch(now.max(self.0 + 1))
    }
}

impl fmt::Display for CacheEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Builds artwork addresses for audio files. Never inspects content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverResolver {
    base_url: String,
}

impl CoverResolver {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn resolve(&self, path: &str, epoch: Option<CacheEpoch>) -> String {
        let mut url = format!(
            "{}{}?path={}",
            self.base_url,
            COVER_ENDPOINT,
            urlencoding::encode(path)
        );
        if let Some(epoch) = epoch {
            url.push_str("&t=");
            url.push_str(&epoch.to_string());
        }
        url
    }
}
