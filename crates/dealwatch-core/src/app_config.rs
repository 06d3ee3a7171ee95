use std::path::PathBuf;

/// Process settings read from the environment.
///
/// Secrets live here rather than in the watchlist YAML so the watchlist can
/// be committed or shared without leaking credentials.
#[derive(Clone)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub hf_api_key: Option<String>,
    pub log_level: String,
    /// Explicit dedup database path. When `None` the database sits next to
    /// the watchlist file.
    pub db_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub search_max_retries: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("telegram_bot_token", &"[redacted]")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field(
                "hf_api_key",
                &self.hf_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("log_level", &self.log_level)
            .field("db_path", &self.db_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("search_max_retries", &self.search_max_retries)
            .finish()
    }
}
