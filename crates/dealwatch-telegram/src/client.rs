//! HTTP client for the Telegram Bot API.
//!
//! Wraps `reqwest` with envelope checking (`"ok": false` becomes
//! [`TelegramError::Api`]) and keeps the bot token out of error messages.

use std::time::Duration;

use async_trait::async_trait;
use dealwatch_core::{DealItem, ScanCycleStats};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::TelegramError;
use crate::format::{
    format_deal_caption, format_error, format_scan_summary, format_startup, TEST_MESSAGE,
};
use crate::types::{ApiEnvelope, GetUpdatesRequest, SendMessageRequest, SendPhotoRequest, Update};

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";
const PARSE_MODE: &str = "HTML";
/// Extra allowance on top of the long-poll timeout for `getUpdates`; a
/// 25 s poll stays within the 30 s request budget.
const POLL_GRACE_SECS: u64 = 5;

/// What the scan pipeline needs from a notification channel.
#[async_trait]
pub trait DealNotifier: Send + Sync {
    async fn send_deal(&self, deal: &DealItem) -> Result<(), TelegramError>;

    async fn send_error(&self, message: &str) -> Result<(), TelegramError>;

    /// Sends a cycle summary. Implementations skip cycles with nothing new.
    async fn send_scan_summary(
        &self,
        stats: &ScanCycleStats,
        elapsed: Duration,
    ) -> Result<(), TelegramError>;
}

/// Client for one bot posting to one chat.
///
/// Use [`TelegramClient::new`] for production or
/// [`TelegramClient::with_base_url`] to point at a mock server in tests.
pub struct TelegramClient {
    client: Client,
    /// `<base>/bot<token>/`
    api_root: Url,
    chat_id: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// # Errors
    ///
    /// Returns [`TelegramError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(bot_token: &str, chat_id: &str, timeout_secs: u64) -> Result<Self, TelegramError> {
        Self::with_base_url(bot_token, chat_id, timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`TelegramError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`TelegramError::InvalidBaseUrl`] if `base_url` does not
    /// parse.
    pub fn with_base_url(
        bot_token: &str,
        chat_id: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        let raw = format!("{}/bot{bot_token}/", base_url.trim_end_matches('/'));
        let api_root = Url::parse(&raw).map_err(|e| TelegramError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_root,
            chat_id: chat_id.to_owned(),
        })
    }

    #[must_use]
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Sends an HTML message to the configured chat.
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError`] on transport failure or a non-`ok` envelope.
    pub async fn send_message(&self, text: &str) -> Result<(), TelegramError> {
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: PARSE_MODE,
            disable_web_page_preview: false,
        };
        self.call::<_, serde_json::Value>("sendMessage", &request, None)
            .await?;
        Ok(())
    }

    /// Sends a photo by URL with an HTML caption.
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError`] on transport failure or a non-`ok` envelope.
    pub async fn send_photo(&self, photo_url: &str, caption: &str) -> Result<(), TelegramError> {
        let request = SendPhotoRequest {
            chat_id: &self.chat_id,
            photo: photo_url,
            caption,
            parse_mode: PARSE_MODE,
        };
        self.call::<_, serde_json::Value>("sendPhoto", &request, None)
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`TelegramError`] if the message cannot be delivered.
    pub async fn send_startup(
        &self,
        brand_count: usize,
        interval_minutes: u64,
    ) -> Result<(), TelegramError> {
        self.send_message(&format_startup(
            brand_count,
            interval_minutes,
            chrono::Local::now(),
        ))
        .await
    }

    /// Sends a fixed test message; used by `--test-telegram`.
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError`] if the bot token or chat id is wrong.
    pub async fn test_connection(&self) -> Result<(), TelegramError> {
        self.send_message(TEST_MESSAGE).await
    }

    /// Long-polls for new updates starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError`] on transport failure or a non-`ok` envelope.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: ["message"],
        };
        let updates = self
            .call::<_, Vec<Update>>(
                "getUpdates",
                &request,
                Some(Duration::from_secs(timeout_secs + POLL_GRACE_SECS)),
            )
            .await?;
        Ok(updates.unwrap_or_default())
    }

    async fn call<B, T>(
        &self,
        method: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<Option<T>, TelegramError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self
            .api_root
            .join(method)
            .map_err(|e| TelegramError::Api(format!("bad method name '{method}': {e}")))?;

        let mut request = self.client.post(url).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(strip_url)?;
        let status = response.status();
        let text = response.text().await.map_err(strip_url)?;

        let envelope: ApiEnvelope<T> =
            serde_json::from_str(&text).map_err(|e| TelegramError::Deserialize {
                context: format!("{method} response (HTTP {})", status.as_u16()),
                source: e,
            })?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = envelope
                .parameters
                .and_then(|p| p.retry_after)
                .unwrap_or(1);
            tracing::warn!(method, retry_after_secs, "telegram rate limited");
            return Err(TelegramError::RateLimited { retry_after_secs });
        }

        if !envelope.ok {
            let description = envelope
                .description
                .unwrap_or_else(|| format!("{method} failed with HTTP {}", status.as_u16()));
            tracing::warn!(method, status = status.as_u16(), %description, "telegram call rejected");
            return Err(TelegramError::Api(description));
        }

        Ok(envelope.result)
    }
}

/// Request URLs contain the bot token.
fn strip_url(e: reqwest::Error) -> TelegramError {
    TelegramError::Http(e.without_url())
}

#[async_trait]
impl DealNotifier for TelegramClient {
    async fn send_deal(&self, deal: &DealItem) -> Result<(), TelegramError> {
        let caption = format_deal_caption(deal);
        match deal.image_url.as_deref().filter(|u| !u.is_empty()) {
            Some(photo) => self.send_photo(photo, &caption).await,
            None => self.send_message(&caption).await,
        }
    }

    async fn send_error(&self, message: &str) -> Result<(), TelegramError> {
        self.send_message(&format_error(message)).await
    }

    async fn send_scan_summary(
        &self,
        stats: &ScanCycleStats,
        elapsed: Duration,
    ) -> Result<(), TelegramError> {
        if stats.unseen == 0 {
            return Ok(());
        }
        self.send_message(&format_scan_summary(stats, elapsed)).await
    }
}
