//! Telegram Bot API request and response types.
//!
//! Every response is wrapped in `{"ok": bool, "description"?, "result"?}`;
//! [`ApiEnvelope`] captures that pattern generically.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    pub ok: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseParameters {
    #[serde(default)]
    pub retry_after: Option<u64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessageRequest<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
    pub parse_mode: &'static str,
    pub disable_web_page_preview: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendPhotoRequest<'a> {
    pub chat_id: &'a str,
    pub photo: &'a str,
    pub caption: &'a str,
    pub parse_mode: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetUpdatesRequest {
    pub offset: i64,
    pub timeout: u64,
    pub allowed_updates: [&'static str; 1],
}

// ---------------------------------------------------------------------------
// getUpdates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Update {
    /// The leading bot command of the message text, lowercased and without
    /// any `@botname` suffix. `"/Check@deal_bot now"` yields `"/check"`.
    #[must_use]
    pub fn command(&self) -> Option<String> {
        let text = self.message.as_ref()?.text.as_deref()?.trim();
        if !text.starts_with('/') {
            return None;
        }
        let first = text.split_whitespace().next()?;
        let name = first.split('@').next().unwrap_or(first);
        Some(name.to_lowercase())
    }

    #[must_use]
    pub fn chat_id(&self) -> Option<i64> {
        self.message.as_ref().map(|m| m.chat.id)
    }
}
