//! Telegram Bot API client for deal alerts and operator commands.

pub mod client;
pub mod error;
pub mod format;
pub mod types;

pub use client::{DealNotifier, TelegramClient};
pub use error::TelegramError;
pub use format::{escape_html, format_deal_caption, format_duration, format_price};
pub use types::Update;
