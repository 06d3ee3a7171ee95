//! Answers operator commands sent to the bot while the daemon runs.
//!
//! Long-polls `getUpdates` and replies to `/check` and `/status` with the
//! current [`RunStatus`]. Messages from any chat other than the configured
//! one are ignored. Never writes the dedup store.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dealwatch_db::SeenStore;
use dealwatch_telegram::{TelegramClient, Update};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::status::RunStatus;

const STATUS_COMMANDS: [&str; 2] = ["/check", "/status"];

#[derive(Debug, Clone, Copy)]
pub(crate) struct ListenerSettings {
    pub poll_timeout_secs: u64,
    /// Pause between successful polls.
    pub idle: Duration,
    /// Pause after a failed poll.
    pub error_backoff: Duration,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            poll_timeout_secs: 25,
            idle: Duration::from_secs(1),
            error_backoff: Duration::from_secs(5),
        }
    }
}

pub(crate) struct CommandListener {
    client: Arc<TelegramClient>,
    store: SeenStore,
    status: watch::Receiver<RunStatus>,
    settings: ListenerSettings,
}

impl CommandListener {
    pub(crate) fn new(
        client: Arc<TelegramClient>,
        store: SeenStore,
        status: watch::Receiver<RunStatus>,
        settings: ListenerSettings,
    ) -> Self {
        Self {
            client,
            store,
            status,
            settings,
        }
    }

    /// Polls until `cancel` fires. An in-flight long poll is dropped on
    /// cancellation.
    pub(crate) async fn run(self, cancel: CancellationToken) {
        tracing::info!("command listener started");
        let mut offset: i64 = 0;

        loop {
            let polled = tokio::select! {
                () = cancel.cancelled() => break,
                polled = self.client.get_updates(offset, self.settings.poll_timeout_secs) => polled,
            };

            let pause = match polled {
                Ok(updates) => {
                    for update in &updates {
                        offset = offset.max(update.update_id + 1);
                        self.handle(update).await;
                    }
                    self.settings.idle
                }
                Err(e) => {
                    tracing::warn!(error = %e, "getUpdates failed");
                    self.settings.error_backoff
                }
            };

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(pause) => {}
            }
        }

        tracing::info!("command listener stopped");
    }

    async fn handle(&self, update: &Update) {
        let Some(command) = update.command() else {
            return;
        };
        if !STATUS_COMMANDS.contains(&command.as_str()) {
            tracing::debug!(%command, "ignoring unknown command");
            return;
        }
        let from_configured_chat = update
            .chat_id()
            .is_some_and(|id| id.to_string() == self.client.chat_id());
        if !from_configured_chat {
            tracing::warn!(chat_id = ?update.chat_id(), %command, "ignoring command from unknown chat");
            return;
        }

        let tracked = match self.store.count().await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "failed to count seen items");
                0
            }
        };
        let report = self.status.borrow().report(tracked, Utc::now());

        if let Err(e) = self.client.send_message(&report).await {
            tracing::warn!(error = %e, "failed to answer status command");
        }
    }
}

#[cfg(test)]
#[path = "listener_test.rs"]
mod tests;
