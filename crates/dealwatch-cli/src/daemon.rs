//! Long-running mode: the timed scan loop plus the command listener.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dealwatch_scraper::ListingSearch;
use dealwatch_telegram::{DealNotifier, TelegramClient};
use dealwatch_vision::ImageClassifier;
use futures::FutureExt;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::listener::{CommandListener, ListenerSettings};
use crate::pipeline::ScanPipeline;
use crate::status::RunStatus;

const PANIC_COOLDOWN: Duration = Duration::from_secs(30);
const LISTENER_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Runs scan cycles until SIGINT/SIGTERM, answering status commands
/// alongside.
pub(crate) async fn run<S, C>(
    pipeline: ScanPipeline<S, C, TelegramClient>,
    listener_settings: ListenerSettings,
) where
    S: ListingSearch,
    C: ImageClassifier,
{
    let (status_tx, status_rx) = watch::channel(RunStatus::started(Utc::now()));

    let listener_cancel = CancellationToken::new();
    let listener = CommandListener::new(
        Arc::clone(pipeline.notifier()),
        pipeline.store().clone(),
        status_rx,
        listener_settings,
    );
    let mut listener_handle = tokio::spawn(listener.run(listener_cancel.clone()));

    let scan_cancel = CancellationToken::new();
    let signal_task = {
        let scan_cancel = scan_cancel.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            scan_cancel.cancel();
        })
    };

    run_scan_loop(&pipeline, &status_tx, &scan_cancel, PANIC_COOLDOWN).await;
    signal_task.abort();

    listener_cancel.cancel();
    match tokio::time::timeout(LISTENER_SHUTDOWN_GRACE, &mut listener_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "command listener ended abnormally"),
        Err(_) => {
            tracing::warn!("command listener did not stop in time, aborting");
            listener_handle.abort();
        }
    }

    tracing::info!("dealwatch stopped");
}

/// First cycle runs immediately, then one per `scan_interval_minutes`.
/// A panicking cycle is reported and followed by `panic_cooldown`.
pub(crate) async fn run_scan_loop<S, C, N>(
    pipeline: &ScanPipeline<S, C, N>,
    status: &watch::Sender<RunStatus>,
    cancel: &CancellationToken,
    panic_cooldown: Duration,
) where
    S: ListingSearch,
    C: ImageClassifier,
    N: DealNotifier,
{
    let interval_minutes = pipeline.watch().scan_interval_minutes;
    let mut ticker = tokio::time::interval(scan_period(interval_minutes));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match AssertUnwindSafe(pipeline.run_cycle(cancel))
            .catch_unwind()
            .await
        {
            Ok(stats) => {
                status.send_modify(|s| s.record_cycle(stats, Utc::now()));
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(panic = %message, "scan cycle panicked");
                if let Err(e) = pipeline
                    .notifier()
                    .send_error(&format!("Panic: {message}"))
                    .await
                {
                    tracing::warn!(error = %e, "failed to report panic");
                }
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(panic_cooldown) => {}
                }
            }
        }

        if cancel.is_cancelled() {
            break;
        }
        tracing::info!(interval_minutes, "next scan scheduled");
    }

    tracing::info!("scan loop stopped");
}

fn scan_period(interval_minutes: u64) -> Duration {
    Duration::from_secs(interval_minutes.saturating_mul(60))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, finishing current cycle");
}

#[cfg(test)]
#[path = "daemon_test.rs"]
mod tests;
