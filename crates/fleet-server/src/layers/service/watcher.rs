use crate::layers::service::dispatcher::Dispatcher;
use protocol::{Command, SYSTEM_ACTOR};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub(crate) fn spawn_status_watcher(
    dispatcher: Arc<Dispatcher>,
    interval: Duration,
    deadline: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(run_status_watcher(dispatcher, interval, deadline, cancel))
}

/// Refreshes every cluster's power state through the regular dispatcher on a
/// fixed interval, first tick immediately. A refresh in flight is never
/// interrupted; cancellation is observed between ticks.
pub(crate) async fn run_status_watcher(
    dispatcher: Arc<Dispatcher>,
    interval: Duration,
    deadline: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let command = Command::new(SYSTEM_ACTOR, "status", Vec::new());
    tracing::info!(
        event = "watcher.started",
        interval = %humantime::format_duration(interval),
    );

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        match dispatcher.dispatch_with_deadline(&command, deadline).await {
            Ok(response) if response.is_error() => tracing::warn!(
                event = "watcher.refresh_failed",
                error = %response.cmd_error,
            ),
            Ok(response) => tracing::debug!(
                event = "watcher.refreshed",
                exec_time = ?response.exec_time,
            ),
            Err(status) => tracing::warn!(
                event = "watcher.refresh_failed",
                code = status.code.as_str(),
                error = %status,
            ),
        }
    }
    tracing::info!(event = "watcher.stopped");
}
