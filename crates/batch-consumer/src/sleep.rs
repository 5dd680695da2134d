use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sleeps for `duration` unless `cancel` fires first. Returns `true` if the
/// sleep ran to completion, `false` if cancellation cut it short.
pub async fn cancellable_sleep(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(duration) => true,
    }
}
