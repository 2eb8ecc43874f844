use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Sleeps for `duration` unless `cancel` fires first.
/// Returns `false` when the wait was cut short by cancellation.
pub(crate) async fn settle(duration: Duration, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
