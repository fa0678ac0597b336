use std::time::Duration;
use tracing::warn;

/// Suspend the calling virtual user for `secs` seconds.
///
/// Only the current task is paused; other virtual users keep running. Negative, non-finite or
/// out-of-range values pause for zero seconds.
pub async fn sleep(secs: f64) {
    let duration = match Duration::try_from_secs_f64(secs) {
        Ok(duration) => duration,
        Err(_) => {
            warn!("Invalid sleep of {secs}s requested; not sleeping.");
            Duration::ZERO
        }
    };

    tokio::time::sleep(duration).await;
}
