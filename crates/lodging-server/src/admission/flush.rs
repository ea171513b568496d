//! Periodic registry flush
//!
//! Dropping every bucket on a fixed period bounds the memory spent on clients that never come
//! back. A client that was throttled gets a full bucket again after a flush.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{AdmissionConfigError, AdmissionController};

/// Owns the background flush task
#[derive(Debug)]
pub struct FlushHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl FlushHandle {
    /// Stop the task and wait for it to exit
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.join.await {
            tracing::error!(error = %e, "Admission flush task ended abnormally");
        }
    }
}

/// Start flushing `controller` every `period`. The first flush happens one period from now.
///
/// Fails when `period` is zero or so large that the second deadline cannot be represented.
pub fn spawn_flush_task(
    controller: Arc<AdmissionController>,
    period: Duration,
) -> Result<FlushHandle, AdmissionConfigError> {
    let start = Instant::now()
        .checked_add(period)
        .filter(|start| !period.is_zero() && start.checked_add(period).is_some())
        .ok_or(AdmissionConfigError::InvalidFlushInterval(period))?;

    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let join = tokio::spawn(async move {
        tracing::info!(period_secs = period.as_secs(), "Admission flush task started");

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let dropped = controller.flush();
                    tracing::debug!(clients = dropped, "Flushed admission registry");
                }
            }
        }

        tracing::info!("Admission flush task stopped");
    });

    Ok(FlushHandle { cancel, join })
}
