//! Job status polling loop
//!
//! Owns at most one fixed-interval polling loop per job lifecycle
//! (single-flight). Each tick queries the backend job status and hands the
//! snapshot to the subscriber; the loop cancels itself when the backend
//! reports the job as no longer running.
//!
//! Ticks are serialized: the next tick is not armed until the previous
//! response has been fully processed, so out-of-order status snapshots
//! cannot occur.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::job::JobStatus;
use crate::domain::services::sync_service::SyncService;

/// Callback invoked with every status snapshot the poller accepts.
pub type StatusCallback = Arc<dyn Fn(JobStatus) + Send + Sync>;

struct PollLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl PollLoop {
    fn is_active(&self) -> bool {
        !self.cancel.is_cancelled() && !self.handle.is_finished()
    }
}

/// Single-flight fixed-interval poller over `SyncService::get_job_status`.
pub struct JobStatusPoller {
    service: Arc<dyn SyncService>,
    interval: Duration,
    active: Mutex<Option<PollLoop>>,
}

impl JobStatusPoller {
    pub fn new(service: Arc<dyn SyncService>, interval: Duration) -> Self {
        Self {
            service,
            interval,
            active: Mutex::new(None),
        }
    }

    /// Begins the polling loop. No-op when a loop is already active, so
    /// re-entrant or duplicated calls cannot produce a second timer. The
    /// first tick fires immediately, then once per interval.
    pub async fn start_polling(&self, on_update: StatusCallback) {
        let mut active = self.active.lock().await;
        if let Some(current) = active.as_ref() {
            if current.is_active() {
                debug!("poll loop already active; ignoring duplicate start");
                return;
            }
        }

        debug!(interval_ms = self.interval.as_millis() as u64, "starting poll loop");
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.service),
            self.interval,
            cancel.clone(),
            on_update,
        ));
        *active = Some(PollLoop { cancel, handle });
    }

    /// Cancels future ticks. Idempotent and safe to call when not polling.
    /// An in-flight request is not aborted; its response is discarded when
    /// it lands after cancellation.
    pub async fn stop_polling(&self) {
        let active = self.active.lock().await;
        if let Some(current) = active.as_ref() {
            if !current.cancel.is_cancelled() {
                debug!("stopping poll loop");
                current.cancel.cancel();
            }
        }
    }

    pub async fn is_polling(&self) -> bool {
        let active = self.active.lock().await;
        active.as_ref().is_some_and(PollLoop::is_active)
    }
}

async fn poll_loop(
    service: Arc<dyn SyncService>,
    interval: Duration,
    cancel: CancellationToken,
    on_update: StatusCallback,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let status = match service.get_job_status().await {
            Ok(status) => status,
            Err(err) => {
                // Transient tick failure: stay alive and retry next tick so
                // a network blip cannot strand the controller.
                warn!("status poll tick failed: {}", err);
                continue;
            }
        };

        if cancel.is_cancelled() {
            // stop_polling() raced this request; the snapshot is stale.
            debug!("discarding status snapshot that landed after stop");
            break;
        }

        let finished = !status.is_running;
        if finished {
            // Cancel before the final delivery so subscribers observe the
            // poller as already stopped in the terminal callback.
            cancel.cancel();
        }
        on_update(status);
        if finished {
            debug!("job reported not running; poll loop finished");
            break;
        }
    }
}
