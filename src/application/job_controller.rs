//! Job controller state machine
//!
//! Wraps start/stop requests around the backend refresh job and reflects
//! its observed state. The single source of truth for "is the job still
//! running" is always the next poll response: `stop()` never flips local
//! state to idle on its own, so a stop racing a job that finishes naturally
//! cannot produce an inconsistent state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::application::events::EventEmitter;
use crate::application::poller::{JobStatusPoller, StatusCallback};
use crate::domain::events::SyncEvent;
use crate::domain::job::{JobControllerState, JobStatus, SyncSelection};
use crate::domain::services::sync_service::{SyncError, SyncService};

/// Orchestrates the sync job lifecycle: `Idle → Starting → Running →
/// (Stopping) → Idle`. Constructed once per session and shared by handle.
#[derive(Clone)]
pub struct JobController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    service: Arc<dyn SyncService>,
    poller: JobStatusPoller,
    state_tx: watch::Sender<JobControllerState>,
    status_tx: watch::Sender<JobStatus>,
    events: EventEmitter,
}

impl JobController {
    pub fn new(service: Arc<dyn SyncService>, poll_interval: Duration) -> Self {
        let (state_tx, _) = watch::channel(JobControllerState::Idle);
        let (status_tx, _) = watch::channel(JobStatus::default());
        Self {
            inner: Arc::new(ControllerInner {
                poller: JobStatusPoller::new(Arc::clone(&service), poll_interval),
                service,
                state_tx,
                status_tx,
                events: EventEmitter::new(),
            }),
        }
    }

    pub fn state(&self) -> JobControllerState {
        *self.inner.state_tx.borrow()
    }

    /// Latest status snapshot observed from the backend.
    pub fn status(&self) -> JobStatus {
        self.inner.status_tx.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<JobControllerState> {
        self.inner.state_tx.subscribe()
    }

    pub fn watch_status(&self) -> watch::Receiver<JobStatus> {
        self.inner.status_tx.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }

    /// Submits a refresh job scoped to `selection` and begins polling.
    ///
    /// A status probe runs first: when a job is already active (stale UI,
    /// another operator, a previous session) the controller attaches to it
    /// without re-submitting. Start failures surface an error notification
    /// and leave the controller idle.
    pub async fn start(&self, selection: &SyncSelection) -> Result<(), SyncError> {
        // Claim the lifecycle before the first await: an overlapping start
        // issued while the probe is in flight must fail, not double-submit.
        if !self
            .inner
            .try_transition(JobControllerState::Idle, JobControllerState::Starting)
        {
            return Err(SyncError::InvalidState("start is only valid while idle"));
        }

        match self.inner.service.get_job_status().await {
            Ok(status) if status.is_running => {
                info!("sync job already active; attaching without re-submitting");
                self.inner.status_tx.send_replace(status);
                self.transition(JobControllerState::Running);
                self.begin_polling().await;
                self.inner
                    .events
                    .notify_info("A sync job is already running; showing live progress");
                return Ok(());
            }
            Ok(_) => {}
            Err(err) => {
                // The probe only guards against duplicate submission; the
                // start call below still reports real failures.
                debug!("pre-start status probe failed: {}", err);
            }
        }

        match self.inner.service.start_job(selection).await {
            Ok(ack) if ack.accepted => {
                info!(
                    categories = selection.category_ids.len(),
                    product_lines = selection.product_line_ids.len(),
                    "sync job started"
                );
                self.transition(JobControllerState::Running);
                self.inner.events.emit(SyncEvent::job_started());
                self.begin_polling().await;
                Ok(())
            }
            Ok(ack) => {
                let reason = ack
                    .message
                    .unwrap_or_else(|| "start request rejected".to_string());
                warn!("backend rejected sync start: {}", reason);
                self.transition(JobControllerState::Idle);
                self.inner
                    .events
                    .notify_error(format!("Could not start sync: {reason}"));
                Err(SyncError::Rejected(reason))
            }
            Err(err) => {
                warn!("sync start failed: {}", err);
                self.transition(JobControllerState::Idle);
                self.inner
                    .events
                    .notify_error(format!("Could not start sync: {err}"));
                Err(err)
            }
        }
    }

    /// Requests that the running job halts. Polling continues unchanged;
    /// the transition to idle only happens once a poll tick confirms the
    /// backend reports the job as no longer running.
    pub async fn stop(&self) -> Result<(), SyncError> {
        match self.state() {
            // Stopping is allowed as a retry after a failed stop request.
            JobControllerState::Running | JobControllerState::Stopping => {}
            _ => return Err(SyncError::InvalidState("no running job to stop")),
        }

        self.transition(JobControllerState::Stopping);
        match self.inner.service.stop_job().await {
            Ok(ack) if ack.accepted => {
                info!("stop requested; waiting for a poll tick to confirm termination");
                self.inner.events.emit(SyncEvent::job_stop_requested());
                Ok(())
            }
            Ok(ack) => {
                let reason = ack
                    .message
                    .unwrap_or_else(|| "stop request rejected".to_string());
                warn!("backend rejected sync stop: {}", reason);
                self.inner
                    .events
                    .notify_error(format!("Could not stop sync: {reason}"));
                Err(SyncError::Rejected(reason))
            }
            Err(err) => {
                warn!("sync stop failed: {}", err);
                self.inner
                    .events
                    .notify_error(format!("Could not stop sync: {err}"));
                Err(err)
            }
        }
    }

    /// Queries the backend once at session start and attaches to a job left
    /// running by a previous session. Call before rendering job controls.
    pub async fn check_initial_status(&self) -> Result<(), SyncError> {
        // Same claim as start(): only one caller gets to probe at a time.
        if !self
            .inner
            .try_transition(JobControllerState::Idle, JobControllerState::Starting)
        {
            return Ok(());
        }
        match self.inner.service.get_job_status().await {
            Ok(status) => {
                let running = status.is_running;
                self.inner.status_tx.send_replace(status);
                if running {
                    info!("found an in-flight sync job at session start; attaching");
                    self.transition(JobControllerState::Running);
                    self.begin_polling().await;
                } else {
                    self.transition(JobControllerState::Idle);
                }
                Ok(())
            }
            Err(err) => {
                self.transition(JobControllerState::Idle);
                Err(err)
            }
        }
    }

    async fn begin_polling(&self) {
        let inner = Arc::clone(&self.inner);
        let callback: StatusCallback = Arc::new(move |status| inner.apply_status(status));
        self.inner.poller.start_polling(callback).await;
    }

    fn transition(&self, next: JobControllerState) {
        self.inner.transition(next);
    }
}

impl ControllerInner {
    /// Atomically moves `from -> to`. The watch sender serializes access to
    /// the state, so two racing callers cannot both observe `from`.
    fn try_transition(&self, from: JobControllerState, to: JobControllerState) -> bool {
        self.state_tx.send_if_modified(|state| {
            if *state != from {
                return false;
            }
            debug!("controller state {} -> {}", state, to);
            *state = to;
            true
        })
    }

    fn transition(&self, next: JobControllerState) {
        self.state_tx.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            debug!("controller state {} -> {}", state, next);
            *state = next;
            true
        });
    }

    /// Poll-tick entry point; runs on the poller task. The terminal
    /// snapshot arrives after the poller has already cancelled itself.
    fn apply_status(&self, status: JobStatus) {
        let finished = !status.is_running;
        self.status_tx.send_replace(status);
        if finished && *self.state_tx.borrow() != JobControllerState::Idle {
            self.transition(JobControllerState::Idle);
            self.events.emit(SyncEvent::job_finished());
            self.events.notify_info("Sync job finished");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;

    use crate::domain::catalog::{CategoryId, SuperCategory};
    use crate::domain::events::NotificationLevel;
    use crate::domain::job::{CategoryVisibility, JobAccepted};

    const POLL: Duration = Duration::from_secs(1);

    fn running(log: &str) -> JobStatus {
        JobStatus {
            is_running: true,
            current_category: Some("iPhone 13".to_string()),
            current_item: None,
            logs: vec![log.to_string()],
        }
    }

    fn finished(log: &str) -> JobStatus {
        JobStatus {
            is_running: false,
            current_category: None,
            current_item: None,
            logs: vec![log.to_string()],
        }
    }

    /// Backend stub with a scripted sequence of status responses. Once the
    /// script runs out it keeps answering "not running".
    struct MockBackend {
        start_calls: AtomicUsize,
        stop_calls: AtomicUsize,
        status_calls: AtomicUsize,
        statuses: StdMutex<VecDeque<Result<JobStatus, SyncError>>>,
        start_result: StdMutex<Option<Result<JobAccepted, SyncError>>>,
        stop_accepted: AtomicBool,
        status_delay: Duration,
    }

    impl MockBackend {
        fn new(statuses: Vec<Result<JobStatus, SyncError>>) -> Arc<Self> {
            Arc::new(Self {
                start_calls: AtomicUsize::new(0),
                stop_calls: AtomicUsize::new(0),
                status_calls: AtomicUsize::new(0),
                statuses: StdMutex::new(statuses.into()),
                start_result: StdMutex::new(None),
                stop_accepted: AtomicBool::new(true),
                status_delay: Duration::ZERO,
            })
        }

        fn with_start_result(self: Arc<Self>, result: Result<JobAccepted, SyncError>) -> Arc<Self> {
            *self.start_result.lock().unwrap() = Some(result);
            self
        }

        fn with_status_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
            let mut backend = Arc::into_inner(self).unwrap();
            backend.status_delay = delay;
            Arc::new(backend)
        }

        fn set_stop_accepted(&self, accepted: bool) {
            self.stop_accepted.store(accepted, Ordering::SeqCst);
        }

        fn start_calls(&self) -> usize {
            self.start_calls.load(Ordering::SeqCst)
        }

        fn stop_calls(&self) -> usize {
            self.stop_calls.load(Ordering::SeqCst)
        }

        fn status_calls(&self) -> usize {
            self.status_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SyncService for MockBackend {
        async fn fetch_catalog_tree(
            &self,
            _include_inactive: bool,
        ) -> Result<Vec<SuperCategory>, SyncError> {
            Ok(Vec::new())
        }

        async fn start_job(&self, _selection: &SyncSelection) -> Result<JobAccepted, SyncError> {
            self.start_calls.fetch_add(1, Ordering::SeqCst);
            match self.start_result.lock().unwrap().take() {
                Some(result) => result,
                None => Ok(JobAccepted { accepted: true, message: None }),
            }
        }

        async fn get_job_status(&self) -> Result<JobStatus, SyncError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            if !self.status_delay.is_zero() {
                tokio::time::sleep(self.status_delay).await;
            }
            match self.statuses.lock().unwrap().pop_front() {
                Some(result) => result,
                None => Ok(JobStatus::default()),
            }
        }

        async fn stop_job(&self) -> Result<JobAccepted, SyncError> {
            self.stop_calls.fetch_add(1, Ordering::SeqCst);
            Ok(JobAccepted {
                accepted: self.stop_accepted.load(Ordering::SeqCst),
                message: Some("refresh is busy".to_string()),
            })
        }

        async fn toggle_category_visibility(
            &self,
            _category_id: CategoryId,
        ) -> Result<CategoryVisibility, SyncError> {
            Ok(CategoryVisibility { is_active: true })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn successful_start_polls_until_terminal_snapshot() {
        let backend = MockBackend::new(vec![
            Ok(JobStatus::default()), // pre-start probe
            Ok(running("fetching iPhone 13")),
            Ok(running("fetching iPhone 13 mini")),
            Ok(finished("done")),
        ]);
        let controller = JobController::new(backend.clone(), POLL);
        let mut events = controller.subscribe_events();

        controller.start(&SyncSelection::default()).await.unwrap();
        assert_eq!(controller.state(), JobControllerState::Running);
        assert_eq!(backend.start_calls(), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(controller.state(), JobControllerState::Idle);
        // The last snapshot stays frozen after the job ends.
        assert_eq!(controller.status().logs, vec!["done".to_string()]);

        assert!(matches!(events.recv().await.unwrap(), SyncEvent::JobStarted { .. }));
        assert!(matches!(events.recv().await.unwrap(), SyncEvent::JobFinished { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn start_attaches_to_already_running_job_without_resubmitting() {
        let backend = MockBackend::new(vec![
            Ok(running("already in flight")), // pre-start probe
            Ok(running("still going")),
            Ok(finished("done")),
        ]);
        let controller = JobController::new(backend.clone(), POLL);

        controller.start(&SyncSelection::default()).await.unwrap();
        assert_eq!(controller.state(), JobControllerState::Running);
        assert_eq!(backend.start_calls(), 0);
        assert_eq!(controller.status().logs, vec!["already in flight".to_string()]);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(controller.state(), JobControllerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_start_returns_to_idle_and_notifies() {
        let backend = MockBackend::new(vec![Ok(JobStatus::default())])
            .with_start_result(Err(SyncError::Transport("connection refused".to_string())));
        let controller = JobController::new(backend.clone(), POLL);
        let mut events = controller.subscribe_events();

        let result = controller.start(&SyncSelection::default()).await;
        assert!(matches!(result, Err(SyncError::Transport(_))));
        assert_eq!(controller.state(), JobControllerState::Idle);
        assert!(!controller.inner.poller.is_polling().await);

        match events.recv().await.unwrap() {
            SyncEvent::Notification { level, .. } => assert_eq!(level, NotificationLevel::Error),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_start_returns_to_idle() {
        let backend = MockBackend::new(vec![Ok(JobStatus::default())]).with_start_result(Ok(
            JobAccepted { accepted: false, message: Some("already running".to_string()) },
        ));
        let controller = JobController::new(backend.clone(), POLL);

        let result = controller.start(&SyncSelection::default()).await;
        assert!(matches!(result, Err(SyncError::Rejected(_))));
        assert_eq!(controller.state(), JobControllerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_stays_stopping_until_poll_confirms_termination() {
        let backend = MockBackend::new(vec![
            Ok(JobStatus::default()), // pre-start probe
            Ok(running("tick 1")),
            Ok(running("tick 2")),
            Ok(running("tick 3")),
            Ok(finished("halted")),
        ]);
        let controller = JobController::new(backend.clone(), POLL);

        controller.start(&SyncSelection::default()).await.unwrap();
        controller.stop().await.unwrap();
        assert_eq!(backend.stop_calls(), 1);
        assert_eq!(controller.state(), JobControllerState::Stopping);

        // The backend still reports the job as running: stay in Stopping.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(controller.state(), JobControllerState::Stopping);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(controller.state(), JobControllerState::Idle);
        assert!(!controller.inner.poller.is_polling().await);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_starts_submit_only_one_job() {
        // The status probe is slow, so the second start lands while the
        // first is still probing. Only one may claim the lifecycle.
        let backend = MockBackend::new(vec![Ok(JobStatus::default()), Ok(JobStatus::default())])
            .with_status_delay(Duration::from_millis(200));
        let controller = JobController::new(backend.clone(), POLL);

        let selection = SyncSelection::default();
        let (first, second) = tokio::join!(
            controller.start(&selection),
            controller.start(&selection),
        );

        assert_eq!(backend.start_calls(), 1);
        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(SyncError::InvalidState(_)))));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_stop_stays_stopping_and_allows_retry() {
        let backend = MockBackend::new(vec![
            Ok(JobStatus::default()), // pre-start probe
            Ok(running("tick 1")),
            Ok(running("tick 2")),
            Ok(running("tick 3")),
            Ok(running("tick 4")),
            Ok(finished("halted")),
        ]);
        let controller = JobController::new(backend.clone(), POLL);

        controller.start(&SyncSelection::default()).await.unwrap();
        let mut events = controller.subscribe_events();

        backend.set_stop_accepted(false);
        let rejected = controller.stop().await;
        assert!(matches!(rejected, Err(SyncError::Rejected(_))));
        assert_eq!(controller.state(), JobControllerState::Stopping);
        match events.recv().await.unwrap() {
            SyncEvent::Notification { level, .. } => assert_eq!(level, NotificationLevel::Error),
            other => panic!("unexpected event: {other:?}"),
        }

        // Still Stopping a tick later; the job keeps running meanwhile.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(controller.state(), JobControllerState::Stopping);

        // Retrying from Stopping is allowed and goes back to the backend.
        backend.set_stop_accepted(true);
        controller.stop().await.unwrap();
        assert_eq!(backend.stop_calls(), 2);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(controller.state(), JobControllerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_initial_checks_probe_once() {
        let backend = MockBackend::new(vec![Ok(running("resumed"))])
            .with_status_delay(Duration::from_millis(200));
        let controller = JobController::new(backend.clone(), POLL);

        let (first, second) = tokio::join!(
            controller.check_initial_status(),
            controller.check_initial_status(),
        );
        first.unwrap();
        second.unwrap();

        assert_eq!(backend.status_calls(), 1);
        assert_eq!(controller.state(), JobControllerState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn check_initial_status_attaches_to_prior_session_job() {
        let backend = MockBackend::new(vec![
            Ok(running("resumed")), // initial check
            Ok(finished("done")),
        ]);
        let controller = JobController::new(backend.clone(), POLL);

        controller.check_initial_status().await.unwrap();
        assert_eq!(controller.state(), JobControllerState::Running);
        assert_eq!(backend.start_calls(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(controller.state(), JobControllerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn check_initial_status_stays_idle_without_a_job() {
        let backend = MockBackend::new(vec![Ok(JobStatus::default())]);
        let controller = JobController::new(backend.clone(), POLL);

        controller.check_initial_status().await.unwrap();
        assert_eq!(controller.state(), JobControllerState::Idle);
        assert!(!controller.inner.poller.is_polling().await);
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_rejected_while_a_job_is_active() {
        let backend = MockBackend::new(vec![
            Ok(JobStatus::default()),
            Ok(running("tick 1")),
            Ok(running("tick 2")),
        ]);
        let controller = JobController::new(backend.clone(), POLL);

        controller.start(&SyncSelection::default()).await.unwrap();
        let second = controller.start(&SyncSelection::default()).await;
        assert!(matches!(second, Err(SyncError::InvalidState(_))));
        assert_eq!(backend.start_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_rejected_while_idle() {
        let backend = MockBackend::new(Vec::new());
        let controller = JobController::new(backend.clone(), POLL);

        let result = controller.stop().await;
        assert!(matches!(result, Err(SyncError::InvalidState(_))));
        assert_eq!(backend.stop_calls(), 0);
    }
}
