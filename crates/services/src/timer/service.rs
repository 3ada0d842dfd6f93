use std::sync::Arc;
use std::time::Duration;

use storage::repository::SessionRepository;
use study_core::model::{NewStudySession, OwnerId, SessionId};
use study_core::timer::{PlanInput, SessionTimer, TimerSnapshot};
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use super::Ticker;
use crate::Clock;
use crate::error::TimerServiceError;

/// Drives a `SessionTimer` in real time and persists finished runs.
///
/// The timer state lives behind one async mutex shared with the ticker task.
/// Controls hold the ticker slot across each phase change, so the armed ticker
/// always matches the phase. Every state change is published on a watch
/// channel for presentation.
pub struct TimerService {
    clock: Clock,
    sessions: Arc<dyn SessionRepository>,
    state: Arc<Mutex<SessionTimer>>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    tick_interval: Duration,
    updates: Arc<watch::Sender<TimerSnapshot>>,
}

impl TimerService {
    #[must_use]
    pub fn new(clock: Clock, sessions: Arc<dyn SessionRepository>) -> Self {
        let timer = SessionTimer::new();
        let (updates, _) = watch::channel(timer.snapshot());
        Self {
            clock,
            sessions,
            state: Arc::new(Mutex::new(timer)),
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
            updates: Arc::new(updates),
        }
    }

    /// Override the wall-clock length of one timer second.
    #[must_use]
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Receive a fresh snapshot after every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.updates.subscribe()
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Load a plan into the timer.
    ///
    /// Returns `Ok(false)` if a countdown is running, paused, or being saved.
    ///
    /// # Errors
    ///
    /// Returns `TimerServiceError::Timer` if the plan time is not a positive
    /// duration.
    pub async fn select_plan(&self, plan: &PlanInput) -> Result<bool, TimerServiceError> {
        let mut timer = self.state.lock().await;
        let selected = timer.select_plan(plan)?;
        if selected {
            info!(subject = %plan.subject.trim(), total_seconds = timer.total_seconds(), "plan selected");
            self.publish(&timer);
        } else {
            warn!(subject = %plan.subject, "plan selection ignored while a run is in progress");
        }
        Ok(selected)
    }

    /// Start the countdown and arm the ticker.
    pub async fn start(&self) -> bool {
        let mut slot = self.ticker.lock().await;
        let mut timer = self.state.lock().await;
        if !timer.start() {
            return false;
        }
        self.publish(&timer);
        drop(timer);
        self.arm(&mut slot);
        true
    }

    /// Pause the countdown and cancel the ticker.
    pub async fn pause(&self) -> bool {
        let mut slot = self.ticker.lock().await;
        let mut timer = self.state.lock().await;
        if !timer.pause() {
            return false;
        }
        self.publish(&timer);
        slot.take();
        true
    }

    /// Resume a paused countdown and re-arm the ticker.
    pub async fn resume(&self) -> bool {
        let mut slot = self.ticker.lock().await;
        let mut timer = self.state.lock().await;
        if !timer.resume() {
            return false;
        }
        self.publish(&timer);
        drop(timer);
        self.arm(&mut slot);
        true
    }

    /// True while a tick loop is alive for this timer.
    pub async fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .is_some_and(|ticker| !ticker.is_finished())
    }

    /// Persist the finished run as one study session and reset the timer.
    ///
    /// Exactly one write is issued per finished run: concurrent or repeated
    /// calls fail with `SaveInProgress` while the write is outstanding, and a
    /// completed save leaves the timer idle with no plan.
    ///
    /// The write runs on its own task. If the caller stops waiting, the write
    /// still settles the timer: idle on success, finished and retryable on
    /// failure.
    ///
    /// # Errors
    ///
    /// - `TimerServiceError::Timer` when nothing is ready to save.
    /// - `TimerServiceError::Persistence` when the write fails; the timer stays
    ///   finished so the caller can retry.
    /// - `TimerServiceError::Interrupted` when the write task dies; the timer
    ///   stays finished.
    pub async fn save(&self, owner_id: OwnerId) -> Result<SessionId, TimerServiceError> {
        let request = self.state.lock().await.begin_save(owner_id)?;

        let session = match NewStudySession::new(
            request.owner_id,
            &request.subject,
            request.minutes,
            self.clock.now(),
        ) {
            Ok(session) => session,
            Err(err) => {
                self.state.lock().await.abort_save();
                return Err(err.into());
            }
        };

        let write = tokio::spawn(persist(
            session,
            Arc::clone(&self.sessions),
            Arc::clone(&self.state),
            Arc::clone(&self.ticker),
            Arc::clone(&self.updates),
        ));
        match write.await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.state.lock().await.abort_save();
                warn!(error = %err, "session write task did not complete");
                Err(TimerServiceError::Interrupted(err))
            }
        }
    }

    fn publish(&self, timer: &SessionTimer) {
        self.updates.send_replace(timer.snapshot());
    }

    fn arm(&self, slot: &mut Option<Ticker>) {
        // Drop the old guard first so two loops never tick the same timer.
        slot.take();
        *slot = Some(Ticker::arm(
            Arc::clone(&self.state),
            self.tick_interval,
            Arc::clone(&self.updates),
        ));
    }
}

/// Write one session and settle the pending save on the shared timer.
///
/// Locks the ticker slot before the timer state, like the controls do.
async fn persist(
    session: NewStudySession,
    sessions: Arc<dyn SessionRepository>,
    state: Arc<Mutex<SessionTimer>>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    updates: Arc<watch::Sender<TimerSnapshot>>,
) -> Result<SessionId, TimerServiceError> {
    match sessions.create_session(&session).await {
        Ok(id) => {
            let mut slot = ticker.lock().await;
            let mut timer = state.lock().await;
            timer.complete_save();
            updates.send_replace(timer.snapshot());
            slot.take();
            info!(session_id = %id, subject = %session.subject(), minutes = session.minutes(), "study session saved");
            Ok(id)
        }
        Err(err) => {
            state.lock().await.abort_save();
            warn!(error = %err, subject = %session.subject(), "saving study session failed");
            Err(TimerServiceError::Persistence(err))
        }
    }
}
