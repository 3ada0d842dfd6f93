use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use services::{Clock, TimerService, TimerServiceError};
use storage::repository::{InMemoryRepository, SessionRepository, StorageError};
use study_core::model::{NewStudySession, OwnerId, SessionId, StudySession};
use study_core::time::fixed_now;
use study_core::timer::{PlanInput, TimerError, TimerPhase};
use tokio::sync::Notify;

/// Session store that can fail on demand, hold writes until released, or
/// take a while to write.
#[derive(Default)]
struct ControlledRepo {
    inner: InMemoryRepository,
    fail: AtomicBool,
    gate: Option<Arc<Notify>>,
    delay: Option<Duration>,
    writes: AtomicUsize,
}

impl ControlledRepo {
    fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }
}

#[async_trait]
impl SessionRepository for ControlledRepo {
    async fn create_session(&self, session: &NewStudySession) -> Result<SessionId, StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("database is locked".into()));
        }
        self.inner.create_session(session).await
    }

    async fn list_sessions(&self, owner: &OwnerId) -> Result<Vec<StudySession>, StorageError> {
        self.inner.list_sessions(owner).await
    }
}

async fn finished_timer(repo: Arc<ControlledRepo>) -> TimerService {
    let svc = TimerService::new(Clock::fixed(fixed_now()), repo)
        .with_tick_interval(Duration::from_millis(10));
    assert!(svc.select_plan(&PlanInput::new("Math", "1m")).await.unwrap());
    assert!(svc.start().await);
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(svc.snapshot().await.phase, TimerPhase::Finished);
    svc
}

#[tokio::test(start_paused = true)]
async fn finished_run_is_saved_once_and_timer_resets() {
    let repo = Arc::new(ControlledRepo::default());
    let svc = finished_timer(Arc::clone(&repo)).await;
    let owner = OwnerId::new("u1");
    let mut updates = svc.subscribe();

    let id = svc.save(owner.clone()).await.unwrap();

    let stored = repo.list_sessions(&owner).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, id);
    assert_eq!(stored[0].subject, "Math");
    assert_eq!(stored[0].minutes, 1);
    assert_eq!(stored[0].created_at, Some(fixed_now()));

    let snapshot = updates.borrow_and_update().clone();
    assert_eq!(snapshot.phase, TimerPhase::Idle);
    assert_eq!(snapshot.selected_subject, None);
    assert_eq!(snapshot.display, "00:00");

    assert!(matches!(
        svc.save(owner.clone()).await,
        Err(TimerServiceError::Timer(TimerError::NoSubject))
    ));
    assert_eq!(repo.writes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_save_is_rejected_while_write_is_pending() {
    let gate = Arc::new(Notify::new());
    let repo = Arc::new(ControlledRepo::gated(Arc::clone(&gate)));
    let svc = finished_timer(Arc::clone(&repo)).await;
    let owner = OwnerId::new("u1");

    let (first, second, ()) = tokio::join!(
        svc.save(owner.clone()),
        async {
            tokio::task::yield_now().await;
            svc.save(owner.clone()).await
        },
        async {
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            gate.notify_one();
        }
    );

    assert!(first.is_ok());
    assert!(matches!(
        second,
        Err(TimerServiceError::Timer(TimerError::SaveInProgress))
    ));
    assert_eq!(repo.writes.load(Ordering::SeqCst), 1);
    assert_eq!(repo.list_sessions(&owner).await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_write_keeps_the_run_for_retry() {
    let repo = Arc::new(ControlledRepo::default());
    repo.fail.store(true, Ordering::SeqCst);
    let svc = finished_timer(Arc::clone(&repo)).await;
    let owner = OwnerId::new("u1");

    let err = svc.save(owner.clone()).await.unwrap_err();
    assert!(matches!(err, TimerServiceError::Persistence(StorageError::Connection(_))));

    let snapshot = svc.snapshot().await;
    assert_eq!(snapshot.phase, TimerPhase::Finished);
    assert_eq!(snapshot.selected_subject.as_deref(), Some("Math"));

    repo.fail.store(false, Ordering::SeqCst);
    svc.save(owner.clone()).await.unwrap();
    assert_eq!(repo.writes.load(Ordering::SeqCst), 2);
    assert_eq!(repo.list_sessions(&owner).await.unwrap().len(), 1);
    assert_eq!(svc.snapshot().await.phase, TimerPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn abandoned_save_still_lands_exactly_once() {
    let repo = Arc::new(ControlledRepo::slow(Duration::from_secs(60)));
    let svc = finished_timer(Arc::clone(&repo)).await;
    let owner = OwnerId::new("u1");

    let gave_up = tokio::time::timeout(Duration::from_secs(1), svc.save(owner.clone())).await;
    assert!(gave_up.is_err());
    assert!(matches!(
        svc.save(owner.clone()).await,
        Err(TimerServiceError::Timer(TimerError::SaveInProgress))
    ));

    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(svc.snapshot().await.phase, TimerPhase::Idle);
    assert_eq!(repo.writes.load(Ordering::SeqCst), 1);
    assert_eq!(repo.list_sessions(&owner).await.unwrap().len(), 1);
    assert!(svc.select_plan(&PlanInput::new("Art", "2m")).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn abandoned_failing_save_can_be_retried() {
    let repo = Arc::new(ControlledRepo::slow(Duration::from_secs(60)));
    repo.fail.store(true, Ordering::SeqCst);
    let svc = finished_timer(Arc::clone(&repo)).await;
    let owner = OwnerId::new("u1");

    let gave_up = tokio::time::timeout(Duration::from_secs(1), svc.save(owner.clone())).await;
    assert!(gave_up.is_err());
    tokio::time::sleep(Duration::from_secs(60)).await;

    let snapshot = svc.snapshot().await;
    assert_eq!(snapshot.phase, TimerPhase::Finished);
    assert_eq!(snapshot.selected_subject.as_deref(), Some("Math"));

    repo.fail.store(false, Ordering::SeqCst);
    svc.save(owner.clone()).await.unwrap();
    assert_eq!(repo.writes.load(Ordering::SeqCst), 2);
    assert_eq!(repo.list_sessions(&owner).await.unwrap().len(), 1);
    assert_eq!(svc.snapshot().await.phase, TimerPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn selecting_a_plan_mid_run_is_ignored() {
    let svc = TimerService::new(
        Clock::fixed(fixed_now()),
        Arc::new(InMemoryRepository::new()),
    );
    svc.select_plan(&PlanInput::new("Math", "2m")).await.unwrap();
    svc.start().await;
    tokio::time::sleep(Duration::from_millis(5_500)).await;

    assert!(!svc.select_plan(&PlanInput::new("Art", "5m")).await.unwrap());
    svc.pause().await;
    assert!(!svc.select_plan(&PlanInput::new("Art", "5m")).await.unwrap());

    let snapshot = svc.snapshot().await;
    assert_eq!(snapshot.selected_subject.as_deref(), Some("Math"));
    assert_eq!(snapshot.total_seconds, 120);
    assert_eq!(snapshot.seconds_remaining, 115);
    assert_eq!(snapshot.display, "01:55");
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_every_tick() {
    let svc = TimerService::new(
        Clock::fixed(fixed_now()),
        Arc::new(InMemoryRepository::new()),
    );
    let mut updates = svc.subscribe();
    svc.select_plan(&PlanInput::new("Math", "1m")).await.unwrap();
    svc.start().await;

    let mut seen = Vec::new();
    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();
        seen.push(snapshot.seconds_remaining);
        if snapshot.phase == TimerPhase::Finished {
            break;
        }
    }

    assert_eq!(seen.last(), Some(&0));
    assert!(seen.windows(2).all(|w| w[0] >= w[1]));
}
