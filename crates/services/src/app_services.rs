use std::sync::Arc;
use std::time::Duration;

use storage::repository::Storage;

use crate::Clock;
use crate::dashboard::DashboardService;
use crate::error::AppServicesError;
use crate::essay_service::EssayService;
use crate::goal_service::GoalService;
use crate::plan_service::PlanService;
use crate::session_log::SessionLogService;
use crate::timer::TimerService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    timer: Arc<TimerService>,
    dashboard: Arc<DashboardService>,
    goals: Arc<GoalService>,
    plans: Arc<PlanService>,
    session_log: Arc<SessionLogService>,
    essays: Arc<EssayService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        tick_interval: Duration,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, tick_interval))
    }

    #[must_use]
    pub fn in_memory(clock: Clock, tick_interval: Duration) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, tick_interval)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, tick_interval: Duration) -> Self {
        let timer = Arc::new(
            TimerService::new(clock, Arc::clone(&storage.sessions))
                .with_tick_interval(tick_interval),
        );
        let dashboard = Arc::new(DashboardService::new(
            clock,
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.goals),
        ));
        let goals = Arc::new(GoalService::new(clock, Arc::clone(&storage.goals)));
        let plans = Arc::new(PlanService::new(clock, Arc::clone(&storage.plans)));
        let session_log = Arc::new(SessionLogService::new(clock, Arc::clone(&storage.sessions)));
        let essays = Arc::new(EssayService::new(clock, Arc::clone(&storage.essays)));

        Self {
            timer,
            dashboard,
            goals,
            plans,
            session_log,
            essays,
        }
    }

    #[must_use]
    pub fn timer(&self) -> Arc<TimerService> {
        Arc::clone(&self.timer)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }

    #[must_use]
    pub fn goals(&self) -> Arc<GoalService> {
        Arc::clone(&self.goals)
    }

    #[must_use]
    pub fn plans(&self) -> Arc<PlanService> {
        Arc::clone(&self.plans)
    }

    #[must_use]
    pub fn session_log(&self) -> Arc<SessionLogService> {
        Arc::clone(&self.session_log)
    }

    #[must_use]
    pub fn essays(&self) -> Arc<EssayService> {
        Arc::clone(&self.essays)
    }
}
