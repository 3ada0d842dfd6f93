use std::sync::Arc;

use chrono::{Local, TimeZone};
use storage::repository::{GoalRepository, SessionRepository};
use study_core::model::OwnerId;
use study_core::progress::AggregateView;
use tracing::debug;

use crate::Clock;
use crate::error::DashboardError;

/// Loads an owner's sessions and goal and folds them into the dashboard view.
#[derive(Clone)]
pub struct DashboardService {
    clock: Clock,
    sessions: Arc<dyn SessionRepository>,
    goals: Arc<dyn GoalRepository>,
}

impl DashboardService {
    #[must_use]
    pub fn new(
        clock: Clock,
        sessions: Arc<dyn SessionRepository>,
        goals: Arc<dyn GoalRepository>,
    ) -> Self {
        Self {
            clock,
            sessions,
            goals,
        }
    }

    /// Build the view in the machine's local time zone.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Storage` if sessions or the goal cannot be read.
    pub async fn build_view(&self, owner: &OwnerId) -> Result<AggregateView, DashboardError> {
        self.build_view_in(owner, &Local).await
    }

    /// Build the view with day boundaries taken in `tz`.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Storage` if sessions or the goal cannot be read.
    pub async fn build_view_in<Tz: TimeZone>(
        &self,
        owner: &OwnerId,
        tz: &Tz,
    ) -> Result<AggregateView, DashboardError> {
        let sessions = self.sessions.list_sessions(owner).await?;
        let goal = self.goals.get_goal(owner).await?;
        debug!(owner = %owner, sessions = sessions.len(), has_goal = goal.is_some(), "building dashboard");

        let now = self.clock.now_in(tz);
        Ok(AggregateView::build(&sessions, goal.as_ref(), &now))
    }
}
