use std::sync::Arc;

use storage::repository::GoalRepository;
use study_core::model::{Goal, GoalHours, OwnerId};
use tracing::info;

use crate::Clock;
use crate::error::GoalServiceError;

/// Reads and writes the per-owner study goal.
#[derive(Clone)]
pub struct GoalService {
    clock: Clock,
    goals: Arc<dyn GoalRepository>,
}

impl GoalService {
    #[must_use]
    pub fn new(clock: Clock, goals: Arc<dyn GoalRepository>) -> Self {
        Self { clock, goals }
    }

    /// Validate hour inputs and replace the owner's goal.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::Goal` if any field is missing, not a number,
    /// or not positive. Returns `GoalServiceError::Storage` if the write fails.
    pub async fn save_hours(
        &self,
        owner: OwnerId,
        daily: &str,
        weekly: &str,
        monthly: &str,
    ) -> Result<Goal, GoalServiceError> {
        let goal = Goal::from_hours_input(owner, daily, weekly, monthly, self.clock.now())?;
        self.goals.upsert_goal(&goal).await?;
        info!(
            owner = %goal.owner_id,
            daily_minutes = goal.daily_minutes,
            weekly_minutes = goal.weekly_minutes,
            monthly_minutes = goal.monthly_minutes,
            "goal saved"
        );
        Ok(goal)
    }

    /// # Errors
    ///
    /// Returns `GoalServiceError::Storage` if the read fails.
    pub async fn load(&self, owner: &OwnerId) -> Result<Option<Goal>, GoalServiceError> {
        Ok(self.goals.get_goal(owner).await?)
    }

    /// The stored goal rendered back as hour strings for the form.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::Storage` if the read fails.
    pub async fn load_hours(&self, owner: &OwnerId) -> Result<Option<GoalHours>, GoalServiceError> {
        let goal = self.goals.get_goal(owner).await?;
        Ok(goal.as_ref().map(Goal::as_hours_input))
    }
}
