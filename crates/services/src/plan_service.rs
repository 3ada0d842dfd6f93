use std::sync::Arc;

use chrono::{Local, NaiveDate};
use storage::repository::PlanRepository;
use study_core::model::{BoardDay, NewStudyPlan, OwnerId, PlanCategory, PlanId, StudyPlan, plan};
use tracing::info;

use crate::Clock;
use crate::error::PlanServiceError;

/// Calendar plans: the study blocks the timer picks from.
#[derive(Clone)]
pub struct PlanService {
    clock: Clock,
    plans: Arc<dyn PlanRepository>,
}

impl PlanService {
    #[must_use]
    pub fn new(clock: Clock, plans: Arc<dyn PlanRepository>) -> Self {
        Self { clock, plans }
    }

    /// Add a plan. Without an explicit day it lands on today's local date.
    ///
    /// # Errors
    ///
    /// Returns `PlanServiceError::Plan` if subject or time is blank.
    /// Returns `PlanServiceError::Storage` if persistence fails.
    pub async fn add(
        &self,
        owner: OwnerId,
        day: Option<NaiveDate>,
        subject: &str,
        time: &str,
        category: PlanCategory,
    ) -> Result<PlanId, PlanServiceError> {
        let now = self.clock.now();
        let day = day.unwrap_or_else(|| self.clock.now_in(&Local).date_naive());
        let plan = NewStudyPlan::new(owner, day, subject, time, category, now)?;
        let id = self.plans.create_plan(&plan).await?;
        info!(plan_id = %id, day = %day, subject = plan.subject(), category = category.as_str(), "plan added");
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `PlanServiceError::Storage` if repository access fails.
    pub async fn list(&self, owner: &OwnerId) -> Result<Vec<StudyPlan>, PlanServiceError> {
        Ok(self.plans.list_plans(owner).await?)
    }

    /// Fetch a plan by id.
    ///
    /// Returns `Ok(None)` when the plan does not exist.
    ///
    /// # Errors
    ///
    /// Returns `PlanServiceError::Storage` if repository access fails.
    pub async fn get(&self, id: PlanId) -> Result<Option<StudyPlan>, PlanServiceError> {
        Ok(self.plans.get_plan(id).await?)
    }

    /// # Errors
    ///
    /// Returns `PlanServiceError::Storage` with `StorageError::NotFound` if the
    /// plan does not exist.
    pub async fn move_to(&self, id: PlanId, day: NaiveDate) -> Result<(), PlanServiceError> {
        self.plans.move_plan(id, day).await?;
        info!(plan_id = %id, day = %day, "plan moved");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `PlanServiceError::Storage` with `StorageError::NotFound` if the
    /// plan does not exist.
    pub async fn delete(&self, id: PlanId) -> Result<(), PlanServiceError> {
        self.plans.delete_plan(id).await?;
        info!(plan_id = %id, "plan deleted");
        Ok(())
    }

    /// The owner's plans laid out over every day of a month.
    ///
    /// # Errors
    ///
    /// Returns `PlanServiceError::Plan` for a month that does not exist and
    /// `PlanServiceError::Storage` if repository access fails.
    pub async fn month_board(
        &self,
        owner: &OwnerId,
        year: i32,
        month: u32,
    ) -> Result<Vec<BoardDay>, PlanServiceError> {
        let mut plans = self.plans.list_plans(owner).await?;
        // oldest first within a day
        plans.reverse();
        Ok(plan::month_board(year, month, &plans)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use storage::repository::{InMemoryRepository, StorageError};
    use study_core::model::PlanError;
    use study_core::time::fixed_now;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn add_defaults_to_today() {
        let clock = Clock::fixed(fixed_now());
        let svc = PlanService::new(clock, Arc::new(InMemoryRepository::new()));
        let owner = OwnerId::new("u1");

        let id = svc
            .add(owner.clone(), None, "Math", "1h", PlanCategory::Study)
            .await
            .unwrap();
        let plan = svc.get(id).await.unwrap().unwrap();
        assert_eq!(plan.day, clock.now_in(&Local).date_naive());
        assert_eq!(plan.created_at, fixed_now());
    }

    #[tokio::test]
    async fn add_rejects_blank_fields() {
        let svc = PlanService::new(Clock::fixed(fixed_now()), Arc::new(InMemoryRepository::new()));
        let owner = OwnerId::new("u1");

        let err = svc
            .add(owner.clone(), None, "  ", "1h", PlanCategory::Study)
            .await
            .unwrap_err();
        assert!(matches!(err, PlanServiceError::Plan(PlanError::EmptySubject)));

        let err = svc
            .add(owner.clone(), None, "Math", "", PlanCategory::Study)
            .await
            .unwrap_err();
        assert!(matches!(err, PlanServiceError::Plan(PlanError::EmptyTime)));
        assert!(svc.list(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn month_board_places_plans_in_creation_order() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut clock = Clock::fixed(fixed_now());
        let owner = OwnerId::new("u1");

        let first = PlanService::new(clock, repo.clone())
            .add(owner.clone(), Some(date(2024, 2, 10)), "Math", "1h", PlanCategory::Study)
            .await
            .unwrap();
        clock.advance(Duration::minutes(5));
        let svc = PlanService::new(clock, repo);
        let second = svc
            .add(owner.clone(), Some(date(2024, 2, 10)), "Lunch", "45m", PlanCategory::Food)
            .await
            .unwrap();
        svc.add(owner.clone(), Some(date(2024, 3, 1)), "Essay", "50m", PlanCategory::Essay)
            .await
            .unwrap();

        let board = svc.month_board(&owner, 2024, 2).await.unwrap();
        assert_eq!(board.len(), 29);
        let tenth = &board[9];
        assert_eq!(tenth.day, date(2024, 2, 10));
        let ids: Vec<_> = tenth.plans.iter().map(|p| p.id).collect();
        assert_eq!(ids, [first, second]);
        assert!(board.iter().filter(|d| d.day != date(2024, 2, 10)).all(|d| d.plans.is_empty()));

        assert!(matches!(
            svc.month_board(&owner, 2024, 13).await,
            Err(PlanServiceError::Plan(PlanError::InvalidMonth { .. }))
        ));
    }

    #[tokio::test]
    async fn move_and_delete_report_missing_plans() {
        let svc = PlanService::new(Clock::fixed(fixed_now()), Arc::new(InMemoryRepository::new()));
        let owner = OwnerId::new("u1");
        let id = svc
            .add(owner.clone(), Some(date(2024, 2, 10)), "Math", "1h", PlanCategory::Study)
            .await
            .unwrap();

        svc.move_to(id, date(2024, 2, 12)).await.unwrap();
        assert_eq!(svc.get(id).await.unwrap().unwrap().day, date(2024, 2, 12));

        svc.delete(id).await.unwrap();
        assert!(matches!(
            svc.delete(id).await,
            Err(PlanServiceError::Storage(StorageError::NotFound))
        ));
        assert!(matches!(
            svc.move_to(id, date(2024, 2, 13)).await,
            Err(PlanServiceError::Storage(StorageError::NotFound))
        ));
    }
}
