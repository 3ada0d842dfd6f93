use chrono::NaiveDate;
use study_core::model::{NewStudyPlan, OwnerId, PlanId, StudyPlan};

use super::SqliteRepository;
use super::mapping::{conn, day_to_text, map_plan_row, timestamp_to_text};
use crate::repository::{PlanRepository, StorageError};

#[async_trait::async_trait]
impl PlanRepository for SqliteRepository {
    async fn create_plan(&self, plan: &NewStudyPlan) -> Result<PlanId, StorageError> {
        let id = PlanId::generate();
        sqlx::query(
            r"
            INSERT INTO plans (id, owner_id, day, subject, time, category, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(id.value().to_string())
        .bind(plan.owner_id().as_str())
        .bind(day_to_text(plan.day()))
        .bind(plan.subject())
        .bind(plan.time())
        .bind(plan.category().as_str())
        .bind(timestamp_to_text(plan.created_at()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(id)
    }

    async fn list_plans(&self, owner: &OwnerId) -> Result<Vec<StudyPlan>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, owner_id, day, subject, time, category, created_at
            FROM plans
            WHERE owner_id = ?1
            ORDER BY created_at DESC, rowid DESC
            ",
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut plans = Vec::with_capacity(rows.len());
        for row in rows {
            plans.push(map_plan_row(&row)?);
        }
        Ok(plans)
    }

    async fn get_plan(&self, id: PlanId) -> Result<Option<StudyPlan>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, owner_id, day, subject, time, category, created_at
            FROM plans WHERE id = ?1
            ",
        )
        .bind(id.value().to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_plan_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn move_plan(&self, id: PlanId, day: NaiveDate) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE plans SET day = ?1 WHERE id = ?2")
            .bind(day_to_text(day))
            .bind(id.value().to_string())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_plan(&self, id: PlanId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM plans WHERE id = ?1")
            .bind(id.value().to_string())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
