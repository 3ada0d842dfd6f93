use study_core::model::{Goal, OwnerId};

use super::SqliteRepository;
use super::mapping::{conn, map_goal_row, timestamp_to_text};
use crate::repository::{GoalRepository, StorageError};

#[async_trait::async_trait]
impl GoalRepository for SqliteRepository {
    async fn get_goal(&self, owner: &OwnerId) -> Result<Option<Goal>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT owner_id, daily_minutes, weekly_minutes, monthly_minutes, updated_at
            FROM goals WHERE owner_id = ?1
            ",
        )
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_goal_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn upsert_goal(&self, goal: &Goal) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO goals (owner_id, daily_minutes, weekly_minutes, monthly_minutes, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(owner_id) DO UPDATE SET
                daily_minutes = excluded.daily_minutes,
                weekly_minutes = excluded.weekly_minutes,
                monthly_minutes = excluded.monthly_minutes,
                updated_at = excluded.updated_at
            ",
        )
        .bind(goal.owner_id.as_str())
        .bind(i64::from(goal.daily_minutes))
        .bind(i64::from(goal.weekly_minutes))
        .bind(i64::from(goal.monthly_minutes))
        .bind(timestamp_to_text(goal.updated_at))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
