use study_core::model::{Essay, EssayId, NewEssay, OwnerId};

use super::SqliteRepository;
use super::mapping::{conn, map_essay_row, timestamp_to_text};
use crate::repository::{EssayRepository, StorageError};

#[async_trait::async_trait]
impl EssayRepository for SqliteRepository {
    async fn create_essay(&self, essay: &NewEssay) -> Result<EssayId, StorageError> {
        let id = EssayId::generate();
        sqlx::query(
            r"
            INSERT INTO essays (id, owner_id, theme, body, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(id.value().to_string())
        .bind(essay.owner_id().as_str())
        .bind(essay.theme())
        .bind(essay.text())
        .bind(timestamp_to_text(essay.created_at()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(id)
    }

    async fn list_essays(&self, owner: &OwnerId) -> Result<Vec<Essay>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, owner_id, theme, body, created_at
            FROM essays
            WHERE owner_id = ?1
            ORDER BY created_at DESC, rowid DESC
            ",
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_essay_row).collect()
    }
}
