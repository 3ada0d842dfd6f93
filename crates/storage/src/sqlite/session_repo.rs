use study_core::model::{NewStudySession, OwnerId, SessionId, StudySession};

use super::SqliteRepository;
use super::mapping::{conn, map_session_row, timestamp_to_text};
use crate::repository::{SessionRepository, StorageError};

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn create_session(&self, session: &NewStudySession) -> Result<SessionId, StorageError> {
        let id = SessionId::generate();
        sqlx::query(
            r"
            INSERT INTO study_sessions (id, owner_id, subject, minutes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(id.value().to_string())
        .bind(session.owner_id().as_str())
        .bind(session.subject())
        .bind(i64::from(session.minutes()))
        .bind(timestamp_to_text(session.created_at()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(id)
    }

    async fn list_sessions(&self, owner: &OwnerId) -> Result<Vec<StudySession>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, owner_id, subject, minutes, created_at
            FROM study_sessions
            WHERE owner_id = ?1
            ORDER BY created_at DESC, rowid DESC
            ",
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in rows {
            sessions.push(map_session_row(&row)?);
        }
        // Text that failed to parse still sorted as a value; put it with the undated rows.
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }
}
