use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use study_core::model::{
    Essay, EssayId, Goal, NewEssay, NewStudyPlan, NewStudySession, OwnerId, PlanId, SessionId,
    StudyPlan, StudySession,
};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for study sessions.
///
/// Sessions are append-only: there is no update or delete.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Append a session and return the id assigned by the store.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn create_session(&self, session: &NewStudySession) -> Result<SessionId, StorageError>;

    /// List an owner's sessions, most recent first.
    ///
    /// Sessions without a usable timestamp come last.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_sessions(&self, owner: &OwnerId) -> Result<Vec<StudySession>, StorageError>;
}

/// Repository contract for the per-owner goal.
#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// Fetch the owner's goal, if one was ever saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn get_goal(&self, owner: &OwnerId) -> Result<Option<Goal>, StorageError>;

    /// Replace the owner's goal wholesale.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the goal cannot be stored.
    async fn upsert_goal(&self, goal: &Goal) -> Result<(), StorageError>;
}

/// Repository contract for calendar plans.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the plan cannot be stored.
    async fn create_plan(&self, plan: &NewStudyPlan) -> Result<PlanId, StorageError>;

    /// List an owner's plans, most recently created first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_plans(&self, owner: &OwnerId) -> Result<Vec<StudyPlan>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn get_plan(&self, id: PlanId) -> Result<Option<StudyPlan>, StorageError>;

    /// Move a plan to another day.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the plan does not exist.
    async fn move_plan(&self, id: PlanId, day: NaiveDate) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the plan does not exist.
    async fn delete_plan(&self, id: PlanId) -> Result<(), StorageError>;
}

/// Repository contract for essay practice. Essays are append-only.
#[async_trait]
pub trait EssayRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the essay cannot be stored.
    async fn create_essay(&self, essay: &NewEssay) -> Result<EssayId, StorageError>;

    /// List an owner's essays, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_essays(&self, owner: &OwnerId) -> Result<Vec<Essay>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    sessions: Arc<Mutex<Vec<StudySession>>>,
    goals: Arc<Mutex<HashMap<OwnerId, Goal>>>,
    plans: Arc<Mutex<Vec<StudyPlan>>>,
    essays: Arc<Mutex<Vec<Essay>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert already-materialized session records as-is, e.g. legacy imports
    /// whose timestamp was lost.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store lock is poisoned.
    pub fn import_sessions(
        &self,
        sessions: impl IntoIterator<Item = StudySession>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.extend(sessions);
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn create_session(&self, session: &NewStudySession) -> Result<SessionId, StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = SessionId::generate();
        guard.push(session.clone().into_session(id));
        Ok(id)
    }

    async fn list_sessions(&self, owner: &OwnerId) -> Result<Vec<StudySession>, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<StudySession> = guard
            .iter()
            .rev()
            .filter(|s| &s.owner_id == owner)
            .cloned()
            .collect();
        // `None < Some(_)`, so undated sessions sink to the end.
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

#[async_trait]
impl GoalRepository for InMemoryRepository {
    async fn get_goal(&self, owner: &OwnerId) -> Result<Option<Goal>, StorageError> {
        let guard = self
            .goals
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(owner).cloned())
    }

    async fn upsert_goal(&self, goal: &Goal) -> Result<(), StorageError> {
        let mut guard = self
            .goals
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(goal.owner_id.clone(), goal.clone());
        Ok(())
    }
}

#[async_trait]
impl PlanRepository for InMemoryRepository {
    async fn create_plan(&self, plan: &NewStudyPlan) -> Result<PlanId, StorageError> {
        let mut guard = self
            .plans
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = PlanId::generate();
        guard.push(plan.clone().into_plan(id));
        Ok(id)
    }

    async fn list_plans(&self, owner: &OwnerId) -> Result<Vec<StudyPlan>, StorageError> {
        let guard = self
            .plans
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<StudyPlan> = guard
            .iter()
            .rev()
            .filter(|p| &p.owner_id == owner)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn get_plan(&self, id: PlanId) -> Result<Option<StudyPlan>, StorageError> {
        let guard = self
            .plans
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.iter().find(|p| p.id == id).cloned())
    }

    async fn move_plan(&self, id: PlanId, day: NaiveDate) -> Result<(), StorageError> {
        let mut guard = self
            .plans
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let plan = guard
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StorageError::NotFound)?;
        plan.day = day;
        Ok(())
    }

    async fn delete_plan(&self, id: PlanId) -> Result<(), StorageError> {
        let mut guard = self
            .plans
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let before = guard.len();
        guard.retain(|p| p.id != id);
        if guard.len() == before {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl EssayRepository for InMemoryRepository {
    async fn create_essay(&self, essay: &NewEssay) -> Result<EssayId, StorageError> {
        let mut guard = self
            .essays
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = EssayId::generate();
        guard.push(essay.clone().into_essay(id));
        Ok(id)
    }

    async fn list_essays(&self, owner: &OwnerId) -> Result<Vec<Essay>, StorageError> {
        let guard = self
            .essays
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<Essay> = guard
            .iter()
            .rev()
            .filter(|e| &e.owner_id == owner)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
    pub goals: Arc<dyn GoalRepository>,
    pub plans: Arc<dyn PlanRepository>,
    pub essays: Arc<dyn EssayRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let sessions: Arc<dyn SessionRepository> = Arc::new(repo.clone());
        let goals: Arc<dyn GoalRepository> = Arc::new(repo.clone());
        let plans: Arc<dyn PlanRepository> = Arc::new(repo.clone());
        let essays: Arc<dyn EssayRepository> = Arc::new(repo);
        Self {
            sessions,
            goals,
            plans,
            essays,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use study_core::model::PlanCategory;
    use study_core::time::fixed_now;

    fn new_session(owner: &str, subject: &str, minutes: u32, offset_min: i64) -> NewStudySession {
        NewStudySession::new(
            OwnerId::new(owner),
            subject,
            minutes,
            fixed_now() + Duration::minutes(offset_min),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn lists_sessions_newest_first_per_owner() {
        let repo = InMemoryRepository::new();
        repo.create_session(&new_session("u1", "Math", 30, 0)).await.unwrap();
        repo.create_session(&new_session("u1", "Art", 45, 10)).await.unwrap();
        repo.create_session(&new_session("u2", "Bio", 15, 5)).await.unwrap();
        repo.import_sessions([StudySession {
            id: SessionId::generate(),
            owner_id: OwnerId::new("u1"),
            subject: "Legacy".into(),
            minutes: 20,
            created_at: None,
        }])
        .unwrap();

        let listed = repo.list_sessions(&OwnerId::new("u1")).await.unwrap();
        let subjects: Vec<_> = listed.iter().map(|s| s.subject.as_str()).collect();
        assert_eq!(subjects, ["Art", "Math", "Legacy"]);
    }

    #[tokio::test]
    async fn goal_upsert_overwrites() {
        let repo = InMemoryRepository::new();
        let owner = OwnerId::new("u1");
        assert!(repo.get_goal(&owner).await.unwrap().is_none());

        repo.upsert_goal(&Goal::new(owner.clone(), 60, 300, 1200, fixed_now()))
            .await
            .unwrap();
        repo.upsert_goal(&Goal::new(owner.clone(), 90, 400, 1600, fixed_now()))
            .await
            .unwrap();

        let goal = repo.get_goal(&owner).await.unwrap().unwrap();
        assert_eq!(goal.daily_minutes, 90);
        assert_eq!(goal.monthly_minutes, 1600);
    }

    #[tokio::test]
    async fn plans_move_and_delete() {
        let repo = InMemoryRepository::new();
        let owner = OwnerId::new("u1");
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let plan = NewStudyPlan::new(owner.clone(), day, "Math", "1h", PlanCategory::Study, fixed_now())
            .unwrap();
        let id = repo.create_plan(&plan).await.unwrap();

        let moved_to = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        repo.move_plan(id, moved_to).await.unwrap();
        assert_eq!(repo.get_plan(id).await.unwrap().unwrap().day, moved_to);

        repo.delete_plan(id).await.unwrap();
        assert!(repo.list_plans(&owner).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete_plan(id).await,
            Err(StorageError::NotFound)
        ));
        assert!(matches!(
            repo.move_plan(id, day).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn essays_list_newest_first_per_owner() {
        let repo = InMemoryRepository::new();
        let essay = |owner: &str, theme: &str, offset_min: i64| {
            NewEssay::new(
                OwnerId::new(owner),
                theme,
                "Texto da redação.",
                fixed_now() + Duration::minutes(offset_min),
            )
            .unwrap()
        };
        repo.create_essay(&essay("u1", "Inclusão digital", 0)).await.unwrap();
        repo.create_essay(&essay("u1", "Desigualdade social", 30)).await.unwrap();
        repo.create_essay(&essay("u2", "Fake news e democracia", 10)).await.unwrap();

        let listed = repo.list_essays(&OwnerId::new("u1")).await.unwrap();
        let themes: Vec<_> = listed.iter().map(|e| e.theme.as_str()).collect();
        assert_eq!(themes, ["Desigualdade social", "Inclusão digital"]);
    }
}
