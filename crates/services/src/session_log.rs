use std::sync::Arc;

use chrono::{Local, TimeZone};
use storage::repository::SessionRepository;
use study_core::history::{HistoryView, group_by_day};
use study_core::model::{NewStudySession, OwnerId, SessionId};
use tracing::info;

use crate::Clock;
use crate::error::SessionLogError;

/// Manual session entry and the per-day history listing.
#[derive(Clone)]
pub struct SessionLogService {
    clock: Clock,
    sessions: Arc<dyn SessionRepository>,
}

impl SessionLogService {
    #[must_use]
    pub fn new(clock: Clock, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { clock, sessions }
    }

    /// Record a session that was not timed, stamped with the current time.
    ///
    /// # Errors
    ///
    /// - `SessionLogError::ZeroMinutes` when `minutes` is 0.
    /// - `SessionLogError::Session` when the subject is blank.
    /// - `SessionLogError::Storage` if persistence fails.
    pub async fn log(
        &self,
        owner: OwnerId,
        subject: &str,
        minutes: u32,
    ) -> Result<SessionId, SessionLogError> {
        if minutes == 0 {
            return Err(SessionLogError::ZeroMinutes);
        }
        let session = NewStudySession::new(owner, subject, minutes, self.clock.now())?;
        let id = self.sessions.create_session(&session).await?;
        info!(session_id = %id, subject = session.subject(), minutes, "session logged");
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `SessionLogError::Storage` if the sessions cannot be read.
    pub async fn history(&self, owner: &OwnerId) -> Result<HistoryView, SessionLogError> {
        self.history_in(owner, &Local).await
    }

    /// History with day boundaries taken in `tz`.
    ///
    /// # Errors
    ///
    /// Returns `SessionLogError::Storage` if the sessions cannot be read.
    pub async fn history_in<Tz: TimeZone>(
        &self,
        owner: &OwnerId,
        tz: &Tz,
    ) -> Result<HistoryView, SessionLogError> {
        let sessions = self.sessions.list_sessions(owner).await?;
        Ok(group_by_day(&sessions, tz))
    }
}
