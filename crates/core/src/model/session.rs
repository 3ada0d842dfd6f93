use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{OwnerId, SessionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudySessionError {
    #[error("session subject cannot be empty")]
    EmptySubject,
}

/// A study session as stored by the persistence collaborator.
///
/// Sessions are append-only. `created_at` is `None` for legacy rows whose
/// timestamp is missing or unreadable; those rows never count towards a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: SessionId,
    pub owner_id: OwnerId,
    pub subject: String,
    pub minutes: u32,
    pub created_at: Option<DateTime<Utc>>,
}

/// Creation request for a study session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudySession {
    owner_id: OwnerId,
    subject: String,
    minutes: u32,
    created_at: DateTime<Utc>,
}

impl NewStudySession {
    /// Build a creation request, trimming the subject.
    ///
    /// # Errors
    ///
    /// Returns `StudySessionError::EmptySubject` if the subject is blank.
    pub fn new(
        owner_id: OwnerId,
        subject: impl AsRef<str>,
        minutes: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, StudySessionError> {
        let subject = subject.as_ref().trim();
        if subject.is_empty() {
            return Err(StudySessionError::EmptySubject);
        }
        Ok(Self {
            owner_id,
            subject: subject.to_owned(),
            minutes,
            created_at,
        })
    }

    #[must_use]
    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Materialize the stored record once the store has assigned an id.
    #[must_use]
    pub fn into_session(self, id: SessionId) -> StudySession {
        StudySession {
            id,
            owner_id: self.owner_id,
            subject: self.subject,
            minutes: self.minutes,
            created_at: Some(self.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn trims_subject_and_rejects_blank() {
        let owner = OwnerId::new("u1");
        let new = NewStudySession::new(owner.clone(), "  Math ", 30, fixed_now()).unwrap();
        assert_eq!(new.subject(), "Math");

        let err = NewStudySession::new(owner, "   ", 30, fixed_now()).unwrap_err();
        assert_eq!(err, StudySessionError::EmptySubject);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let session = NewStudySession::new(OwnerId::new("u1"), "Math", 45, fixed_now())
            .unwrap()
            .into_session(SessionId::generate());
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["ownerId"], "u1");
        assert_eq!(json["minutes"], 45);
        assert!(json["createdAt"].is_string());
    }
}
