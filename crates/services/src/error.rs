//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use study_core::model::{EssayError, GoalError, PlanError, StudySessionError};
use study_core::timer::TimerError;

/// Errors emitted by `TimerService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TimerServiceError {
    #[error(transparent)]
    Timer(#[from] TimerError),
    #[error(transparent)]
    Session(#[from] StudySessionError),
    /// The session could not be written; the timer stays finished so the save
    /// can be retried.
    #[error("failed to persist study session: {0}")]
    Persistence(#[from] StorageError),
    #[error("session write was interrupted: {0}")]
    Interrupted(#[from] tokio::task::JoinError),
}

/// Errors emitted by `GoalService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GoalServiceError {
    #[error(transparent)]
    Goal(#[from] GoalError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `PlanService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlanServiceError {
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SessionLogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionLogError {
    #[error("logged minutes must be greater than zero")]
    ZeroMinutes,
    #[error(transparent)]
    Session(#[from] StudySessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `EssayService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EssayServiceError {
    #[error(transparent)]
    Essay(#[from] EssayError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `DashboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DashboardError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
