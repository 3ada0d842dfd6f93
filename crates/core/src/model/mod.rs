mod essay;
mod goal;
mod ids;
pub mod plan;
mod session;

pub use ids::{EssayId, OwnerId, ParseIdError, PlanId, SessionId};

pub use essay::{ESSAY_THEMES, Essay, EssayError, NewEssay};
pub use goal::{Goal, GoalError, GoalHours};
pub use plan::{BoardDay, NewStudyPlan, PlanCategory, PlanError, StudyPlan};
pub use session::{NewStudySession, StudySession, StudySessionError};
