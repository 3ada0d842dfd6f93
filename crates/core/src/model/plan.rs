use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{OwnerId, PlanId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlanError {
    #[error("plan subject cannot be empty")]
    EmptySubject,

    #[error("plan time cannot be empty")]
    EmptyTime,

    #[error("unknown plan category: {0}")]
    UnknownCategory(String),

    #[error("invalid month {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// What a planned block is for. Each category has a fixed board color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanCategory {
    #[default]
    Study,
    Essay,
    Rest,
    Food,
    Other,
}

impl PlanCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PlanCategory::Study => "study",
            PlanCategory::Essay => "essay",
            PlanCategory::Rest => "rest",
            PlanCategory::Food => "food",
            PlanCategory::Other => "other",
        }
    }

    /// Parse the stored category name.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::UnknownCategory` for names outside the known set.
    pub fn parse(raw: &str) -> Result<Self, PlanError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "study" => Ok(PlanCategory::Study),
            "essay" => Ok(PlanCategory::Essay),
            "rest" => Ok(PlanCategory::Rest),
            "food" => Ok(PlanCategory::Food),
            "other" => Ok(PlanCategory::Other),
            _ => Err(PlanError::UnknownCategory(raw.to_owned())),
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            PlanCategory::Study => "#38bdf8",
            PlanCategory::Essay => "#a855f7",
            PlanCategory::Rest => "#22c55e",
            PlanCategory::Food => "#f97316",
            PlanCategory::Other => "#94a3b8",
        }
    }
}

//
// ─── PLAN ──────────────────────────────────────────────────────────────────────
//

/// A block placed on the planning calendar.
///
/// `time` keeps the free text the user typed (`"1h30m"`); it is parsed when the
/// plan is loaded into the timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    pub id: PlanId,
    pub owner_id: OwnerId,
    pub day: NaiveDate,
    pub subject: String,
    pub time: String,
    pub category: PlanCategory,
    pub created_at: DateTime<Utc>,
}

impl StudyPlan {
    #[must_use]
    pub fn color(&self) -> &'static str {
        self.category.color()
    }
}

/// Creation request for a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudyPlan {
    owner_id: OwnerId,
    day: NaiveDate,
    subject: String,
    time: String,
    category: PlanCategory,
    created_at: DateTime<Utc>,
}

impl NewStudyPlan {
    /// # Errors
    ///
    /// Returns `PlanError::EmptySubject` or `PlanError::EmptyTime` for blank input.
    pub fn new(
        owner_id: OwnerId,
        day: NaiveDate,
        subject: impl AsRef<str>,
        time: impl AsRef<str>,
        category: PlanCategory,
        created_at: DateTime<Utc>,
    ) -> Result<Self, PlanError> {
        let subject = subject.as_ref().trim();
        let time = time.as_ref().trim();
        if subject.is_empty() {
            return Err(PlanError::EmptySubject);
        }
        if time.is_empty() {
            return Err(PlanError::EmptyTime);
        }
        Ok(Self {
            owner_id,
            day,
            subject: subject.to_owned(),
            time: time.to_owned(),
            category,
            created_at,
        })
    }

    #[must_use]
    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    #[must_use]
    pub fn day(&self) -> NaiveDate {
        self.day
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn time(&self) -> &str {
        &self.time
    }

    #[must_use]
    pub fn category(&self) -> PlanCategory {
        self.category
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn into_plan(self, id: PlanId) -> StudyPlan {
        StudyPlan {
            id,
            owner_id: self.owner_id,
            day: self.day,
            subject: self.subject,
            time: self.time,
            category: self.category,
            created_at: self.created_at,
        }
    }
}

//
// ─── MONTH BOARD ───────────────────────────────────────────────────────────────
//

/// Every day of the given month, in order.
///
/// # Errors
///
/// Returns `PlanError::InvalidMonth` if the month does not exist.
pub fn month_days(year: i32, month: u32) -> Result<Vec<NaiveDate>, PlanError> {
    let first =
        NaiveDate::from_ymd_opt(year, month, 1).ok_or(PlanError::InvalidMonth { year, month })?;
    Ok(first
        .iter_days()
        .take_while(|d| d.month() == month)
        .collect())
}

/// One calendar column of the planning board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardDay {
    pub day: NaiveDate,
    pub plans: Vec<StudyPlan>,
}

/// Lay plans out on the days of a month. Plans outside the month are ignored and
/// each column keeps the input order.
///
/// # Errors
///
/// Returns `PlanError::InvalidMonth` if the month does not exist.
pub fn month_board(year: i32, month: u32, plans: &[StudyPlan]) -> Result<Vec<BoardDay>, PlanError> {
    let days = month_days(year, month)?;
    Ok(days
        .into_iter()
        .map(|day| BoardDay {
            day,
            plans: plans.iter().filter(|p| p.day == day).cloned().collect(),
        })
        .collect())
}
