use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::OwnerId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GoalError {
    #[error("{field} goal is required")]
    Missing { field: &'static str },

    #[error("{field} goal is not a number: {raw:?}")]
    NotANumber { field: &'static str, raw: String },

    #[error("{field} goal must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field} goal is too large")]
    TooLarge { field: &'static str },
}

//
// ─── GOAL ──────────────────────────────────────────────────────────────────────
//

/// Per-owner study targets, stored in minutes.
///
/// There is one goal per owner and saving replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub owner_id: OwnerId,
    pub daily_minutes: u32,
    pub weekly_minutes: u32,
    pub monthly_minutes: u32,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    #[must_use]
    pub fn new(
        owner_id: OwnerId,
        daily_minutes: u32,
        weekly_minutes: u32,
        monthly_minutes: u32,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id,
            daily_minutes,
            weekly_minutes,
            monthly_minutes,
            updated_at,
        }
    }

    /// Build a goal from the hours typed into the goal form.
    ///
    /// Every field must be present, numeric and strictly positive. Hours are
    /// converted to minutes with rounding.
    ///
    /// # Errors
    ///
    /// Returns the first `GoalError` found, checking daily, weekly, then monthly.
    pub fn from_hours_input(
        owner_id: OwnerId,
        daily: &str,
        weekly: &str,
        monthly: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, GoalError> {
        let daily = hours_to_minutes("daily", daily)?;
        let weekly = hours_to_minutes("weekly", weekly)?;
        let monthly = hours_to_minutes("monthly", monthly)?;
        Ok(Self::new(owner_id, daily, weekly, monthly, updated_at))
    }

    /// Hours rendered with one decimal, as shown back in the goal form.
    #[must_use]
    pub fn as_hours_input(&self) -> GoalHours {
        GoalHours {
            daily: minutes_as_hours(self.daily_minutes),
            weekly: minutes_as_hours(self.weekly_minutes),
            monthly: minutes_as_hours(self.monthly_minutes),
        }
    }
}

/// Goal thresholds rendered for the goal form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalHours {
    pub daily: String,
    pub weekly: String,
    pub monthly: String,
}

fn hours_to_minutes(field: &'static str, raw: &str) -> Result<u32, GoalError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(GoalError::Missing { field });
    }
    let hours: f64 = trimmed.parse().map_err(|_| GoalError::NotANumber {
        field,
        raw: raw.to_owned(),
    })?;
    if !hours.is_finite() {
        return Err(GoalError::NotANumber {
            field,
            raw: raw.to_owned(),
        });
    }
    if hours <= 0.0 {
        return Err(GoalError::NotPositive { field });
    }
    let minutes = (hours * 60.0).round();
    if minutes > f64::from(u32::MAX) {
        return Err(GoalError::TooLarge { field });
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let minutes = minutes as u32;
    Ok(minutes)
}

fn minutes_as_hours(minutes: u32) -> String {
    format!("{:.1}", f64::from(minutes) / 60.0)
}
