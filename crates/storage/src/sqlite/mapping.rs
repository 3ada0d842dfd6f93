use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use sqlx::Row;
use study_core::model::{
    Essay, EssayId, Goal, OwnerId, PlanCategory, PlanId, SessionId, StudyPlan, StudySession,
};
use tracing::warn;
use uuid::Uuid;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Timestamps are stored as RFC 3339 text in UTC so they sort lexically.
pub(crate) fn timestamp_to_text(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Lenient timestamp read: RFC 3339 first, then `YYYY-MM-DD HH:MM:SS[.f]` as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn uuid_from_text(field: &'static str, raw: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(raw).map_err(|_| StorageError::Serialization(format!("invalid {field}: {raw}")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_session_row(row: &sqlx::sqlite::SqliteRow) -> Result<StudySession, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let id = SessionId::new(uuid_from_text("session id", &id)?);

    let raw_minutes: Option<i64> = row.try_get("minutes").map_err(ser)?;
    let minutes = if let Some(minutes) = raw_minutes.and_then(|m| u32::try_from(m).ok()) {
        minutes
    } else {
        warn!(session_id = %id, minutes = ?raw_minutes, "session has unusable minutes, counting as 0");
        0
    };

    let raw_created: Option<String> = row.try_get("created_at").map_err(ser)?;
    let created_at = raw_created.as_deref().and_then(parse_timestamp);
    if created_at.is_none() {
        warn!(session_id = %id, created_at = ?raw_created, "session has no usable timestamp");
    }

    Ok(StudySession {
        id,
        owner_id: OwnerId::new(row.try_get::<String, _>("owner_id").map_err(ser)?),
        subject: row.try_get("subject").map_err(ser)?,
        minutes,
        created_at,
    })
}

pub(crate) fn map_goal_row(row: &sqlx::sqlite::SqliteRow) -> Result<Goal, StorageError> {
    let updated_at: String = row.try_get("updated_at").map_err(ser)?;
    let updated_at = parse_timestamp(&updated_at)
        .ok_or_else(|| StorageError::Serialization(format!("invalid updated_at: {updated_at}")))?;

    Ok(Goal::new(
        OwnerId::new(row.try_get::<String, _>("owner_id").map_err(ser)?),
        u32_from_i64("daily_minutes", row.try_get("daily_minutes").map_err(ser)?)?,
        u32_from_i64("weekly_minutes", row.try_get("weekly_minutes").map_err(ser)?)?,
        u32_from_i64("monthly_minutes", row.try_get("monthly_minutes").map_err(ser)?)?,
        updated_at,
    ))
}

pub(crate) fn day_to_text(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

pub(crate) fn map_plan_row(row: &sqlx::sqlite::SqliteRow) -> Result<StudyPlan, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let day: String = row.try_get("day").map_err(ser)?;
    let category: String = row.try_get("category").map_err(ser)?;
    let created_at: String = row.try_get("created_at").map_err(ser)?;

    Ok(StudyPlan {
        id: PlanId::new(uuid_from_text("plan id", &id)?),
        owner_id: OwnerId::new(row.try_get::<String, _>("owner_id").map_err(ser)?),
        day: NaiveDate::parse_from_str(&day, "%Y-%m-%d").map_err(ser)?,
        subject: row.try_get("subject").map_err(ser)?,
        time: row.try_get("time").map_err(ser)?,
        category: PlanCategory::parse(&category).map_err(ser)?,
        created_at: parse_timestamp(&created_at).ok_or_else(|| {
            StorageError::Serialization(format!("invalid created_at: {created_at}"))
        })?,
    })
}

pub(crate) fn map_essay_row(row: &sqlx::sqlite::SqliteRow) -> Result<Essay, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let created_at: String = row.try_get("created_at").map_err(ser)?;

    Ok(Essay {
        id: EssayId::new(uuid_from_text("essay id", &id)?),
        owner_id: OwnerId::new(row.try_get::<String, _>("owner_id").map_err(ser)?),
        theme: row.try_get("theme").map_err(ser)?,
        text: row.try_get("body").map_err(ser)?,
        created_at: parse_timestamp(&created_at).ok_or_else(|| {
            StorageError::Serialization(format!("invalid created_at: {created_at}"))
        })?,
    })
}
