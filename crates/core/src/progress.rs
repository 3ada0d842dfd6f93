//! Progress aggregation over a snapshot of study sessions.
//!
//! Everything here is pure and total: malformed input is excluded or counted as
//! zero, so a dashboard can always be rendered even if it undercounts.
//!
//! Day boundaries are evaluated in the time zone of the `now` value passed in,
//! which is how callers choose the user's local calendar.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::Serialize;

use crate::model::{Goal, StudySession};
use crate::time::DayKey;

//
// ─── TOTALS ────────────────────────────────────────────────────────────────────
//

/// Sum `minutes` over sessions whose timestamp satisfies `predicate`.
///
/// Sessions without a timestamp never match.
pub fn sum_minutes<F>(sessions: &[StudySession], predicate: F) -> u64
where
    F: Fn(DateTime<Utc>) -> bool,
{
    sessions
        .iter()
        .filter_map(|s| s.created_at.map(|at| (at, s.minutes)))
        .filter(|(at, _)| predicate(*at))
        .map(|(_, minutes)| u64::from(minutes))
        .sum()
}

/// Minutes logged on the same calendar day as `now`.
pub fn today_total<Tz: TimeZone>(sessions: &[StudySession], now: &DateTime<Tz>) -> u64 {
    let tz = now.timezone();
    let today = DayKey::from_timestamp(now.with_timezone(&Utc), &tz);
    sum_minutes(sessions, |at| DayKey::from_timestamp(at, &tz) == today)
}

/// Minutes logged at or after `now - 7 days`.
pub fn week_total<Tz: TimeZone>(sessions: &[StudySession], now: &DateTime<Tz>) -> u64 {
    let cutoff = now.with_timezone(&Utc) - Duration::days(7);
    sum_minutes(sessions, |at| at >= cutoff)
}

/// Minutes logged in the same calendar month and year as `now`.
pub fn month_total<Tz: TimeZone>(sessions: &[StudySession], now: &DateTime<Tz>) -> u64 {
    let tz = now.timezone();
    let (year, month) = (now.year(), now.month());
    sum_minutes(sessions, |at| {
        let local = at.with_timezone(&tz);
        local.year() == year && local.month() == month
    })
}

//
// ─── FORMATTING ────────────────────────────────────────────────────────────────
//

/// Share of `goal` reached by `done`, as a whole percentage in `0..=100`.
///
/// An absent, non-positive or non-finite goal yields 0, as does a non-finite ratio.
#[must_use]
pub fn percent_of_goal(done: f64, goal: Option<f64>) -> u8 {
    let Some(goal) = goal.filter(|g| g.is_finite() && *g > 0.0) else {
        return 0;
    };
    let percent = (done / goal * 100.0).round();
    if !percent.is_finite() {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percent = percent.clamp(0.0, 100.0) as u8;
    percent
}

/// Render minutes as `"<h>h <m>m"`; non-finite or non-positive input is `"0h 0m"`.
#[must_use]
pub fn format_duration(minutes: f64) -> String {
    if !minutes.is_finite() || minutes <= 0.0 {
        return "0h 0m".to_owned();
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = minutes.floor() as u64;
    format!("{}h {}m", total / 60, total % 60)
}

//
// ─── CHART SERIES ──────────────────────────────────────────────────────────────
//

/// One point of the by-day study line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub day: String,
    pub hours: f64,
}

/// One bar of the by-subject ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectPoint {
    pub subject: String,
    pub hours: f64,
}

/// Hours studied per calendar day in `tz`, oldest day first.
pub fn build_daily_series<Tz: TimeZone>(sessions: &[StudySession], tz: &Tz) -> Vec<DailyPoint> {
    let mut per_day: BTreeMap<DayKey, u64> = BTreeMap::new();
    for session in sessions {
        let Some(day) = DayKey::of(session.created_at, tz) else {
            continue;
        };
        *per_day.entry(day).or_default() += u64::from(session.minutes);
    }

    per_day
        .into_iter()
        .map(|(day, minutes)| DailyPoint {
            day: day.display(),
            hours: minutes_to_hours(minutes),
        })
        .collect()
}

/// Hours studied per subject, largest first. Equal totals keep the order in
/// which their subjects first appear. Blank subjects are skipped.
#[must_use]
pub fn build_subject_series(sessions: &[StudySession]) -> Vec<SubjectPoint> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<(&str, u64)> = Vec::new();

    for session in sessions {
        let subject = session.subject.trim();
        if subject.is_empty() {
            continue;
        }
        let slot = *index.entry(subject).or_insert_with(|| {
            totals.push((subject, 0));
            totals.len() - 1
        });
        totals[slot].1 += u64::from(session.minutes);
    }

    // stable: ties stay in first-encounter order
    totals.sort_by(|a, b| b.1.cmp(&a.1));

    totals
        .into_iter()
        .map(|(subject, minutes)| SubjectPoint {
            subject: subject.to_owned(),
            hours: minutes_to_hours(minutes),
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn minutes_to_hours(minutes: u64) -> f64 {
    (minutes as f64 / 60.0 * 10.0).round() / 10.0
}

//
// ─── STREAK ────────────────────────────────────────────────────────────────────
//

/// Consecutive days with at least one session, ending today.
///
/// A streak that ended yesterday still counts while today has nothing logged yet.
pub fn current_streak<Tz: TimeZone>(sessions: &[StudySession], now: &DateTime<Tz>) -> u32 {
    let tz = now.timezone();
    let days: HashSet<_> = sessions
        .iter()
        .filter_map(|s| DayKey::of(s.created_at, &tz))
        .map(|d| d.date())
        .collect();

    let today = now.date_naive();
    let mut cursor = if days.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) => yesterday,
            None => return 0,
        }
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    streak
}

//
// ─── VIEW ──────────────────────────────────────────────────────────────────────
//

/// Totals for one goal period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodProgress {
    pub minutes: u64,
    pub goal_minutes: Option<u32>,
    pub percent: u8,
    pub display: String,
}

impl PeriodProgress {
    #[allow(clippy::cast_precision_loss)]
    fn new(minutes: u64, goal_minutes: Option<u32>) -> Self {
        let done = minutes as f64;
        Self {
            minutes,
            goal_minutes,
            percent: percent_of_goal(done, goal_minutes.map(f64::from)),
            display: format_duration(done),
        }
    }
}

/// Everything the dashboard shows, derived from one session snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateView {
    pub today: PeriodProgress,
    pub week: PeriodProgress,
    pub month: PeriodProgress,
    pub has_goal: bool,
    pub session_count: usize,
    pub streak_days: u32,
    pub daily_series: Vec<DailyPoint>,
    pub subject_series: Vec<SubjectPoint>,
}

impl AggregateView {
    pub fn build<Tz: TimeZone>(
        sessions: &[StudySession],
        goal: Option<&Goal>,
        now: &DateTime<Tz>,
    ) -> Self {
        Self {
            today: PeriodProgress::new(today_total(sessions, now), goal.map(|g| g.daily_minutes)),
            week: PeriodProgress::new(week_total(sessions, now), goal.map(|g| g.weekly_minutes)),
            month: PeriodProgress::new(month_total(sessions, now), goal.map(|g| g.monthly_minutes)),
            has_goal: goal.is_some(),
            session_count: sessions.len(),
            streak_days: current_streak(sessions, now),
            daily_series: build_daily_series(sessions, &now.timezone()),
            subject_series: build_subject_series(sessions),
        }
    }
}
