//! Session history grouped by calendar day.

use chrono::TimeZone;
use serde::Serialize;

use crate::model::{SessionId, StudySession};
use crate::progress::format_duration;
use crate::time::DayKey;

const FALLBACK_COLOR: &str = "#94a3b8";

const SUBJECT_COLORS: &[(&str, &str)] = &[
    ("Matemática", "#38bdf8"),
    ("História", "#a855f7"),
    ("Redação", "#f97316"),
    ("Português", "#22c55e"),
    ("Física", "#ef4444"),
    ("Química", "#facc15"),
    ("Biologia", "#14b8a6"),
    ("Geografia", "#ec4899"),
];

/// Accent color for a subject; unknown subjects get a neutral grey.
#[must_use]
pub fn subject_color(subject: &str) -> &'static str {
    let subject = subject.trim();
    SUBJECT_COLORS
        .iter()
        .find(|(name, _)| *name == subject)
        .map_or(FALLBACK_COLOR, |(_, color)| color)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub id: SessionId,
    pub subject: String,
    pub minutes: u32,
    pub duration: String,
    pub color: &'static str,
}

impl HistoryEntry {
    fn from_session(session: &StudySession) -> Self {
        Self {
            id: session.id,
            subject: session.subject.clone(),
            minutes: session.minutes,
            duration: format_duration(f64::from(session.minutes)),
            color: subject_color(&session.subject),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryDay {
    pub day: DayKey,
    pub label: String,
    pub entries: Vec<HistoryEntry>,
}

/// Sessions grouped by day, newest day first.
///
/// Sessions without a timestamp cannot be placed on a day and are listed
/// separately in `undated`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryView {
    pub days: Vec<HistoryDay>,
    pub undated: Vec<HistoryEntry>,
}

impl HistoryView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty() && self.undated.is_empty()
    }
}

/// Group sessions by their day in `tz`.
///
/// Within a day, entries keep the input order (the store lists newest first).
pub fn group_by_day<Tz: TimeZone>(sessions: &[StudySession], tz: &Tz) -> HistoryView {
    let mut view = HistoryView::default();

    for session in sessions {
        let entry = HistoryEntry::from_session(session);
        let Some(day) = DayKey::of(session.created_at, tz) else {
            view.undated.push(entry);
            continue;
        };
        match view.days.iter_mut().find(|d| d.day == day) {
            Some(group) => group.entries.push(entry),
            None => view.days.push(HistoryDay {
                day,
                label: day.display(),
                entries: vec![entry],
            }),
        }
    }

    // stable: same-day order is preserved
    view.days.sort_by(|a, b| b.day.cmp(&a.day));
    view
}
