//! Countdown state machine behind the study timer.
//!
//! `SessionTimer` is pure: it never sleeps and never talks to storage. A driver
//! calls [`SessionTimer::tick`] once per elapsed second while the timer runs, and
//! persists the [`SaveRequest`] handed out by [`SessionTimer::begin_save`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duration::{DurationError, parse_time_to_seconds};
use crate::model::{OwnerId, StudyPlan};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TimerError {
    #[error(transparent)]
    InvalidDuration(#[from] DurationError),

    #[error("timer has not finished yet")]
    NotReady,

    #[error("no plan selected")]
    NoSubject,

    #[error("a save for this session is already in flight")]
    SaveInProgress,
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerPhase {
    #[default]
    Idle,
    Running,
    Paused,
    Finished,
}

/// What the user picked to run: a subject and its free-text duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanInput {
    pub subject: String,
    pub time: String,
}

impl PlanInput {
    #[must_use]
    pub fn new(subject: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            time: time.into(),
        }
    }
}

impl From<&StudyPlan> for PlanInput {
    fn from(plan: &StudyPlan) -> Self {
        Self::new(plan.subject.clone(), plan.time.clone())
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The timer was not running; nothing changed.
    Ignored,
    /// One second was counted and time remains.
    Counted,
    /// The last second was counted and the timer is now finished.
    Finished,
}

/// Persistence request produced when a finished run is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub owner_id: OwnerId,
    pub subject: String,
    pub minutes: u32,
}

/// Read-only view of the timer for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub selected_subject: Option<String>,
    pub total_seconds: u32,
    pub seconds_remaining: u32,
    pub display: String,
}

/// Countdown for one planned study block.
///
/// Invariants: `seconds_remaining <= total_seconds`, and a finished timer has
/// nothing remaining.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTimer {
    selected_subject: Option<String>,
    total_seconds: u32,
    seconds_remaining: u32,
    phase: TimerPhase,
    save_pending: bool,
}

impl SessionTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    #[must_use]
    pub fn selected_subject(&self) -> Option<&str> {
        self.selected_subject.as_deref()
    }

    #[must_use]
    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    #[must_use]
    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    #[must_use]
    pub fn is_save_pending(&self) -> bool {
        self.save_pending
    }

    /// True while a countdown is running or paused.
    #[must_use]
    pub fn run_in_progress(&self) -> bool {
        matches!(self.phase, TimerPhase::Running | TimerPhase::Paused)
    }

    /// Load a plan into the timer.
    ///
    /// Returns `Ok(false)` without touching the state when a run is in progress or
    /// a save is in flight, so an unsaved countdown is never discarded.
    ///
    /// # Errors
    ///
    /// - `TimerError::NoSubject` when the subject is blank.
    /// - `TimerError::InvalidDuration` when the plan time yields zero seconds.
    ///
    /// The state is left unchanged on error.
    pub fn select_plan(&mut self, plan: &PlanInput) -> Result<bool, TimerError> {
        if self.run_in_progress() || self.save_pending {
            return Ok(false);
        }
        let subject = plan.subject.trim();
        if subject.is_empty() {
            return Err(TimerError::NoSubject);
        }
        let total = parse_time_to_seconds(&plan.time)?;

        *self = Self {
            selected_subject: Some(subject.to_owned()),
            total_seconds: total,
            seconds_remaining: total,
            phase: TimerPhase::Idle,
            save_pending: false,
        };
        Ok(true)
    }

    /// `Idle → Running` when time remains. Returns whether the transition happened.
    pub fn start(&mut self) -> bool {
        if self.phase != TimerPhase::Idle || self.seconds_remaining == 0 {
            return false;
        }
        self.phase = TimerPhase::Running;
        true
    }

    /// `Running → Paused`. Returns whether the transition happened.
    pub fn pause(&mut self) -> bool {
        if self.phase != TimerPhase::Running {
            return false;
        }
        self.phase = TimerPhase::Paused;
        true
    }

    /// `Paused → Running`. Returns whether the transition happened.
    pub fn resume(&mut self) -> bool {
        if self.phase != TimerPhase::Paused {
            return false;
        }
        self.phase = TimerPhase::Running;
        true
    }

    /// Count one elapsed second.
    pub fn tick(&mut self) -> Tick {
        if self.phase != TimerPhase::Running {
            return Tick::Ignored;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining == 0 {
            self.phase = TimerPhase::Finished;
            return Tick::Finished;
        }
        Tick::Counted
    }

    /// Hand out the persistence request for a finished run.
    ///
    /// Marks a save as pending; exactly one request is issued until the caller
    /// reports back through [`Self::complete_save`] or [`Self::abort_save`].
    ///
    /// # Errors
    ///
    /// - `TimerError::SaveInProgress` if a request is already outstanding.
    /// - `TimerError::NoSubject` if no plan is selected.
    /// - `TimerError::NotReady` if the countdown has not finished.
    pub fn begin_save(&mut self, owner_id: OwnerId) -> Result<SaveRequest, TimerError> {
        if self.save_pending {
            return Err(TimerError::SaveInProgress);
        }
        let subject = self.selected_subject.clone().ok_or(TimerError::NoSubject)?;
        if self.phase != TimerPhase::Finished {
            return Err(TimerError::NotReady);
        }

        self.save_pending = true;
        Ok(SaveRequest {
            owner_id,
            subject,
            minutes: rounded_minutes(self.total_seconds),
        })
    }

    /// The write went through: reset to `Idle` with no plan.
    pub fn complete_save(&mut self) {
        *self = Self::default();
    }

    /// The write failed: keep the finished run so the user can retry.
    pub fn abort_save(&mut self) {
        self.save_pending = false;
    }

    #[must_use]
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            selected_subject: self.selected_subject.clone(),
            total_seconds: self.total_seconds,
            seconds_remaining: self.seconds_remaining,
            display: format_remaining(self.seconds_remaining),
        }
    }
}

/// Whole minutes, rounding half a minute up.
#[must_use]
pub fn rounded_minutes(seconds: u32) -> u32 {
    seconds / 60 + u32::from(seconds % 60 >= 30)
}

/// Render seconds as `MM:SS`. Minutes are not rolled over into hours.
#[must_use]
pub fn format_remaining(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> OwnerId {
        OwnerId::new("u1")
    }

    fn selected(time: &str) -> SessionTimer {
        let mut timer = SessionTimer::new();
        assert_eq!(timer.select_plan(&PlanInput::new("Math", time)), Ok(true));
        timer
    }

    fn assert_invariants(timer: &SessionTimer) {
        assert!(timer.seconds_remaining() <= timer.total_seconds());
        if timer.phase() == TimerPhase::Finished {
            assert_eq!(timer.seconds_remaining(), 0);
        }
    }

    #[test]
    fn select_plan_loads_duration() {
        let timer = selected("1h30m");
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert_eq!(timer.total_seconds(), 5400);
        assert_eq!(timer.seconds_remaining(), 5400);
        assert_eq!(timer.selected_subject(), Some("Math"));
    }

    #[test]
    fn zero_length_plan_is_rejected_without_state_change() {
        let mut timer = selected("45m");
        let before = timer.clone();

        let err = timer.select_plan(&PlanInput::new("Art", "0h0m")).unwrap_err();
        assert!(matches!(err, TimerError::InvalidDuration(_)));
        assert_eq!(timer, before);
    }

    #[test]
    fn blank_subject_is_rejected_without_state_change() {
        let mut timer = selected("45m");
        let before = timer.clone();

        assert_eq!(
            timer.select_plan(&PlanInput::new("   ", "1m")),
            Err(TimerError::NoSubject)
        );
        assert_eq!(timer, before);
        assert_eq!(timer.selected_subject(), Some("Math"));
    }

    #[test]
    fn select_plan_is_refused_during_a_run() {
        let mut timer = selected("1m");
        assert!(timer.start());
        timer.tick();
        let before = timer.clone();

        assert_eq!(timer.select_plan(&PlanInput::new("Art", "2h")), Ok(false));
        assert_eq!(timer, before);

        assert!(timer.pause());
        assert_eq!(timer.select_plan(&PlanInput::new("Art", "2h")), Ok(false));
        assert_eq!(timer.selected_subject(), Some("Math"));
    }

    #[test]
    fn start_requires_a_loaded_plan() {
        let mut timer = SessionTimer::new();
        assert!(!timer.start());
        assert_eq!(timer.phase(), TimerPhase::Idle);
    }

    #[test]
    fn pause_and_resume_toggle_only_when_applicable() {
        let mut timer = selected("1m");
        assert!(!timer.pause());
        assert!(!timer.resume());

        assert!(timer.start());
        assert!(!timer.start());
        assert!(timer.pause());
        assert!(!timer.pause());
        assert_eq!(timer.tick(), Tick::Ignored);
        assert!(timer.resume());
        assert_eq!(timer.phase(), TimerPhase::Running);
    }

    #[test]
    fn ticking_total_seconds_finishes_exactly() {
        let mut timer = selected("2m");
        assert!(timer.start());

        for _ in 0..119 {
            assert_eq!(timer.tick(), Tick::Counted);
            assert_invariants(&timer);
        }
        assert_eq!(timer.tick(), Tick::Finished);
        assert_eq!(timer.phase(), TimerPhase::Finished);
        assert_eq!(timer.seconds_remaining(), 0);
        assert_eq!(timer.tick(), Tick::Ignored);
        assert_invariants(&timer);
    }

    #[test]
    fn save_checks_subject_then_phase() {
        let mut fresh = SessionTimer::new();
        assert_eq!(fresh.begin_save(owner()), Err(TimerError::NoSubject));

        let mut timer = selected("1m");
        assert_eq!(timer.begin_save(owner()), Err(TimerError::NotReady));
        assert!(timer.start());
        assert_eq!(timer.begin_save(owner()), Err(TimerError::NotReady));
    }

    #[test]
    fn save_is_issued_once_until_reset() {
        let mut timer = selected("1h30m");
        timer.start();
        while timer.tick() != Tick::Finished {}

        let request = timer.begin_save(owner()).unwrap();
        assert_eq!(request.subject, "Math");
        assert_eq!(request.minutes, 90);
        assert_eq!(timer.begin_save(owner()), Err(TimerError::SaveInProgress));
        assert_eq!(timer.select_plan(&PlanInput::new("Art", "1h")), Ok(false));

        timer.complete_save();
        assert_eq!(timer, SessionTimer::new());
        assert_eq!(timer.begin_save(owner()), Err(TimerError::NoSubject));
    }

    #[test]
    fn aborted_save_keeps_the_finished_run() {
        let mut timer = selected("1m");
        timer.start();
        while timer.tick() != Tick::Finished {}

        timer.begin_save(owner()).unwrap();
        timer.abort_save();
        assert_eq!(timer.phase(), TimerPhase::Finished);
        assert!(!timer.is_save_pending());
        assert_eq!(timer.begin_save(owner()).unwrap().minutes, 1);
    }

    #[test]
    fn finished_timer_accepts_a_new_plan() {
        let mut timer = selected("1m");
        timer.start();
        while timer.tick() != Tick::Finished {}

        assert_eq!(timer.select_plan(&PlanInput::new("Art", "2m")), Ok(true));
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert_eq!(timer.seconds_remaining(), 120);
    }

    #[test]
    fn minutes_round_half_up_without_overflow() {
        assert_eq!(rounded_minutes(29), 0);
        assert_eq!(rounded_minutes(30), 1);
        assert_eq!(rounded_minutes(5400), 90);
        assert_eq!(rounded_minutes(u32::MAX), 71_582_788);
    }

    #[test]
    fn finished_run_near_the_upper_bound_saves() {
        let mut timer = SessionTimer::new();
        assert_eq!(
            timer.select_plan(&PlanInput::new("Math", "1193046h28m")),
            Ok(true)
        );
        assert_eq!(timer.total_seconds(), 4_294_967_280);
        timer.phase = TimerPhase::Finished;
        timer.seconds_remaining = 0;

        let request = timer.begin_save(owner()).unwrap();
        assert_eq!(request.minutes, 71_582_788);
    }

    #[test]
    fn formats_remaining_without_hour_rollover() {
        assert_eq!(format_remaining(0), "00:00");
        assert_eq!(format_remaining(65), "01:05");
        assert_eq!(format_remaining(5400), "90:00");
    }

    #[test]
    fn snapshot_carries_display() {
        let timer = selected("45m");
        let snapshot = timer.snapshot();
        assert_eq!(snapshot.display, "45:00");
        assert_eq!(snapshot.phase, TimerPhase::Idle);
    }
}
