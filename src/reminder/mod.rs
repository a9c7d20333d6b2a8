// File: ./src/reminder/mod.rs
//! Showtime reminders: when to fire, under which id, and through which path.
pub mod clock;
pub mod id;
pub mod scheduler;
pub mod sink;
pub mod time;
pub mod trigger;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use clock::{Clock, FixedClock, OffsetChange, SystemClock};
pub use id::{ReminderId, derive_id};
pub use scheduler::schedule;
pub use sink::{
    CapabilityDenied, DeferredPayload, ExactPayload, RecordingSink, ReminderPayload, ReminderSink,
    SinkCall,
};
pub use trigger::REMINDER_LEAD_MINUTES;

/// What a reminder is scheduled for. Built by the booking flow, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub subject_title: String,
    pub seat_label: String,
    /// `yyyy-MM-dd HH:mm` or `dd.MM.yyyy HH:mm`
    pub event_timestamp: String,
}

impl Booking {
    pub fn new(
        subject_title: impl Into<String>,
        seat_label: impl Into<String>,
        event_timestamp: impl Into<String>,
    ) -> Self {
        Self {
            subject_title: subject_title.into(),
            seat_label: seat_label.into(),
            event_timestamp: event_timestamp.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledReminder {
    pub id: ReminderId,
    pub fires_at: DateTime<Utc>,
    pub subject_title: String,
    pub lead_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Via {
    Exact,
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The timestamp matched none of the accepted layouts.
    UnparseableTime,
    /// The reminder would fire now or in the past.
    AlreadyPast,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnparseableTime => write!(f, "showtime not recognized"),
            SkipReason::AlreadyPast => write!(f, "showing starts too soon"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulingOutcome {
    Scheduled { via: Via, reminder: ScheduledReminder },
    Skipped(SkipReason),
}

impl SchedulingOutcome {
    pub fn via(&self) -> Option<Via> {
        match self {
            SchedulingOutcome::Scheduled { via, .. } => Some(*via),
            SchedulingOutcome::Skipped(_) => None,
        }
    }

    pub fn reminder(&self) -> Option<&ScheduledReminder> {
        match self {
            SchedulingOutcome::Scheduled { reminder, .. } => Some(reminder),
            SchedulingOutcome::Skipped(_) => None,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        matches!(self, SchedulingOutcome::Scheduled { .. })
    }
}

impl fmt::Display for SchedulingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingOutcome::Scheduled {
                via: Via::Exact,
                reminder,
            } => write!(
                f,
                "Reminder set for {}",
                reminder
                    .fires_at
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
            ),
            SchedulingOutcome::Scheduled {
                via: Via::Deferred,
                reminder,
            } => write!(
                f,
                "Reminder queued for around {}",
                reminder
                    .fires_at
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
            ),
            SchedulingOutcome::Skipped(reason) => write!(f, "No reminder: {}", reason),
        }
    }
}
