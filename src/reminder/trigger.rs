// File: ./src/reminder/trigger.rs
use chrono::{DateTime, Duration, Utc};

/// Minutes between the reminder and the start of the showing.
pub const REMINDER_LEAD_MINUTES: i64 = 10;

pub fn reminder_lead() -> Duration {
    Duration::minutes(REMINDER_LEAD_MINUTES)
}

/// Returns the instant the reminder should fire, or `None` when that instant
/// is not strictly after `now`.
pub fn compute_trigger(
    event: DateTime<Utc>,
    lead: Duration,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let trigger = event - lead;
    if trigger <= now { None } else { Some(trigger) }
}
