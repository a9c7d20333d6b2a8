// File: ./src/reminder/scheduler.rs
//! Picks between an exact wake-up and a deferred background job for a booking.
//!
//! The exact path is tried first. Hosts increasingly gate precise alarms
//! behind a user-granted permission, so a refusal is expected and answered by
//! queueing a best-effort job instead. None of this can fail a booking: the
//! worst case is a reminder that is skipped, and the outcome says why.
use super::clock::Clock;
use super::id::derive_id;
use super::sink::{DeferredPayload, ExactPayload, ReminderSink};
use super::time::parse_event_time;
use super::trigger::{REMINDER_LEAD_MINUTES, compute_trigger, reminder_lead};
use super::{Booking, ScheduledReminder, SchedulingOutcome, SkipReason, Via};

/// Seat shown in deferred reminders when the booking carries none.
pub const UNKNOWN_SEAT: &str = "N/A";

/// Schedules the reminder for `booking`. Makes at most one call into `sink`.
pub fn schedule(
    booking: &Booking,
    clock: &dyn Clock,
    sink: &dyn ReminderSink,
) -> SchedulingOutcome {
    let Some(parsed) = parse_event_time(&booking.event_timestamp) else {
        log::info!(
            "No reminder for '{}': unrecognized time '{}'",
            booking.subject_title,
            booking.event_timestamp
        );
        return SchedulingOutcome::Skipped(SkipReason::UnparseableTime);
    };

    let Some(event_at) = clock.resolve_local(parsed.local) else {
        log::info!(
            "No reminder for '{}': no UTC offset found for '{}'",
            booking.subject_title,
            booking.event_timestamp
        );
        return SchedulingOutcome::Skipped(SkipReason::UnparseableTime);
    };

    let Some(trigger) = compute_trigger(event_at, reminder_lead(), clock.now()) else {
        log::debug!(
            "No reminder for '{}': starts within {} minutes",
            booking.subject_title,
            REMINDER_LEAD_MINUTES
        );
        return SchedulingOutcome::Skipped(SkipReason::AlreadyPast);
    };

    let id = derive_id(event_at.timestamp_millis(), &booking.subject_title);
    let reminder = ScheduledReminder {
        id,
        fires_at: trigger,
        subject_title: booking.subject_title.clone(),
        lead_minutes: REMINDER_LEAD_MINUTES,
    };

    let exact = ExactPayload {
        title: booking.subject_title.clone(),
        start: parsed.local.format("%H:%M").to_string(),
    };

    match sink.schedule_exact(trigger, id, exact) {
        Ok(()) => {
            log::debug!(
                "Exact reminder {} for '{}' at {}",
                id,
                booking.subject_title,
                trigger
            );
            return SchedulingOutcome::Scheduled {
                via: Via::Exact,
                reminder,
            };
        }
        Err(denied) => {
            log::warn!(
                "Falling back to deferred reminder for '{}': {}",
                booking.subject_title,
                denied
            );
        }
    }

    // Time has moved since the first check, so validate again.
    let delay = trigger - clock.now();
    if delay <= chrono::Duration::zero() {
        return SchedulingOutcome::Skipped(SkipReason::AlreadyPast);
    }

    let seat = if booking.seat_label.trim().is_empty() {
        UNKNOWN_SEAT.to_string()
    } else {
        booking.seat_label.clone()
    };

    sink.schedule_deferred(
        delay,
        DeferredPayload {
            title: booking.subject_title.clone(),
            seat,
            time: booking.event_timestamp.clone(),
        },
    );
    log::debug!(
        "Deferred reminder for '{}' in {}s",
        booking.subject_title,
        delay.num_seconds()
    );

    SchedulingOutcome::Scheduled {
        via: Via::Deferred,
        reminder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::clock::{FixedClock, OffsetChange};
    use crate::reminder::sink::{CapabilityDenied, RecordingSink, SinkCall};
    use crate::reminder::id::ReminderId;
    use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 24, 17, 30, 0).unwrap()
    }

    fn booking(time: &str) -> Booking {
        Booking::new("Interstellar", "Row 1, seat 3", time)
    }

    /// Moves the clock forward every time the exact path is attempted, then
    /// refuses it. Mimics a slow permission check.
    struct SlowDenyingSink<'a> {
        clock: &'a FixedClock,
        by: Duration,
        inner: RecordingSink,
    }

    impl ReminderSink for SlowDenyingSink<'_> {
        fn schedule_exact(
            &self,
            _at: DateTime<Utc>,
            _id: ReminderId,
            _payload: ExactPayload,
        ) -> Result<(), CapabilityDenied> {
            self.clock.advance(self.by);
            Err(CapabilityDenied)
        }

        fn schedule_deferred(&self, delay: Duration, payload: DeferredPayload) {
            self.inner.schedule_deferred(delay, payload)
        }
    }

    #[test]
    fn test_exact_payload_carries_local_start_time() {
        let clock = FixedClock::new(start());
        let sink = RecordingSink::new();
        schedule(&booking("2025-12-24 18:00"), &clock, &sink);

        match &sink.calls()[0] {
            SinkCall::Exact { payload, .. } => {
                assert_eq!(payload.title, "Interstellar");
                assert_eq!(payload.start, "18:00");
            }
            other => panic!("expected exact call, got {:?}", other),
        }
    }

    #[test]
    fn test_offset_zone_shifts_trigger() {
        // 18:00 at UTC+1 is 17:00 UTC
        let clock = FixedClock::with_offset(
            Utc.with_ymd_and_hms(2025, 12, 24, 16, 0, 0).unwrap(),
            FixedOffset::east_opt(3600).unwrap(),
        );
        let sink = RecordingSink::new();
        let outcome = schedule(&booking("24.12.2025 18:00"), &clock, &sink);

        let expected = Utc.with_ymd_and_hms(2025, 12, 24, 16, 50, 0).unwrap();
        assert_eq!(outcome.reminder().unwrap().fires_at, expected);
    }

    #[test]
    fn test_showtime_in_dst_gap_is_still_scheduled() {
        let clock = FixedClock::with_offset_change(
            Utc.with_ymd_and_hms(2027, 3, 27, 12, 0, 0).unwrap(),
            OffsetChange {
                starts: NaiveDate::from_ymd_opt(2027, 3, 28)
                    .unwrap()
                    .and_hms_opt(2, 0, 0)
                    .unwrap(),
                before: FixedOffset::east_opt(3600).unwrap(),
                after: FixedOffset::east_opt(7200).unwrap(),
            },
        );
        let sink = RecordingSink::new();
        let outcome = schedule(
            &Booking::new("Dune: Part Two", "Row 1, seat 1", "2027-03-28 02:30"),
            &clock,
            &sink,
        );

        // 02:30 is read as 03:30 CEST (01:30 UTC), so the reminder is at 01:20 UTC
        let expected = Utc.with_ymd_and_hms(2027, 3, 28, 1, 20, 0).unwrap();
        assert_eq!(outcome.via(), Some(Via::Exact));
        assert_eq!(outcome.reminder().unwrap().fires_at, expected);
        assert_eq!(sink.calls().len(), 1);
    }

    #[test]
    fn test_fallback_revalidates_after_slow_denial() {
        let clock = FixedClock::new(start());
        let sink = SlowDenyingSink {
            clock: &clock,
            by: Duration::minutes(25),
            inner: RecordingSink::new(),
        };
        // Trigger is 17:50; the denial pushes now to 17:55
        let outcome = schedule(&booking("2025-12-24 18:00"), &clock, &sink);

        assert_eq!(outcome, SchedulingOutcome::Skipped(SkipReason::AlreadyPast));
        assert!(sink.inner.calls().is_empty());
    }

    #[test]
    fn test_fallback_uses_second_clock_read() {
        let clock = FixedClock::new(start());
        let sink = SlowDenyingSink {
            clock: &clock,
            by: Duration::minutes(5),
            inner: RecordingSink::new(),
        };
        let outcome = schedule(&booking("2025-12-24 18:00"), &clock, &sink);

        assert_eq!(outcome.via(), Some(Via::Deferred));
        match &sink.inner.calls()[0] {
            SinkCall::Deferred { delay, .. } => assert_eq!(*delay, Duration::minutes(15)),
            other => panic!("expected deferred call, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_seat_becomes_placeholder() {
        let clock = FixedClock::new(start());
        let sink = RecordingSink::denying_exact();
        let b = Booking::new("Interstellar", "  ", "2025-12-24 18:00");
        schedule(&b, &clock, &sink);

        match &sink.calls()[0] {
            SinkCall::Deferred { payload, .. } => {
                assert_eq!(payload.seat, UNKNOWN_SEAT);
                assert_eq!(payload.time, "2025-12-24 18:00");
            }
            other => panic!("expected deferred call, got {:?}", other),
        }
    }
}
