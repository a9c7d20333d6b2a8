// File: tests/reminder_scheduling.rs
use chrono::{Duration, TimeZone, Utc};
use kinopass::reminder::{
    Booking, FixedClock, RecordingSink, SchedulingOutcome, SinkCall, SkipReason, Via, derive_id,
    schedule,
};

fn clock_at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap())
}

#[test]
fn test_exact_reminder_fires_ten_minutes_early() {
    let clock = clock_at(2025, 12, 24, 17, 30);
    let sink = RecordingSink::new();

    let outcome = schedule(
        &Booking::new("Oppenheimer", "Row 1, seat 1", "2025-12-24 18:00"),
        &clock,
        &sink,
    );

    let expected_at = Utc.with_ymd_and_hms(2025, 12, 24, 17, 50, 0).unwrap();
    assert_eq!(outcome.via(), Some(Via::Exact));
    assert_eq!(outcome.reminder().unwrap().fires_at, expected_at);

    match &sink.calls()[..] {
        [SinkCall::Exact { at, id, payload }] => {
            assert_eq!(*at, expected_at);
            let event = Utc.with_ymd_and_hms(2025, 12, 24, 18, 0, 0).unwrap();
            assert_eq!(*id, derive_id(event.timestamp_millis(), "Oppenheimer"));
            assert_eq!(payload.title, "Oppenheimer");
            assert_eq!(payload.start, "18:00");
        }
        other => panic!("expected one exact call, got {:?}", other),
    }
}

#[test]
fn test_denied_exact_falls_back_to_deferred() {
    let clock = clock_at(2025, 12, 24, 17, 30);
    let sink = RecordingSink::denying_exact();

    let outcome = schedule(
        &Booking::new("Dune: Part Two", "Row 2, seat 3", "24.12.2025 18:00"),
        &clock,
        &sink,
    );

    assert_eq!(outcome.via(), Some(Via::Deferred));
    match &sink.calls()[..] {
        [SinkCall::Deferred { delay, payload }] => {
            assert_eq!(*delay, Duration::minutes(20));
            assert_eq!(payload.title, "Dune: Part Two");
            assert_eq!(payload.seat, "Row 2, seat 3");
            assert_eq!(payload.time, "24.12.2025 18:00");
        }
        other => panic!("expected one deferred call, got {:?}", other),
    }
}

#[test]
fn test_showing_inside_lead_window_is_skipped() {
    let clock = clock_at(2025, 12, 24, 17, 55);
    let sink = RecordingSink::new();

    let outcome = schedule(
        &Booking::new("Interstellar", "Row 1, seat 2", "2025-12-24 18:00"),
        &clock,
        &sink,
    );

    assert_eq!(outcome, SchedulingOutcome::Skipped(SkipReason::AlreadyPast));
    assert!(sink.calls().is_empty());
}

#[test]
fn test_trigger_exactly_now_is_skipped() {
    let clock = clock_at(2025, 12, 24, 17, 50);
    let sink = RecordingSink::denying_exact();

    let outcome = schedule(
        &Booking::new("Interstellar", "", "2025-12-24 18:00"),
        &clock,
        &sink,
    );

    assert_eq!(outcome, SchedulingOutcome::Skipped(SkipReason::AlreadyPast));
    assert!(sink.calls().is_empty());
}

#[test]
fn test_garbage_time_is_skipped_without_calls() {
    let clock = clock_at(2025, 12, 24, 12, 0);
    for raw in ["not-a-date", "", "2025/12/24 18:00", "18:00", "2025-12-24"] {
        let sink = RecordingSink::new();
        let outcome = schedule(&Booking::new("John Wick", "Row 1, seat 1", raw), &clock, &sink);
        assert_eq!(
            outcome,
            SchedulingOutcome::Skipped(SkipReason::UnparseableTime),
            "input {:?}",
            raw
        );
        assert!(sink.calls().is_empty(), "input {:?}", raw);
    }
}

#[test]
fn test_both_layouts_resolve_to_same_reminder() {
    let clock = clock_at(2025, 12, 1, 12, 0);
    let iso_sink = RecordingSink::new();
    let dotted_sink = RecordingSink::new();

    let iso = schedule(
        &Booking::new("Oppenheimer", "Row 1, seat 1", "2025-12-24 18:00"),
        &clock,
        &iso_sink,
    );
    let dotted = schedule(
        &Booking::new("Oppenheimer", "Row 1, seat 1", "24.12.2025 18:00"),
        &clock,
        &dotted_sink,
    );

    assert_eq!(iso.reminder(), dotted.reminder());
    assert_eq!(iso_sink.calls(), dotted_sink.calls());
}

#[test]
fn test_rescheduling_same_booking_reuses_id() {
    let clock = clock_at(2025, 12, 24, 12, 0);
    let sink = RecordingSink::new();
    let booking = Booking::new("Oppenheimer", "Row 1, seat 1", "2025-12-24 18:00");

    let first = schedule(&booking, &clock, &sink);
    clock.advance(Duration::minutes(5));
    let second = schedule(&booking, &clock, &sink);

    assert_eq!(
        first.reminder().map(|r| r.id),
        second.reminder().map(|r| r.id)
    );
    let ids: Vec<_> = sink
        .calls()
        .into_iter()
        .map(|c| match c {
            SinkCall::Exact { id, .. } => id,
            SinkCall::Deferred { .. } => panic!("unexpected deferred call"),
        })
        .collect();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], ids[1]);
}

#[test]
fn test_different_films_at_same_time_get_different_ids() {
    let clock = clock_at(2025, 12, 24, 12, 0);
    let sink = RecordingSink::new();

    let a = schedule(&Booking::new("Oppenheimer", "", "2025-12-24 18:00"), &clock, &sink);
    let b = schedule(&Booking::new("Interstellar", "", "2025-12-24 18:00"), &clock, &sink);

    assert_ne!(a.reminder().unwrap().id, b.reminder().unwrap().id);
}
