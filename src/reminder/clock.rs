// File: ./src/reminder/clock.rs
use chrono::{
    DateTime, Duration, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, Offset,
    TimeZone, Utc,
};
use std::sync::Mutex;

/// How far back to look for the offset in force before a DST gap.
const GAP_PROBE_STEP_MINUTES: i64 = 15;
const GAP_PROBE_STEPS: i64 = 24 * 60 / GAP_PROBE_STEP_MINUTES;

/// Source of "now" and of the wall-clock zone ticket times are written in.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Maps a wall-clock time to an absolute instant.
    ///
    /// In a DST overlap the earlier instant wins. A time inside a DST gap is
    /// read with the offset in force before the gap, which moves it forward
    /// by the length of the gap (02:30 on a spring-forward night becomes
    /// 03:30). `None` only if no usable offset is found.
    fn resolve_local(&self, local: NaiveDateTime) -> Option<DateTime<Utc>>;

    /// Today's date on the wall clock.
    fn today(&self) -> NaiveDate;
}

/// Resolves `local` given a lookup of the offsets valid for a wall time.
fn resolve_with<F>(local: NaiveDateTime, offsets_at: F) -> Option<DateTime<Utc>>
where
    F: Fn(&NaiveDateTime) -> LocalResult<FixedOffset>,
{
    let offset = match offsets_at(&local) {
        LocalResult::Single(offset) => offset,
        LocalResult::Ambiguous(earlier, _) => earlier,
        LocalResult::None => (1..=GAP_PROBE_STEPS).find_map(|i| {
            let probe = local.checked_sub_signed(Duration::minutes(GAP_PROBE_STEP_MINUTES * i))?;
            offsets_at(&probe).earliest()
        })?,
    };
    let utc = local.checked_sub_signed(Duration::seconds(offset.local_minus_utc() as i64))?;
    Some(utc.and_utc())
}

/// The device clock in the system time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn resolve_local(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        resolve_with(local, |n| {
            Local.offset_from_local_datetime(n).map(|o| o.fix())
        })
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A single change of UTC offset, as wall clocks see it: at local time
/// `starts` (read with `before`) the offset becomes `after`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetChange {
    pub starts: NaiveDateTime,
    pub before: FixedOffset,
    pub after: FixedOffset,
}

impl OffsetChange {
    fn offsets_at(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
        let jump = Duration::seconds(
            (self.after.local_minus_utc() - self.before.local_minus_utc()) as i64,
        );
        let old_valid = *local < self.starts;
        let new_valid = *local >= self.starts + jump;
        match (old_valid, new_valid) {
            (true, true) => LocalResult::Ambiguous(self.before, self.after),
            (true, false) => LocalResult::Single(self.before),
            (false, true) => LocalResult::Single(self.after),
            (false, false) => LocalResult::None,
        }
    }

    /// The offset in force at instant `at`.
    fn offset_at_instant(&self, at: DateTime<Utc>) -> FixedOffset {
        let switch = self.starts - Duration::seconds(self.before.local_minus_utc() as i64);
        if at.naive_utc() < switch {
            self.before
        } else {
            self.after
        }
    }
}

/// A settable clock in a fixed offset, optionally with one offset change.
/// Tests move it forward by hand.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
    offset: FixedOffset,
    change: Option<OffsetChange>,
}

impl FixedClock {
    /// A clock frozen at `now`, interpreting local times as UTC.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_offset(now, Utc.fix())
    }

    pub fn with_offset(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            now: Mutex::new(now),
            offset,
            change: None,
        }
    }

    /// A clock whose zone switches offsets once, like a DST transition.
    pub fn with_offset_change(now: DateTime<Utc>, change: OffsetChange) -> Self {
        Self {
            now: Mutex::new(now),
            offset: change.before,
            change: Some(change),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|g| *g).unwrap_or_else(|p| *p.into_inner())
    }

    fn resolve_local(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        match &self.change {
            Some(change) => resolve_with(local, |n| change.offsets_at(n)),
            None => resolve_with(local, |_| LocalResult::Single(self.offset)),
        }
    }

    fn today(&self) -> NaiveDate {
        let now = self.now();
        let offset = match &self.change {
            Some(change) => change.offset_at_instant(now),
            None => self.offset,
        };
        now.with_timezone(&offset).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn cet(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    /// Central European spring-forward: 02:00 CET becomes 03:00 CEST.
    fn spring_forward() -> OffsetChange {
        OffsetChange {
            starts: local(2027, 3, 28, 2, 0),
            before: cet(1),
            after: cet(2),
        }
    }

    /// Central European fall-back: 03:00 CEST becomes 02:00 CET.
    fn fall_back() -> OffsetChange {
        OffsetChange {
            starts: local(2027, 10, 31, 3, 0),
            before: cet(2),
            after: cet(1),
        }
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_fixed_offset_resolution() {
        let clock = FixedClock::with_offset(utc(2025, 1, 1, 0, 0), cet(1));
        assert_eq!(
            clock.resolve_local(local(2025, 12, 24, 18, 0)),
            Some(utc(2025, 12, 24, 17, 0))
        );
    }

    #[test]
    fn test_gap_time_moves_forward_by_gap_length() {
        let clock = FixedClock::with_offset_change(utc(2027, 3, 1, 0, 0), spring_forward());
        // 02:30 does not exist; it is read as 03:30 CEST
        assert_eq!(
            clock.resolve_local(local(2027, 3, 28, 2, 30)),
            Some(utc(2027, 3, 28, 1, 30))
        );
        assert_eq!(
            clock.resolve_local(local(2027, 3, 28, 3, 30)),
            Some(utc(2027, 3, 28, 1, 30))
        );
        assert_eq!(
            clock.resolve_local(local(2027, 3, 28, 1, 59)),
            Some(utc(2027, 3, 28, 0, 59))
        );
    }

    #[test]
    fn test_overlap_takes_earlier_instant() {
        let clock = FixedClock::with_offset_change(utc(2027, 10, 1, 0, 0), fall_back());
        assert_eq!(
            clock.resolve_local(local(2027, 10, 31, 2, 30)),
            Some(utc(2027, 10, 31, 0, 30))
        );
        assert_eq!(
            clock.resolve_local(local(2027, 10, 31, 3, 30)),
            Some(utc(2027, 10, 31, 2, 30))
        );
    }

    #[test]
    fn test_today_follows_clock_offset() {
        // 23:30 UTC on the 27th is already the 28th in CET
        let clock = FixedClock::with_offset_change(utc(2027, 3, 27, 23, 30), spring_forward());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2027, 3, 28).unwrap());

        let clock = FixedClock::new(utc(2027, 3, 27, 23, 30));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2027, 3, 27).unwrap());
    }

    #[test]
    fn test_advance_and_set() {
        let clock = FixedClock::new(utc(2025, 12, 24, 12, 0));
        clock.advance(Duration::minutes(5));
        assert_eq!(clock.now(), utc(2025, 12, 24, 12, 5));
        clock.set(utc(2026, 1, 1, 0, 0));
        assert_eq!(clock.now(), utc(2026, 1, 1, 0, 0));
    }
}
