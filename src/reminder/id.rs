// File: ./src/reminder/id.rs
// Reminder identifiers address a slot in the sink's scheduling table.
// The same (event time, title) pair must always map to the same slot so
// that booking the same showing twice overwrites the pending reminder.
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderId(i32);

impl ReminderId {
    pub fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Polynomial (x31) hash over the Unicode scalar values of `s`.
pub fn title_hash(s: &str) -> i32 {
    s.chars()
        .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(c as i32))
}

/// Derives a non-negative 32-bit reminder identifier.
pub fn derive_id(event_epoch_millis: i64, subject_title: &str) -> ReminderId {
    let base = (event_epoch_millis % i64::from(i32::MAX)) as i32;
    let mixed = base ^ title_hash(subject_title);
    // unsigned_abs(i32::MIN) is 2^31, which masks down to 0
    ReminderId((mixed.unsigned_abs() & i32::MAX as u32) as i32)
}
